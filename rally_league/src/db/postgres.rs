//! PostgreSQL store.
//!
//! Participants, slots and pool entries are plain rows. Matches and
//! tournaments are stored as JSONB documents next to the columns they are
//! queried by.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::types::Json;
use sqlx::Row;

use super::errors::{StoreError, StoreResult};
use super::repository::{
    AvailabilityStore, MatchStore, ParticipantDirectory, PoolStore, TournamentStore,
};
use super::timeouts::{with_default_timeout, with_long_timeout};
use crate::scheduling::models::AvailabilitySlot;
use crate::tournament::models::{
    Match, MatchId, Participant, ParticipantId, PoolEntry, Tournament, TournamentId,
    TournamentStatus,
};

const SCHEMA: &str = include_str!("../../migrations/0001_league.sql");

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create any missing tables and indexes
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        with_long_timeout(sqlx::raw_sql(SCHEMA).execute(&self.pool)).await?;
        Ok(())
    }
}

fn participant_from_row(row: &PgRow) -> StoreResult<Participant> {
    Ok(Participant {
        id: row.try_get("id")?,
        display_name: row.try_get("display_name")?,
        skill_band: row.try_get("skill_band")?,
        region: row.try_get("region")?,
    })
}

fn slot_from_row(row: &PgRow) -> StoreResult<AvailabilitySlot> {
    let day: i16 = row.try_get("day_of_week")?;
    let day_of_week = u8::try_from(day)
        .ok()
        .filter(|d| *d < 7)
        .ok_or_else(|| StoreError::Corrupt(format!("day of week {day}")))?;

    Ok(AvailabilitySlot::new(
        row.try_get("participant_id")?,
        day_of_week,
        row.try_get("start_time")?,
        row.try_get("end_time")?,
    ))
}

fn pool_entry_from_row(row: &PgRow) -> StoreResult<PoolEntry> {
    Ok(PoolEntry {
        participant_id: row.try_get("participant_id")?,
        region: row.try_get("region")?,
        skill_band: row.try_get("skill_band")?,
        joined_at: row.try_get("joined_at")?,
    })
}

fn match_from_row(row: &PgRow) -> StoreResult<Match> {
    let Json(m): Json<Match> = row.try_get("data")?;
    Ok(m)
}

fn tournament_from_row(row: &PgRow) -> StoreResult<Tournament> {
    let Json(tournament): Json<Tournament> = row.try_get("data")?;
    Ok(tournament)
}

#[async_trait]
impl ParticipantDirectory for PgStore {
    async fn find_participant(&self, id: ParticipantId) -> StoreResult<Option<Participant>> {
        let row = with_default_timeout(
            sqlx::query(
                "SELECT id, display_name, skill_band, region FROM participants WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(participant_from_row).transpose()
    }
}

#[async_trait]
impl AvailabilityStore for PgStore {
    async fn slots_for(&self, participant_id: ParticipantId) -> StoreResult<Vec<AvailabilitySlot>> {
        let rows = with_default_timeout(
            sqlx::query(
                "SELECT participant_id, day_of_week, start_time, end_time
                 FROM availability_slots
                 WHERE participant_id = $1
                 ORDER BY day_of_week, start_time",
            )
            .bind(participant_id)
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(slot_from_row).collect()
    }

    async fn replace_slots(
        &self,
        participant_id: ParticipantId,
        slots: &[AvailabilitySlot],
    ) -> StoreResult<()> {
        let mut tx = with_default_timeout(self.pool.begin()).await?;

        with_default_timeout(
            sqlx::query("DELETE FROM availability_slots WHERE participant_id = $1")
                .bind(participant_id)
                .execute(&mut *tx),
        )
        .await?;

        for slot in slots {
            with_default_timeout(
                sqlx::query(
                    "INSERT INTO availability_slots
                         (participant_id, day_of_week, start_time, end_time)
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(participant_id)
                .bind(i16::from(slot.day_of_week))
                .bind(slot.start)
                .bind(slot.end)
                .execute(&mut *tx),
            )
            .await?;
        }

        with_default_timeout(tx.commit()).await?;
        Ok(())
    }
}

#[async_trait]
impl MatchStore for PgStore {
    async fn upsert_match(&self, m: &Match) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query(
                "INSERT INTO matches (id, tournament_id, participant_a, participant_b, status, data)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (id) DO UPDATE SET
                     tournament_id = EXCLUDED.tournament_id,
                     participant_a = EXCLUDED.participant_a,
                     participant_b = EXCLUDED.participant_b,
                     status = EXCLUDED.status,
                     data = EXCLUDED.data,
                     updated_at = NOW()",
            )
            .bind(m.id)
            .bind(m.tournament_id)
            .bind(m.participant_a)
            .bind(m.participant_b)
            .bind(m.status.as_str())
            .bind(Json(m))
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn find_match(&self, id: MatchId) -> StoreResult<Option<Match>> {
        let row = with_default_timeout(
            sqlx::query("SELECT data FROM matches WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn matches_for_tournament(&self, tournament_id: TournamentId) -> StoreResult<Vec<Match>> {
        let rows = with_default_timeout(
            sqlx::query("SELECT data FROM matches WHERE tournament_id = $1 ORDER BY id")
                .bind(tournament_id)
                .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn matches_for_participant(
        &self,
        participant_id: ParticipantId,
    ) -> StoreResult<Vec<Match>> {
        let rows = with_default_timeout(
            sqlx::query(
                "SELECT data FROM matches
                 WHERE participant_a = $1 OR participant_b = $1
                 ORDER BY id",
            )
            .bind(participant_id)
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(match_from_row).collect()
    }
}

#[async_trait]
impl TournamentStore for PgStore {
    async fn upsert_tournament(&self, tournament: &Tournament) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query(
                "INSERT INTO tournaments (id, month, region, skill_band, status, data)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (id) DO UPDATE SET
                     month = EXCLUDED.month,
                     region = EXCLUDED.region,
                     skill_band = EXCLUDED.skill_band,
                     status = EXCLUDED.status,
                     data = EXCLUDED.data,
                     updated_at = NOW()",
            )
            .bind(tournament.id)
            .bind(&tournament.month)
            .bind(&tournament.region)
            .bind(&tournament.skill_band)
            .bind(tournament.status.as_str())
            .bind(Json(tournament))
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn find_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        let row = with_default_timeout(
            sqlx::query("SELECT data FROM tournaments WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn tournaments_by_status(
        &self,
        status: TournamentStatus,
    ) -> StoreResult<Vec<Tournament>> {
        let rows = with_default_timeout(
            sqlx::query("SELECT data FROM tournaments WHERE status = $1 ORDER BY month, id")
                .bind(status.as_str())
                .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(tournament_from_row).collect()
    }

    async fn find_by_division(
        &self,
        region: &str,
        skill_band: &str,
        month: &str,
    ) -> StoreResult<Option<Tournament>> {
        let row = with_default_timeout(
            sqlx::query(
                "SELECT data FROM tournaments
                 WHERE region = $1 AND skill_band = $2 AND month = $3
                 LIMIT 1",
            )
            .bind(region)
            .bind(skill_band)
            .bind(month)
            .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }
}

#[async_trait]
impl PoolStore for PgStore {
    async fn add_entry(&self, entry: &PoolEntry) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query(
                "INSERT INTO pool_entries (participant_id, region, skill_band, joined_at)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (participant_id) DO UPDATE SET
                     region = EXCLUDED.region,
                     skill_band = EXCLUDED.skill_band,
                     joined_at = EXCLUDED.joined_at",
            )
            .bind(entry.participant_id)
            .bind(&entry.region)
            .bind(&entry.skill_band)
            .bind(entry.joined_at)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn entries_for(&self, region: &str, skill_band: &str) -> StoreResult<Vec<PoolEntry>> {
        let rows = with_default_timeout(
            sqlx::query(
                "SELECT participant_id, region, skill_band, joined_at
                 FROM pool_entries
                 WHERE region = $1 AND skill_band = $2
                 ORDER BY joined_at, participant_id",
            )
            .bind(region)
            .bind(skill_band)
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(pool_entry_from_row).collect()
    }

    async fn remove_entry(&self, participant_id: ParticipantId) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query("DELETE FROM pool_entries WHERE participant_id = $1")
                .bind(participant_id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}
