//! In-process store.
//!
//! Keeps every collaborator's data in `tokio::sync::RwLock`ed maps. Used by
//! the test suites and by callers that embed the engine without a database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::errors::StoreResult;
use super::repository::{
    AvailabilityStore, MatchStore, ParticipantDirectory, PoolStore, TournamentStore,
};
use crate::scheduling::models::AvailabilitySlot;
use crate::tournament::models::{
    Match, MatchId, Participant, ParticipantId, PoolEntry, Tournament, TournamentId,
    TournamentStatus,
};

/// Store holding everything in memory
#[derive(Default)]
pub struct MemoryStore {
    participants: RwLock<HashMap<ParticipantId, Participant>>,
    slots: RwLock<HashMap<ParticipantId, Vec<AvailabilitySlot>>>,
    matches: RwLock<HashMap<MatchId, Match>>,
    tournaments: RwLock<HashMap<TournamentId, Tournament>>,
    pool: RwLock<HashMap<ParticipantId, PoolEntry>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a participant in the directory
    pub async fn insert_participant(&self, participant: Participant) {
        self.record_write();
        self.participants
            .write()
            .await
            .insert(participant.id, participant);
    }

    /// Number of write operations performed so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ParticipantDirectory for MemoryStore {
    async fn find_participant(&self, id: ParticipantId) -> StoreResult<Option<Participant>> {
        Ok(self.participants.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl AvailabilityStore for MemoryStore {
    async fn slots_for(&self, participant_id: ParticipantId) -> StoreResult<Vec<AvailabilitySlot>> {
        Ok(self
            .slots
            .read()
            .await
            .get(&participant_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_slots(
        &self,
        participant_id: ParticipantId,
        slots: &[AvailabilitySlot],
    ) -> StoreResult<()> {
        self.record_write();
        self.slots
            .write()
            .await
            .insert(participant_id, slots.to_vec());
        Ok(())
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn upsert_match(&self, m: &Match) -> StoreResult<()> {
        self.record_write();
        self.matches.write().await.insert(m.id, m.clone());
        Ok(())
    }

    async fn find_match(&self, id: MatchId) -> StoreResult<Option<Match>> {
        Ok(self.matches.read().await.get(&id).cloned())
    }

    async fn matches_for_tournament(&self, tournament_id: TournamentId) -> StoreResult<Vec<Match>> {
        let mut found: Vec<Match> = self
            .matches
            .read()
            .await
            .values()
            .filter(|m| m.tournament_id == Some(tournament_id))
            .cloned()
            .collect();
        found.sort_by_key(|m| m.id);
        Ok(found)
    }

    async fn matches_for_participant(
        &self,
        participant_id: ParticipantId,
    ) -> StoreResult<Vec<Match>> {
        let mut found: Vec<Match> = self
            .matches
            .read()
            .await
            .values()
            .filter(|m| m.involves(participant_id))
            .cloned()
            .collect();
        found.sort_by_key(|m| m.id);
        Ok(found)
    }
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn upsert_tournament(&self, tournament: &Tournament) -> StoreResult<()> {
        self.record_write();
        self.tournaments
            .write()
            .await
            .insert(tournament.id, tournament.clone());
        Ok(())
    }

    async fn find_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        Ok(self.tournaments.read().await.get(&id).cloned())
    }

    async fn tournaments_by_status(
        &self,
        status: TournamentStatus,
    ) -> StoreResult<Vec<Tournament>> {
        let mut found: Vec<Tournament> = self
            .tournaments
            .read()
            .await
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.month.cmp(&b.month).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn find_by_division(
        &self,
        region: &str,
        skill_band: &str,
        month: &str,
    ) -> StoreResult<Option<Tournament>> {
        Ok(self
            .tournaments
            .read()
            .await
            .values()
            .find(|t| t.region == region && t.skill_band == skill_band && t.month == month)
            .cloned())
    }
}

#[async_trait]
impl PoolStore for MemoryStore {
    async fn add_entry(&self, entry: &PoolEntry) -> StoreResult<()> {
        self.record_write();
        self.pool
            .write()
            .await
            .insert(entry.participant_id, entry.clone());
        Ok(())
    }

    async fn entries_for(&self, region: &str, skill_band: &str) -> StoreResult<Vec<PoolEntry>> {
        let mut found: Vec<PoolEntry> = self
            .pool
            .read()
            .await
            .values()
            .filter(|e| e.region == region && e.skill_band == skill_band)
            .cloned()
            .collect();
        found.sort_by_key(|e| (e.joined_at, e.participant_id));
        Ok(found)
    }

    async fn remove_entry(&self, participant_id: ParticipantId) -> StoreResult<()> {
        self.record_write();
        self.pool.write().await.remove(&participant_id);
        Ok(())
    }
}
