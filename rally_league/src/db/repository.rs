//! Store traits for the engine's external collaborators.
//!
//! Each trait covers one collaborator so callers can mix backends, e.g. a
//! PostgreSQL match store with an HTTP-backed participant directory.

use async_trait::async_trait;
use std::sync::Arc;

use super::errors::StoreResult;
use crate::scheduling::models::AvailabilitySlot;
use crate::tournament::models::{
    Match, MatchId, Participant, ParticipantId, PoolEntry, Tournament, TournamentId,
    TournamentStatus,
};

/// Read-only participant directory
#[async_trait]
pub trait ParticipantDirectory: Send + Sync {
    /// Find participant by ID
    async fn find_participant(&self, id: ParticipantId) -> StoreResult<Option<Participant>>;
}

/// Recurring weekly availability per participant
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// All slots declared by a participant
    async fn slots_for(&self, participant_id: ParticipantId) -> StoreResult<Vec<AvailabilitySlot>>;

    /// Replace a participant's slots wholesale
    async fn replace_slots(
        &self,
        participant_id: ParticipantId,
        slots: &[AvailabilitySlot],
    ) -> StoreResult<()>;
}

/// Match records
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Insert or overwrite a match keyed by its ID
    async fn upsert_match(&self, m: &Match) -> StoreResult<()>;

    /// Find match by ID
    async fn find_match(&self, id: MatchId) -> StoreResult<Option<Match>>;

    /// Every match belonging to a tournament
    async fn matches_for_tournament(&self, tournament_id: TournamentId) -> StoreResult<Vec<Match>>;

    /// Every match a participant plays in
    async fn matches_for_participant(
        &self,
        participant_id: ParticipantId,
    ) -> StoreResult<Vec<Match>>;
}

/// Tournament records
#[async_trait]
pub trait TournamentStore: Send + Sync {
    /// Insert or overwrite a tournament keyed by its ID
    async fn upsert_tournament(&self, tournament: &Tournament) -> StoreResult<()>;

    /// Find tournament by ID
    async fn find_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>>;

    /// Tournaments in a lifecycle state
    async fn tournaments_by_status(&self, status: TournamentStatus)
    -> StoreResult<Vec<Tournament>>;

    /// Tournament for a region, skill band and month
    async fn find_by_division(
        &self,
        region: &str,
        skill_band: &str,
        month: &str,
    ) -> StoreResult<Option<Tournament>>;
}

/// Candidate pool of participants waiting for a tournament
#[async_trait]
pub trait PoolStore: Send + Sync {
    /// Add or refresh a participant's pool entry
    async fn add_entry(&self, entry: &PoolEntry) -> StoreResult<()>;

    /// Entries for a region and skill band, oldest first
    async fn entries_for(&self, region: &str, skill_band: &str) -> StoreResult<Vec<PoolEntry>>;

    /// Remove a participant's pool entry
    async fn remove_entry(&self, participant_id: ParticipantId) -> StoreResult<()>;
}

/// Handles to every store the engine needs
#[derive(Clone)]
pub struct Stores {
    pub participants: Arc<dyn ParticipantDirectory>,
    pub availability: Arc<dyn AvailabilityStore>,
    pub matches: Arc<dyn MatchStore>,
    pub tournaments: Arc<dyn TournamentStore>,
    pub pool: Arc<dyn PoolStore>,
}

impl Stores {
    /// Use one backend for every collaborator
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: ParticipantDirectory
            + AvailabilityStore
            + MatchStore
            + TournamentStore
            + PoolStore
            + 'static,
    {
        Self {
            participants: store.clone(),
            availability: store.clone(),
            matches: store.clone(),
            tournaments: store.clone(),
            pool: store,
        }
    }
}
