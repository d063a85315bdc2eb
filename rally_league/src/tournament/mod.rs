//! Monthly round-robin tournaments.
//!
//! This module provides:
//! - Round-robin pairing generation (circle method)
//! - Standings computed from completed matches
//! - The lifecycle engine: registration, active play, finals, completion
//! - Result reporting with opponent confirmation and dispute auto-resolution
//!
//! ## Example
//!
//! ```no_run
//! use rally_league::db::{MemoryStore, Stores};
//! use rally_league::tournament::{EngineConfig, TournamentEngine};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     let engine = Arc::new(TournamentEngine::new(
//!         Stores::shared(store),
//!         EngineConfig::default(),
//!     ));
//!
//!     let tournament = engine.open_tournament("2026-11", "Cork", "B", 4, 8).await?;
//!     println!("Registration open: {}", tournament.id);
//!
//!     engine.start().await;
//!     // ...
//!     if let Some(handle) = engine.stop().await {
//!         handle.await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod errors;
pub mod models;
pub mod pairing;
pub mod standings;

pub use config::{EngineConfig, InvalidSetting};
pub use engine::{ResultOutcome, TickReport, TournamentEngine};
pub use errors::{TournamentError, TournamentResult};
pub use models::{
    Confirmation, FinalsMatchIds, HeadToHead, Match, MatchId, MatchKind, MatchResult,
    MatchStatus, Pairing, Participant, ParticipantId, PoolEntry, ProposalId, ResultReport,
    Round, SchedulingResult, SetScore, StandingEntry, TimeProposal, Tournament, TournamentId,
    TournamentStatus,
};
pub use pairing::{Seat, generate_rounds, round_robin_indices};
pub use standings::{calculate_standings, compare_entries, rank_standings, ranked_standings};
