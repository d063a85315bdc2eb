//! # Rally League
//!
//! Recurring round-robin tournaments for paired participants, scheduled from
//! each participant's declared weekly availability.
//!
//! ## Architecture
//!
//! A tournament moves through four states:
//!
//! - **Registration**: participants join directly or are admitted from the
//!   candidate pool for their region and skill band
//! - **Active**: the roster is frozen, the round robin generated and every
//!   match scheduled from availability
//! - **Finals**: championship (1st v 2nd) and third-place (3rd v 4th) matches
//! - **Completed**: final standings recorded
//!
//! Match times are found in three tiers: overlapping availability is booked
//! automatically, near misses get a suggested adjustment, and everything else
//! is left for participants to propose and accept.
//!
//! ## Core Modules
//!
//! - [`tournament`]: models, pairing, standings and the lifecycle engine
//! - [`scheduling`]: availability matching and slot ranking
//! - [`db`]: store traits with PostgreSQL and in-memory implementations
//!
//! ## Example
//!
//! ```
//! use rally_league::tournament::generate_rounds;
//! use uuid::Uuid;
//!
//! let roster: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();
//! let rounds = generate_rounds(&roster);
//! assert_eq!(rounds.len(), 7);
//! ```

/// Persistence layer.
pub mod db;

/// Availability matching.
pub mod scheduling;
pub use scheduling::{AvailabilityScheduler, AvailabilitySlot, SchedulingTier, SlotRanker};

/// Tournaments and the lifecycle engine.
pub mod tournament;
pub use tournament::{
    EngineConfig, Match, MatchStatus, TickReport, Tournament, TournamentEngine, TournamentError,
    TournamentStatus,
};
