//! Availability matching between two participants.
//!
//! Recurring weekly slots are matched over a rolling horizon in three tiers:
//!
//! 1. **Overlap**: both participants are free for at least 75 minutes
//! 2. **Near miss**: windows overlap briefly or are separated by a short gap
//! 3. **Manual**: participants propose and accept times themselves
//!
//! ## Example
//!
//! ```
//! use chrono::{NaiveDate, NaiveTime};
//! use rally_league::scheduling::{AvailabilityScheduler, AvailabilitySlot, SchedulingTier};
//! use uuid::Uuid;
//!
//! let evening = |pid| {
//!     AvailabilitySlot::new(
//!         pid,
//!         2,
//!         NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
//!         NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
//!     )
//! };
//! let now = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap().and_hms_opt(9, 0, 0).unwrap();
//!
//! let scheduler = AvailabilityScheduler::default();
//! let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
//! let verdict = scheduler.evaluate(&[evening(a)], &[evening(b)], now);
//! assert_eq!(verdict.tier(), SchedulingTier::Overlap);
//! ```

pub mod models;
pub mod near_miss;
pub mod overlap;
pub mod ranking;
pub mod scheduler;

pub use models::{
    AvailabilitySlot, DEFAULT_HORIZON_DAYS, MAX_FLEX_MINUTES, MAX_GAP_MINUTES,
    MIN_MATCH_MINUTES, NearMiss, NearMissKind, SchedulingTier, SlotCandidate, TimeWindow,
};
pub use near_miss::find_near_misses;
pub use overlap::find_overlaps;
pub use ranking::{
    ChronologicalRanker, HttpSlotRanker, ParticipantSummary, RankedSlot, RankingContext,
    RankingError, RankingResult, SlotRanker, rank_with_fallback,
};
pub use scheduler::{AvailabilityScheduler, SchedulingVerdict};
