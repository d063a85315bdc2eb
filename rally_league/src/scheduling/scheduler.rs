//! Three-tier scheduling verdicts and their write-back onto matches.

use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Duration;

use super::models::{
    AvailabilitySlot, DEFAULT_HORIZON_DAYS, NearMiss, SchedulingTier, SlotCandidate,
};
use super::near_miss::find_near_misses;
use super::overlap::find_overlaps;
use super::ranking::{
    ChronologicalRanker, DEFAULT_RANKING_TIMEOUT, PICK_COUNT, RankingContext, SlotRanker,
    rank_with_fallback,
};
use crate::tournament::models::{Match, MatchStatus, TimeProposal};

/// Outcome of matching two availability calendars
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulingVerdict {
    /// Shared windows of at least a full match, chronological
    Overlap { candidates: Vec<SlotCandidate> },
    /// No shared window, but windows that nearly meet, least flex first
    NearMiss { near_misses: Vec<NearMiss> },
    /// Nothing usable; participants propose times themselves
    Manual,
}

impl SchedulingVerdict {
    pub fn tier(&self) -> SchedulingTier {
        match self {
            SchedulingVerdict::Overlap { .. } => SchedulingTier::Overlap,
            SchedulingVerdict::NearMiss { .. } => SchedulingTier::NearMiss,
            SchedulingVerdict::Manual => SchedulingTier::Manual,
        }
    }
}

/// Availability scheduler
///
/// Evaluation is pure; the ranker is only consulted for ad-hoc matches.
#[derive(Clone)]
pub struct AvailabilityScheduler {
    horizon_days: u32,
    ranker: Arc<dyn SlotRanker>,
    ranking_timeout: Duration,
}

impl Default for AvailabilityScheduler {
    fn default() -> Self {
        Self::new(
            DEFAULT_HORIZON_DAYS,
            Arc::new(ChronologicalRanker),
            DEFAULT_RANKING_TIMEOUT,
        )
    }
}

impl AvailabilityScheduler {
    pub fn new(horizon_days: u32, ranker: Arc<dyn SlotRanker>, ranking_timeout: Duration) -> Self {
        Self {
            horizon_days,
            ranker,
            ranking_timeout,
        }
    }

    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    /// Pick the highest tier the two calendars support
    pub fn evaluate(
        &self,
        slots_a: &[AvailabilitySlot],
        slots_b: &[AvailabilitySlot],
        now: NaiveDateTime,
    ) -> SchedulingVerdict {
        let candidates = find_overlaps(slots_a, slots_b, now, self.horizon_days);
        if !candidates.is_empty() {
            return SchedulingVerdict::Overlap { candidates };
        }

        let near_misses = find_near_misses(slots_a, slots_b, now, self.horizon_days);
        if !near_misses.is_empty() {
            return SchedulingVerdict::NearMiss { near_misses };
        }

        SchedulingVerdict::Manual
    }

    /// Write a tournament match's verdict back onto it
    ///
    /// Tier 1 books the earliest candidate and keeps the next ones as
    /// alternatives; tier 2 offers the best flexed window; tier 3 leaves the
    /// match pending with no proposals.
    pub fn apply_tournament_verdict(m: &mut Match, verdict: &SchedulingVerdict) -> SchedulingTier {
        reset_schedule(m);

        match verdict {
            SchedulingVerdict::Overlap { candidates } => {
                let mut proposals: Vec<TimeProposal> = candidates
                    .iter()
                    .take(PICK_COUNT)
                    .map(|c| TimeProposal::system(c.starts_at(), c.label()))
                    .collect();
                if let Some(chosen) = proposals.first_mut() {
                    chosen.accepted_by.insert(m.participant_a);
                    chosen.accepted_by.insert(m.participant_b);
                    m.scheduled_at = Some(chosen.datetime);
                }
                m.proposals = proposals;
                m.advance(MatchStatus::Scheduled);
            }
            SchedulingVerdict::NearMiss { near_misses } => {
                if let Some(best) = near_misses.first() {
                    m.proposals = vec![near_miss_proposal(best)];
                    m.near_miss = Some(best.clone());
                }
                m.advance(MatchStatus::Scheduling);
            }
            SchedulingVerdict::Manual => {
                m.advance(MatchStatus::Pending);
            }
        }

        let tier = verdict.tier();
        m.scheduling_tier = Some(tier);
        tier
    }

    /// Schedule an ad-hoc match, ranking tier-1 candidates through the ranker
    ///
    /// Tier-1 picks become proposals awaiting both participants' acceptance.
    /// Ranking failures fall back to chronological order and never surface.
    pub async fn schedule_adhoc(
        &self,
        m: &mut Match,
        context: &RankingContext,
        slots_a: &[AvailabilitySlot],
        slots_b: &[AvailabilitySlot],
        now: NaiveDateTime,
    ) -> SchedulingTier {
        let verdict = self.evaluate(slots_a, slots_b, now);
        let SchedulingVerdict::Overlap { candidates } = &verdict else {
            return Self::apply_tournament_verdict(m, &verdict);
        };

        let picks = rank_with_fallback(
            self.ranker.as_ref(),
            self.ranking_timeout,
            context,
            candidates,
        )
        .await;

        reset_schedule(m);
        m.proposals = picks
            .into_iter()
            .map(|pick| TimeProposal::system(pick.datetime, pick.label))
            .collect();
        m.advance(MatchStatus::Scheduling);
        m.scheduling_tier = Some(SchedulingTier::Overlap);
        SchedulingTier::Overlap
    }
}

fn reset_schedule(m: &mut Match) {
    m.proposals.clear();
    m.scheduled_at = None;
    m.near_miss = None;
}

fn near_miss_proposal(near_miss: &NearMiss) -> TimeProposal {
    let flexed = SlotCandidate {
        date: near_miss.date,
        start: near_miss.flexed_window.start,
        end: near_miss.flexed_window.end,
    };
    TimeProposal::system(flexed.starts_at(), flexed.label())
}
