//! Tournament, match, and standings data models.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use uuid::Uuid;

use crate::scheduling::models::{NearMiss, SchedulingTier};

/// Participant ID type
pub type ParticipantId = Uuid;

/// Match ID type
pub type MatchId = Uuid;

/// Tournament ID type
pub type TournamentId = Uuid;

/// Time proposal ID type
pub type ProposalId = Uuid;

/// Participant as exposed by the external directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
    pub skill_band: String,
    pub region: String,
}

/// Tournament lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    /// Accepting participants
    Registration,
    /// Round robin in progress
    Active,
    /// Championship and third-place matches in progress
    Finals,
    /// All matches played
    Completed,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::Registration => "registration",
            TournamentStatus::Active => "active",
            TournamentStatus::Finals => "finals",
            TournamentStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "registration" => Some(TournamentStatus::Registration),
            "active" => Some(TournamentStatus::Active),
            "finals" => Some(TournamentStatus::Finals),
            "completed" => Some(TournamentStatus::Completed),
            _ => None,
        }
    }
}

/// Match state
///
/// Moves forward only, except that `Scheduling` may fall back to `Pending`
/// when a scheduling attempt is abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Scheduling,
    Scheduled,
    Completed,
    Cancelled,
}

impl MatchStatus {
    fn rank(&self) -> u8 {
        match self {
            MatchStatus::Pending => 0,
            MatchStatus::Scheduling => 1,
            MatchStatus::Scheduled => 2,
            MatchStatus::Completed => 3,
            MatchStatus::Cancelled => 3,
        }
    }

    /// Whether the match lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: MatchStatus) -> bool {
        match (self, next) {
            (MatchStatus::Completed | MatchStatus::Cancelled, _) => false,
            (_, MatchStatus::Cancelled) => true,
            (MatchStatus::Scheduling, MatchStatus::Pending) => true,
            (current, next) => next.rank() >= current.rank(),
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, MatchStatus::Completed | MatchStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Scheduling => "scheduling",
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Completed => "completed",
            MatchStatus::Cancelled => "cancelled",
        }
    }
}

/// What a match is played for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchKind {
    RoundRobin,
    Championship,
    ThirdPlace,
    AdHoc,
}

/// Games won by each side in one set, oriented to the match's participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetScore {
    pub a_games: u8,
    pub b_games: u8,
}

impl SetScore {
    pub fn new(a_games: u8, b_games: u8) -> Self {
        Self { a_games, b_games }
    }
}

/// How a result became final
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confirmation {
    /// The opponent reported the same outcome
    Opponent,
    /// The dispute grace period elapsed without a conflicting confirmation
    Auto,
}

/// Confirmed outcome of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub winner_id: ParticipantId,
    pub sets: Vec<SetScore>,
    pub confirmed_by: Confirmation,
    pub confirmed_at: DateTime<Utc>,
}

/// Self-reported outcome awaiting confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultReport {
    pub winner_id: ParticipantId,
    pub sets: Vec<SetScore>,
    pub reporter_id: ParticipantId,
    pub reported_at: DateTime<Utc>,
}

impl ResultReport {
    /// Whether another report claims the same winner and score
    pub fn agrees_with(&self, other: &ResultReport) -> bool {
        self.winner_id == other.winner_id && self.sets == other.sets
    }

    /// Whether the report has waited longer than `grace`
    pub fn is_stale(&self, now: DateTime<Utc>, grace: Duration) -> bool {
        now - self.reported_at > grace
    }

    pub fn confirm(&self, confirmed_by: Confirmation, confirmed_at: DateTime<Utc>) -> MatchResult {
        MatchResult {
            winner_id: self.winner_id,
            sets: self.sets.clone(),
            confirmed_by,
            confirmed_at,
        }
    }
}

/// A concrete time offered to both participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeProposal {
    pub id: ProposalId,
    pub datetime: NaiveDateTime,
    pub label: String,
    pub proposed_by: Option<ParticipantId>,
    pub accepted_by: BTreeSet<ParticipantId>,
}

impl TimeProposal {
    /// Proposal generated by the scheduler
    pub fn system(datetime: NaiveDateTime, label: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            datetime,
            label,
            proposed_by: None,
            accepted_by: BTreeSet::new(),
        }
    }

    /// Proposal made by a participant, who implicitly accepts it
    pub fn by_participant(
        participant_id: ParticipantId,
        datetime: NaiveDateTime,
        label: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            datetime,
            label,
            proposed_by: Some(participant_id),
            accepted_by: BTreeSet::from([participant_id]),
        }
    }
}

/// A match between two participants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: Option<TournamentId>,
    pub kind: MatchKind,
    pub participant_a: ParticipantId,
    pub participant_b: ParticipantId,
    pub status: MatchStatus,
    pub proposals: Vec<TimeProposal>,
    pub scheduled_at: Option<NaiveDateTime>,
    pub scheduling_tier: Option<SchedulingTier>,
    pub near_miss: Option<NearMiss>,
    pub result: Option<MatchResult>,
    pub created_at: DateTime<Utc>,
}

impl Match {
    fn new(
        id: MatchId,
        tournament_id: Option<TournamentId>,
        kind: MatchKind,
        participant_a: ParticipantId,
        participant_b: ParticipantId,
    ) -> Self {
        Self {
            id,
            tournament_id,
            kind,
            participant_a,
            participant_b,
            status: MatchStatus::Pending,
            proposals: Vec::new(),
            scheduled_at: None,
            scheduling_tier: None,
            near_miss: None,
            result: None,
            created_at: Utc::now(),
        }
    }

    /// Derive a stable match id from the tournament and an unordered pair
    ///
    /// Re-running activation after a partial failure produces the same ids,
    /// so the match store's upsert never duplicates a pairing.
    pub fn derived_id(
        tournament_id: TournamentId,
        kind: MatchKind,
        a: ParticipantId,
        b: ParticipantId,
    ) -> MatchId {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let name = format!("{kind:?}:{low}:{high}");
        Uuid::new_v5(&tournament_id, name.as_bytes())
    }

    pub fn round_robin(
        tournament_id: TournamentId,
        home: ParticipantId,
        away: ParticipantId,
    ) -> Self {
        let id = Self::derived_id(tournament_id, MatchKind::RoundRobin, home, away);
        Self::new(id, Some(tournament_id), MatchKind::RoundRobin, home, away)
    }

    pub fn finals(
        tournament_id: TournamentId,
        kind: MatchKind,
        a: ParticipantId,
        b: ParticipantId,
    ) -> Self {
        let id = Self::derived_id(tournament_id, kind, a, b);
        Self::new(id, Some(tournament_id), kind, a, b)
    }

    /// Friendly match outside any tournament
    pub fn adhoc(a: ParticipantId, b: ParticipantId) -> Self {
        Self::new(Uuid::new_v4(), None, MatchKind::AdHoc, a, b)
    }

    pub fn involves(&self, participant_id: ParticipantId) -> bool {
        self.participant_a == participant_id || self.participant_b == participant_id
    }

    pub fn opponent_of(&self, participant_id: ParticipantId) -> Option<ParticipantId> {
        if self.participant_a == participant_id {
            Some(self.participant_b)
        } else if self.participant_b == participant_id {
            Some(self.participant_a)
        } else {
            None
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed && self.result.is_some()
    }

    /// Move to `next` if the lifecycle allows it
    pub fn advance(&mut self, next: MatchStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }

    pub fn proposal_mut(&mut self, proposal_id: ProposalId) -> Option<&mut TimeProposal> {
        self.proposals.iter_mut().find(|p| p.id == proposal_id)
    }
}

/// One slot of a round
///
/// Pairings carry participant ids rather than positions in the roster, so
/// later roster edits can never re-point an existing pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Pairing {
    #[serde(rename_all = "camelCase")]
    Match {
        home: ParticipantId,
        away: ParticipantId,
        match_id: Option<MatchId>,
    },
    #[serde(rename_all = "camelCase")]
    Bye { participant: ParticipantId },
}

/// A round of the round robin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    /// Round number (1-indexed)
    pub number: u32,
    pub pairings: Vec<Pairing>,
}

impl Round {
    pub fn match_ids(&self) -> impl Iterator<Item = MatchId> + '_ {
        self.pairings.iter().filter_map(|p| match p {
            Pairing::Match { match_id, .. } => *match_id,
            Pairing::Bye { .. } => None,
        })
    }
}

/// Outcome of the meeting against one opponent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadToHead {
    Win,
    Loss,
    Pending,
}

/// Per-participant record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingEntry {
    pub participant_id: ParticipantId,
    pub played: u32,
    pub won: u32,
    pub lost: u32,
    pub sets_won: u32,
    pub sets_lost: u32,
    pub set_diff: i32,
    pub games_won: u32,
    pub games_lost: u32,
    pub game_diff: i32,
    pub head_to_head: BTreeMap<ParticipantId, HeadToHead>,
}

impl StandingEntry {
    pub fn new(participant_id: ParticipantId) -> Self {
        Self {
            participant_id,
            played: 0,
            won: 0,
            lost: 0,
            sets_won: 0,
            sets_lost: 0,
            set_diff: 0,
            games_won: 0,
            games_lost: 0,
            game_diff: 0,
            head_to_head: BTreeMap::new(),
        }
    }
}

/// Aggregate outcome of scheduling every round-robin match at activation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingResult {
    pub scheduled_count: usize,
    /// Matches that were not scheduled automatically (tiers 2 and 3)
    pub failed_count: usize,
    pub failed_match_ids: Vec<MatchId>,
    pub near_miss_count: usize,
    pub near_miss_match_ids: Vec<MatchId>,
}

impl SchedulingResult {
    pub fn record(&mut self, match_id: MatchId, tier: SchedulingTier) {
        match tier {
            SchedulingTier::Overlap => self.scheduled_count += 1,
            SchedulingTier::NearMiss => {
                self.failed_count += 1;
                self.failed_match_ids.push(match_id);
                self.near_miss_count += 1;
                self.near_miss_match_ids.push(match_id);
            }
            SchedulingTier::Manual => {
                self.failed_count += 1;
                self.failed_match_ids.push(match_id);
            }
        }
    }
}

/// Participant waiting in the candidate pool for a tournament in their division
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolEntry {
    pub participant_id: ParticipantId,
    pub region: String,
    pub skill_band: String,
    pub joined_at: DateTime<Utc>,
}

impl PoolEntry {
    pub fn new(
        participant_id: ParticipantId,
        region: impl Into<String>,
        skill_band: impl Into<String>,
    ) -> Self {
        Self {
            participant_id,
            region: region.into(),
            skill_band: skill_band.into(),
            joined_at: Utc::now(),
        }
    }
}

/// Championship and third-place match ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalsMatchIds {
    pub championship: MatchId,
    pub third_place: MatchId,
}

/// Monthly round-robin tournament for one region and skill band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: TournamentId,
    /// Calendar month, formatted `YYYY-MM`
    pub month: String,
    pub region: String,
    pub skill_band: String,
    pub status: TournamentStatus,
    pub participant_ids: Vec<ParticipantId>,
    pub min_players: usize,
    pub max_players: usize,
    pub rounds: Vec<Round>,
    /// Ranked standings, best first
    pub standings: Vec<StandingEntry>,
    pub pending_results: HashMap<MatchId, ResultReport>,
    pub registration_opened_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub finals_match_ids: Option<FinalsMatchIds>,
    pub scheduling_result: Option<SchedulingResult>,
}

impl Tournament {
    pub fn new(
        month: impl Into<String>,
        region: impl Into<String>,
        skill_band: impl Into<String>,
        min_players: usize,
        max_players: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            month: month.into(),
            region: region.into(),
            skill_band: skill_band.into(),
            status: TournamentStatus::Registration,
            participant_ids: Vec::new(),
            min_players,
            max_players,
            rounds: Vec::new(),
            standings: Vec::new(),
            pending_results: HashMap::new(),
            registration_opened_at: Utc::now(),
            activated_at: None,
            completed_at: None,
            finals_match_ids: None,
            scheduling_result: None,
        }
    }

    pub fn contains(&self, participant_id: ParticipantId) -> bool {
        self.participant_ids.contains(&participant_id)
    }

    pub fn is_full(&self) -> bool {
        self.participant_ids.len() >= self.max_players
    }

    /// Full roster, or the minimum roster once registration has been open
    /// for at least `window`
    pub fn is_ready_to_activate(&self, now: DateTime<Utc>, window: Duration) -> bool {
        let count = self.participant_ids.len();
        count >= self.max_players
            || (count >= self.min_players && now - self.registration_opened_at >= window)
    }

    /// Ids of every match referenced by a round-robin pairing
    pub fn round_robin_match_ids(&self) -> Vec<MatchId> {
        self.rounds.iter().flat_map(Round::match_ids).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_status_moves_forward() {
        assert!(MatchStatus::Pending.can_transition_to(MatchStatus::Scheduling));
        assert!(MatchStatus::Scheduling.can_transition_to(MatchStatus::Scheduled));
        assert!(MatchStatus::Scheduled.can_transition_to(MatchStatus::Completed));
        assert!(MatchStatus::Pending.can_transition_to(MatchStatus::Completed));
        assert!(!MatchStatus::Scheduled.can_transition_to(MatchStatus::Pending));
        assert!(!MatchStatus::Completed.can_transition_to(MatchStatus::Scheduled));
        assert!(!MatchStatus::Cancelled.can_transition_to(MatchStatus::Pending));
    }

    #[test]
    fn test_scheduling_may_retry() {
        assert!(MatchStatus::Scheduling.can_transition_to(MatchStatus::Pending));
    }

    #[test]
    fn test_derived_id_ignores_pair_order() {
        let tournament_id = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(
            Match::derived_id(tournament_id, MatchKind::RoundRobin, a, b),
            Match::derived_id(tournament_id, MatchKind::RoundRobin, b, a)
        );
        assert_ne!(
            Match::derived_id(tournament_id, MatchKind::RoundRobin, a, b),
            Match::derived_id(tournament_id, MatchKind::Championship, a, b)
        );
    }

    #[test]
    fn test_ready_when_full() {
        let mut tournament = Tournament::new("2026-10", "Cork", "B", 4, 6);
        tournament.participant_ids = (0..6).map(|_| Uuid::new_v4()).collect();
        assert!(tournament.is_ready_to_activate(Utc::now(), Duration::days(7)));
    }

    #[test]
    fn test_ready_after_window_with_minimum() {
        let mut tournament = Tournament::new("2026-10", "Cork", "B", 4, 8);
        tournament.participant_ids = (0..4).map(|_| Uuid::new_v4()).collect();
        let now = Utc::now();
        assert!(!tournament.is_ready_to_activate(now, Duration::days(7)));

        tournament.registration_opened_at = now - Duration::days(7);
        assert!(tournament.is_ready_to_activate(now, Duration::days(7)));

        tournament.participant_ids.pop();
        assert!(!tournament.is_ready_to_activate(now, Duration::days(7)));
    }

    #[test]
    fn test_result_report_staleness() {
        let now = Utc::now();
        let report = ResultReport {
            winner_id: Uuid::new_v4(),
            sets: vec![SetScore::new(6, 3)],
            reporter_id: Uuid::new_v4(),
            reported_at: now - Duration::hours(49),
        };
        assert!(report.is_stale(now, Duration::hours(48)));
        assert!(!report.is_stale(now, Duration::hours(50)));
    }

    #[test]
    fn test_scheduling_result_counts_near_miss_as_failed() {
        let mut result = SchedulingResult::default();
        let near = Uuid::new_v4();
        let manual = Uuid::new_v4();
        result.record(Uuid::new_v4(), SchedulingTier::Overlap);
        result.record(near, SchedulingTier::NearMiss);
        result.record(manual, SchedulingTier::Manual);

        assert_eq!(result.scheduled_count, 1);
        assert_eq!(result.failed_count, 2);
        assert_eq!(result.failed_match_ids, vec![near, manual]);
        assert_eq!(result.near_miss_match_ids, vec![near]);
    }

    #[test]
    fn test_pairing_serializes_tagged() {
        let pairing = Pairing::Bye {
            participant: Uuid::nil(),
        };
        let json = serde_json::to_value(&pairing).unwrap();
        assert_eq!(json["type"], "bye");
    }
}
