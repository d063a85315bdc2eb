//! Tournament lifecycle engine.
//!
//! Drives tournaments through registration, active play, finals and
//! completion. A background loop calls [`TournamentEngine::tick`] on a fixed
//! interval; callers may also trigger activation and report results directly.
//! Every mutation of a tournament runs under that tournament's lock and
//! re-reads the tournament after acquiring it.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use uuid::Uuid;

use super::config::EngineConfig;
use super::errors::{TournamentError, TournamentResult};
use super::models::{
    Confirmation, FinalsMatchIds, Match, MatchId, MatchKind, MatchStatus, Pairing,
    ParticipantId, PoolEntry, ProposalId, ResultReport, SchedulingResult, SetScore,
    TimeProposal, Tournament, TournamentId, TournamentStatus,
};
use super::pairing::generate_rounds;
use super::standings::ranked_standings;
use crate::db::Stores;
use crate::scheduling::models::{AvailabilitySlot, SchedulingTier};
use crate::scheduling::ranking::{
    ChronologicalRanker, ParticipantSummary, RankingContext, SlotRanker,
};
use crate::scheduling::scheduler::AvailabilityScheduler;

/// Participants needed for championship and third-place matches
const FINALS_PLAYERS: usize = 4;

/// What a single tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    /// Pool entrants added to tournaments
    pub admitted: usize,
    pub activated: usize,
    pub promoted_to_finals: usize,
    pub completed: usize,
    pub auto_confirmed: usize,
    /// Tournaments whose processing failed this tick
    pub failures: usize,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

/// State of a result after a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultOutcome {
    /// Waiting for the opponent or the dispute grace period
    Pending,
    /// The opponent agreed; the match is completed
    Confirmed,
}

#[derive(Debug, Default)]
struct AdvanceStep {
    auto_confirmed: usize,
    promoted: bool,
    completed: bool,
}

/// Tournament lifecycle engine
pub struct TournamentEngine {
    stores: Stores,
    scheduler: AvailabilityScheduler,
    config: EngineConfig,
    /// One lock per tournament (or per ad-hoc match) while in use
    locks: Arc<LockTable>,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TournamentEngine {
    /// Create an engine that ranks ad-hoc slots chronologically
    pub fn new(stores: Stores, config: EngineConfig) -> Self {
        Self::with_ranker(stores, config, Arc::new(ChronologicalRanker))
    }

    /// Create an engine with a custom slot ranker for ad-hoc matches
    ///
    /// # Arguments
    ///
    /// * `stores` - Store handles for every collaborator
    /// * `config` - Engine configuration
    /// * `ranker` - Ranking policy, bounded by the configured ranking timeout
    pub fn with_ranker(stores: Stores, config: EngineConfig, ranker: Arc<dyn SlotRanker>) -> Self {
        let scheduler = AvailabilityScheduler::new(
            config.scheduling_horizon_days,
            ranker,
            config.ranking_timeout(),
        );
        let (shutdown, _) = watch::channel(false);

        Self {
            stores,
            scheduler,
            config,
            locks: Arc::default(),
            shutdown,
            task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Spawn the periodic tick loop; no-op if it is already running
    pub async fn start(self: &Arc<Self>) {
        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        self.shutdown.send_replace(false);
        let shutdown = self.shutdown.subscribe();
        let engine = Arc::clone(self);
        *task = Some(tokio::spawn(async move { engine.run(shutdown).await }));
    }

    /// Stop future ticks
    ///
    /// A tick already in progress runs to completion. Returns the loop's
    /// handle so the caller can wait for it.
    pub async fn stop(&self) -> Option<JoinHandle<()>> {
        self.shutdown.send_replace(true);
        self.task.lock().await.take()
    }

    async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        log::info!(
            "Tournament engine starting (tick every {}s)",
            self.config.tick_interval_secs
        );

        let mut tick_interval = interval(self.config.tick_interval());
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {
                    let report = self.tick().await;
                    if !report.is_idle() {
                        log::info!("Engine tick: {:?}", report);
                    }
                }

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        log::info!("Tournament engine stopped");
    }

    /// Run one pass over every tournament
    ///
    /// Failures are logged and counted per tournament; they never stop the
    /// pass.
    pub async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();

        match self
            .stores
            .tournaments
            .tournaments_by_status(TournamentStatus::Registration)
            .await
        {
            Ok(registering) => {
                for tournament in registering {
                    match self.process_registration(tournament.id).await {
                        Ok((admitted, activated)) => {
                            report.admitted += admitted;
                            report.activated += usize::from(activated);
                        }
                        Err(e) => {
                            log::error!(
                                "Tournament {}: registration step failed: {}",
                                tournament.id,
                                e
                            );
                            report.failures += 1;
                        }
                    }
                }
            }
            Err(e) => {
                log::error!("Failed to list registering tournaments: {}", e);
                report.failures += 1;
            }
        }

        for status in [TournamentStatus::Active, TournamentStatus::Finals] {
            let tournaments = match self.stores.tournaments.tournaments_by_status(status).await {
                Ok(tournaments) => tournaments,
                Err(e) => {
                    log::error!("Failed to list {} tournaments: {}", status.as_str(), e);
                    report.failures += 1;
                    continue;
                }
            };

            for tournament in tournaments {
                match self.advance_tournament(tournament.id).await {
                    Ok(step) => {
                        report.auto_confirmed += step.auto_confirmed;
                        report.promoted_to_finals += usize::from(step.promoted);
                        report.completed += usize::from(step.completed);
                    }
                    Err(e) => {
                        log::error!("Tournament {}: advance step failed: {}", tournament.id, e);
                        report.failures += 1;
                    }
                }
            }
        }

        report
    }

    /// Open a tournament for a division and month, or return the existing one
    pub async fn open_tournament(
        &self,
        month: &str,
        region: &str,
        skill_band: &str,
        min_players: usize,
        max_players: usize,
    ) -> TournamentResult<Tournament> {
        if let Some(existing) = self
            .stores
            .tournaments
            .find_by_division(region, skill_band, month)
            .await?
        {
            return Ok(existing);
        }

        let tournament = Tournament::new(month, region, skill_band, min_players, max_players);
        self.stores.tournaments.upsert_tournament(&tournament).await?;
        log::info!(
            "Opened tournament {} for {} {} {}",
            tournament.id,
            region,
            skill_band,
            month
        );
        Ok(tournament)
    }

    /// Put a participant in the candidate pool for their division
    ///
    /// Returns false when the participant is unknown to the directory.
    pub async fn enter_pool(&self, participant_id: ParticipantId) -> TournamentResult<bool> {
        let Some(participant) = self.stores.participants.find_participant(participant_id).await?
        else {
            log::debug!("Participant {} not in directory, not pooled", participant_id);
            return Ok(false);
        };

        let entry = PoolEntry::new(participant.id, participant.region, participant.skill_band);
        self.stores.pool.add_entry(&entry).await?;
        Ok(true)
    }

    /// Add a participant to a tournament in registration, then check readiness
    ///
    /// Joining twice is a no-op. Returns whether the tournament activated.
    pub async fn join_tournament(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
    ) -> TournamentResult<bool> {
        {
            let _guard = self.lock(tournament_id).await;

            let mut tournament = self.load_tournament(tournament_id).await?;
            if tournament.status != TournamentStatus::Registration {
                return Err(TournamentError::InvalidState {
                    expected: TournamentStatus::Registration,
                    actual: tournament.status,
                });
            }

            if !tournament.contains(participant_id) {
                if tournament.is_full() {
                    return Err(TournamentError::TournamentFull);
                }
                tournament.participant_ids.push(participant_id);
                self.stores.tournaments.upsert_tournament(&tournament).await?;
            }
        }

        self.activate_tournament_if_ready(tournament_id).await
    }

    /// Activate the tournament if its roster is ready
    ///
    /// Returns true only for the call that performed the activation; a
    /// tournament that is not in registration is left untouched.
    pub async fn activate_tournament_if_ready(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<bool> {
        let _guard = self.lock(tournament_id).await;

        let mut tournament = self.load_tournament(tournament_id).await?;
        let now = Utc::now();
        if tournament.status != TournamentStatus::Registration
            || !tournament.is_ready_to_activate(now, self.config.registration_window())
        {
            return Ok(false);
        }

        self.activate(&mut tournament, now).await?;
        Ok(true)
    }

    /// Record a participant's claimed result
    ///
    /// The first report waits for confirmation. An agreeing report from the
    /// opponent completes the match; a disagreeing one is rejected. A repeat
    /// report from the original reporter replaces its claim.
    pub async fn report_result(
        &self,
        match_id: MatchId,
        reporter_id: ParticipantId,
        winner_id: ParticipantId,
        sets: Vec<SetScore>,
    ) -> TournamentResult<ResultOutcome> {
        let tournament_id = self
            .load_match(match_id)
            .await?
            .tournament_id
            .ok_or(TournamentError::NotTournamentMatch(match_id))?;

        let _guard = self.lock(tournament_id).await;

        let mut tournament = self.load_tournament(tournament_id).await?;
        if !matches!(
            tournament.status,
            TournamentStatus::Active | TournamentStatus::Finals
        ) {
            return Err(TournamentError::NotInPlay(tournament.status));
        }

        let mut m = self.load_match(match_id).await?;
        if !m.involves(reporter_id) {
            return Err(TournamentError::NotAParticipant {
                participant_id: reporter_id,
                match_id,
            });
        }
        if !m.involves(winner_id) {
            return Err(TournamentError::InvalidWinner(winner_id));
        }
        if !m.status.is_open() {
            return Err(TournamentError::InvalidMatchState {
                match_id,
                status: m.status,
            });
        }

        let now = Utc::now();
        let report = ResultReport {
            winner_id,
            sets,
            reporter_id,
            reported_at: now,
        };

        let confirmed = match tournament.pending_results.get(&match_id) {
            Some(pending) if pending.reporter_id != reporter_id => {
                if !pending.agrees_with(&report) {
                    return Err(TournamentError::ResultMismatch(match_id));
                }
                Some(pending.confirm(Confirmation::Opponent, now))
            }
            _ => None,
        };

        let Some(result) = confirmed else {
            tournament.pending_results.insert(match_id, report);
            self.stores.tournaments.upsert_tournament(&tournament).await?;
            return Ok(ResultOutcome::Pending);
        };

        m.result = Some(result);
        m.advance(MatchStatus::Completed);
        self.stores.matches.upsert_match(&m).await?;

        tournament.pending_results.remove(&match_id);
        let matches = self.stores.matches.matches_for_tournament(tournament_id).await?;
        tournament.standings = ranked_standings(&tournament.participant_ids, &matches);
        self.stores.tournaments.upsert_tournament(&tournament).await?;

        log::info!("Match {} confirmed by opponent", match_id);
        Ok(ResultOutcome::Confirmed)
    }

    /// Offer a time for a match; the proposer accepts it implicitly
    pub async fn propose_time(
        &self,
        match_id: MatchId,
        participant_id: ParticipantId,
        datetime: NaiveDateTime,
        label: impl Into<String>,
    ) -> TournamentResult<ProposalId> {
        let key = self.load_match(match_id).await?.tournament_id.unwrap_or(match_id);
        let _guard = self.lock(key).await;

        let mut m = self.load_match(match_id).await?;
        ensure_negotiable(&m, participant_id)?;

        let proposal = TimeProposal::by_participant(participant_id, datetime, label.into());
        let proposal_id = proposal.id;
        m.proposals.push(proposal);
        m.advance(MatchStatus::Scheduling);
        self.stores.matches.upsert_match(&m).await?;

        Ok(proposal_id)
    }

    /// Accept a proposed time; returns true once both participants accepted
    /// and the match is scheduled
    pub async fn accept_proposal(
        &self,
        match_id: MatchId,
        proposal_id: ProposalId,
        participant_id: ParticipantId,
    ) -> TournamentResult<bool> {
        let key = self.load_match(match_id).await?.tournament_id.unwrap_or(match_id);
        let _guard = self.lock(key).await;

        let mut m = self.load_match(match_id).await?;
        ensure_negotiable(&m, participant_id)?;

        let (participant_a, participant_b) = (m.participant_a, m.participant_b);
        let proposal = m
            .proposal_mut(proposal_id)
            .ok_or(TournamentError::ProposalNotFound {
                match_id,
                proposal_id,
            })?;
        proposal.accepted_by.insert(participant_id);

        let agreed = proposal.accepted_by.contains(&participant_a)
            && proposal.accepted_by.contains(&participant_b);
        let datetime = proposal.datetime;
        if agreed {
            m.scheduled_at = Some(datetime);
            m.advance(MatchStatus::Scheduled);
        }
        self.stores.matches.upsert_match(&m).await?;

        Ok(agreed)
    }

    /// Create a friendly match and schedule it
    pub async fn create_adhoc_match(
        &self,
        participant_a: ParticipantId,
        participant_b: ParticipantId,
    ) -> TournamentResult<Match> {
        let m = Match::adhoc(participant_a, participant_b);
        self.stores.matches.upsert_match(&m).await?;
        self.schedule_adhoc_match(m.id).await?;
        self.load_match(m.id).await
    }

    /// Run the full scheduler, including slot ranking, for an ad-hoc match
    pub async fn schedule_adhoc_match(
        &self,
        match_id: MatchId,
    ) -> TournamentResult<SchedulingTier> {
        let _guard = self.lock(match_id).await;

        let mut m = self.load_match(match_id).await?;
        if m.tournament_id.is_some() {
            return Err(TournamentError::NotAdHocMatch(match_id));
        }
        if !matches!(m.status, MatchStatus::Pending | MatchStatus::Scheduling) {
            return Err(TournamentError::InvalidMatchState {
                match_id,
                status: m.status,
            });
        }

        let slots_a = self.stores.availability.slots_for(m.participant_a).await?;
        let slots_b = self.stores.availability.slots_for(m.participant_b).await?;
        let context = RankingContext {
            participant_a: self.summarize(m.participant_a, &slots_a).await?,
            participant_b: self.summarize(m.participant_b, &slots_b).await?,
        };

        let tier = self
            .scheduler
            .schedule_adhoc(&mut m, &context, &slots_a, &slots_b, self.local_now(Utc::now()))
            .await;
        self.stores.matches.upsert_match(&m).await?;

        log::debug!("Ad-hoc match {} scheduled at tier {}", match_id, tier.number());
        Ok(tier)
    }

    async fn process_registration(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<(usize, bool)> {
        let admitted = self.admit_from_pool(tournament_id).await?;
        let activated = self.activate_tournament_if_ready(tournament_id).await?;
        Ok((admitted, activated))
    }

    /// Move matching pool entrants into a tournament in registration
    async fn admit_from_pool(&self, tournament_id: TournamentId) -> TournamentResult<usize> {
        let _guard = self.lock(tournament_id).await;

        let mut tournament = self.load_tournament(tournament_id).await?;
        if tournament.status != TournamentStatus::Registration {
            return Ok(0);
        }

        let entries = self
            .stores
            .pool
            .entries_for(&tournament.region, &tournament.skill_band)
            .await?;

        let mut admitted = Vec::new();
        let mut already_members = Vec::new();
        for entry in entries {
            if tournament.contains(entry.participant_id) {
                already_members.push(entry.participant_id);
                continue;
            }
            if tournament.is_full() {
                break;
            }
            tournament.participant_ids.push(entry.participant_id);
            admitted.push(entry.participant_id);
        }

        if !admitted.is_empty() {
            self.stores.tournaments.upsert_tournament(&tournament).await?;
            log::info!(
                "Tournament {}: admitted {} participants from pool",
                tournament_id,
                admitted.len()
            );
        }

        for participant_id in admitted.iter().chain(&already_members) {
            self.stores.pool.remove_entry(*participant_id).await?;
        }

        Ok(admitted.len())
    }

    /// Generate rounds and matches, schedule every match and flip to active
    ///
    /// Match ids are derived from the tournament and pairing, so re-running
    /// after a partial failure overwrites instead of duplicating.
    async fn activate(
        &self,
        tournament: &mut Tournament,
        now: DateTime<Utc>,
    ) -> TournamentResult<()> {
        let roster = tournament.participant_ids.clone();
        let mut rounds = generate_rounds(&roster);

        let mut matches = Vec::new();
        for pairing in rounds.iter_mut().flat_map(|round| round.pairings.iter_mut()) {
            if let Pairing::Match {
                home,
                away,
                match_id,
            } = pairing
            {
                let m = Match::round_robin(tournament.id, *home, *away);
                *match_id = Some(m.id);
                matches.push(m);
            }
        }

        let mut availability: HashMap<ParticipantId, Vec<AvailabilitySlot>> = HashMap::new();
        for participant_id in &roster {
            let slots = self.stores.availability.slots_for(*participant_id).await?;
            availability.insert(*participant_id, slots);
        }

        let local_now = self.local_now(now);
        let mut scheduling = SchedulingResult::default();
        for m in &mut matches {
            let no_slots = Vec::new();
            let slots_a = availability.get(&m.participant_a).unwrap_or(&no_slots);
            let slots_b = availability.get(&m.participant_b).unwrap_or(&no_slots);

            let verdict = self.scheduler.evaluate(slots_a, slots_b, local_now);
            let tier = AvailabilityScheduler::apply_tournament_verdict(m, &verdict);
            scheduling.record(m.id, tier);
            self.stores.matches.upsert_match(m).await?;
        }

        tournament.rounds = rounds;
        tournament.standings = ranked_standings(&roster, &[]);
        tournament.activated_at = Some(now);
        tournament.status = TournamentStatus::Active;
        log::info!(
            "Tournament {} activated with {} participants: {} scheduled, {} not ({} near misses)",
            tournament.id,
            roster.len(),
            scheduling.scheduled_count,
            scheduling.failed_count,
            scheduling.near_miss_count
        );
        tournament.scheduling_result = Some(scheduling);
        self.stores.tournaments.upsert_tournament(tournament).await?;

        Ok(())
    }

    /// Auto-confirm stale results, then promote or complete as warranted
    async fn advance_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<AdvanceStep> {
        let _guard = self.lock(tournament_id).await;

        let mut step = AdvanceStep::default();
        let mut tournament = self.load_tournament(tournament_id).await?;
        if !matches!(
            tournament.status,
            TournamentStatus::Active | TournamentStatus::Finals
        ) {
            return Ok(step);
        }

        let now = Utc::now();
        let mut matches = self.stores.matches.matches_for_tournament(tournament_id).await?;
        let mut changed = false;

        let grace = self.config.dispute_grace();
        let mut stale: Vec<MatchId> = tournament
            .pending_results
            .iter()
            .filter(|(_, report)| report.is_stale(now, grace))
            .map(|(match_id, _)| *match_id)
            .collect();
        stale.sort();

        for match_id in stale {
            let Some(report) = tournament.pending_results.remove(&match_id) else {
                continue;
            };
            changed = true;

            let Some(m) = matches.iter_mut().find(|m| m.id == match_id) else {
                log::debug!("Dropping pending result for unknown match {}", match_id);
                continue;
            };
            if !m.status.is_open() {
                continue;
            }

            m.result = Some(report.confirm(Confirmation::Auto, now));
            m.advance(MatchStatus::Completed);
            self.stores.matches.upsert_match(m).await?;
            step.auto_confirmed += 1;
            log::info!(
                "Match {} auto-confirmed for {} after {}h without dispute",
                match_id,
                report.winner_id,
                self.config.dispute_grace_hours
            );
        }

        if changed {
            tournament.standings = ranked_standings(&tournament.participant_ids, &matches);
        }

        match tournament.status {
            TournamentStatus::Active => {
                if all_completed(&tournament.round_robin_match_ids(), &matches) {
                    step.promoted = self.promote_to_finals(&mut tournament, &matches).await?;
                    changed |= step.promoted;
                }
            }
            TournamentStatus::Finals => {
                let finals_done = tournament.finals_match_ids.is_some_and(|ids| {
                    all_completed(&[ids.championship, ids.third_place], &matches)
                });
                if finals_done {
                    tournament.standings =
                        ranked_standings(&tournament.participant_ids, &matches);
                    tournament.status = TournamentStatus::Completed;
                    tournament.completed_at = Some(now);
                    step.completed = true;
                    changed = true;
                    log::info!("Tournament {} completed", tournament_id);
                }
            }
            _ => {}
        }

        if changed {
            self.stores.tournaments.upsert_tournament(&tournament).await?;
        }

        Ok(step)
    }

    /// Create championship and third-place matches from the final standings
    ///
    /// Returns false, leaving the tournament active, when fewer than four
    /// participants are ranked.
    async fn promote_to_finals(
        &self,
        tournament: &mut Tournament,
        matches: &[Match],
    ) -> TournamentResult<bool> {
        let standings = ranked_standings(&tournament.participant_ids, matches);
        if standings.len() < FINALS_PLAYERS {
            log::debug!(
                "Tournament {}: round robin done with {} participants, no finals",
                tournament.id,
                standings.len()
            );
            return Ok(false);
        }

        let ranked: Vec<ParticipantId> = standings.iter().map(|e| e.participant_id).collect();
        let mut finals_ids = Vec::with_capacity(2);
        for (kind, a, b) in [
            (MatchKind::Championship, ranked[0], ranked[1]),
            (MatchKind::ThirdPlace, ranked[2], ranked[3]),
        ] {
            let fresh = Match::finals(tournament.id, kind, a, b);
            // A previous attempt may already have created it
            if !matches.iter().any(|m| m.id == fresh.id) {
                self.stores.matches.upsert_match(&fresh).await?;
            }
            finals_ids.push(fresh.id);
        }

        tournament.standings = standings;
        tournament.finals_match_ids = Some(FinalsMatchIds {
            championship: finals_ids[0],
            third_place: finals_ids[1],
        });
        tournament.status = TournamentStatus::Finals;
        log::info!(
            "Tournament {} promoted to finals: {} v {}, {} v {}",
            tournament.id,
            ranked[0],
            ranked[1],
            ranked[2],
            ranked[3]
        );
        Ok(true)
    }

    async fn summarize(
        &self,
        participant_id: ParticipantId,
        slots: &[AvailabilitySlot],
    ) -> TournamentResult<ParticipantSummary> {
        let display_name = match self.stores.participants.find_participant(participant_id).await? {
            Some(participant) => participant.display_name,
            None => {
                log::debug!("Participant {} not in directory", participant_id);
                participant_id.to_string()
            }
        };
        Ok(ParticipantSummary::new(participant_id, display_name, slots))
    }

    async fn lock(&self, key: Uuid) -> KeyGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key).or_default())
        };
        let guard = Arc::clone(&lock).lock_owned().await;
        KeyGuard {
            key,
            lock,
            table: Arc::clone(&self.locks),
            guard: Some(guard),
        }
    }

    async fn load_tournament(&self, tournament_id: TournamentId) -> TournamentResult<Tournament> {
        self.stores
            .tournaments
            .find_tournament(tournament_id)
            .await?
            .ok_or(TournamentError::NotFound(tournament_id))
    }

    async fn load_match(&self, match_id: MatchId) -> TournamentResult<Match> {
        self.stores
            .matches
            .find_match(match_id)
            .await?
            .ok_or(TournamentError::MatchNotFound(match_id))
    }

    fn local_now(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.with_timezone(&self.config.local_offset()).naive_local()
    }
}

type LockTable = StdMutex<HashMap<Uuid, Arc<Mutex<()>>>>;

/// Holds one key's lock; the table entry goes away with the last holder
struct KeyGuard {
    key: Uuid,
    lock: Arc<Mutex<()>>,
    table: Arc<LockTable>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Handles are only cloned under the table lock, so two references
        // (the table's and ours) means nobody else is holding or waiting
        let mut locks = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&self.lock) == 2
            && locks
                .get(&self.key)
                .is_some_and(|entry| Arc::ptr_eq(entry, &self.lock))
        {
            locks.remove(&self.key);
        }
    }
}

fn all_completed(match_ids: &[MatchId], matches: &[Match]) -> bool {
    match_ids
        .iter()
        .all(|id| matches.iter().any(|m| m.id == *id && m.is_completed()))
}

/// Times can be negotiated by the match's participants until it is booked
fn ensure_negotiable(m: &Match, participant_id: ParticipantId) -> TournamentResult<()> {
    if !m.involves(participant_id) {
        return Err(TournamentError::NotAParticipant {
            participant_id,
            match_id: m.id,
        });
    }
    if !matches!(m.status, MatchStatus::Pending | MatchStatus::Scheduling) {
        return Err(TournamentError::InvalidMatchState {
            match_id: m.id,
            status: m.status,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn engine() -> (Arc<MemoryStore>, TournamentEngine) {
        let store = Arc::new(MemoryStore::new());
        let engine = TournamentEngine::new(Stores::shared(store.clone()), EngineConfig::default());
        (store, engine)
    }

    #[test]
    fn test_tick_report_idle() {
        assert!(TickReport::default().is_idle());
        let report = TickReport {
            activated: 1,
            ..TickReport::default()
        };
        assert!(!report.is_idle());
    }

    #[tokio::test]
    async fn test_open_tournament_reuses_division() {
        let (_, engine) = engine();
        let first = engine.open_tournament("2026-10", "Cork", "B", 4, 8).await.unwrap();
        let second = engine.open_tournament("2026-10", "Cork", "B", 4, 8).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_join_rejects_full_and_started() {
        let (_, engine) = engine();
        let tournament = engine.open_tournament("2026-10", "Cork", "B", 2, 3).await.unwrap();

        for _ in 0..2 {
            let activated = engine
                .join_tournament(tournament.id, Uuid::new_v4())
                .await
                .unwrap();
            assert!(!activated);
        }
        assert!(
            engine
                .join_tournament(tournament.id, Uuid::new_v4())
                .await
                .unwrap()
        );

        let err = engine
            .join_tournament(tournament.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, TournamentError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_join_is_idempotent() {
        let (store, engine) = engine();
        let tournament = engine.open_tournament("2026-10", "Cork", "B", 4, 8).await.unwrap();
        let pid = Uuid::new_v4();

        engine.join_tournament(tournament.id, pid).await.unwrap();
        let writes = store.write_count();
        engine.join_tournament(tournament.id, pid).await.unwrap();

        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_enter_pool_skips_unknown_participant() {
        let (_, engine) = engine();
        assert!(!engine.enter_pool(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_tournament() {
        let (_, engine) = engine();
        let err = engine
            .activate_tournament_if_ready(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, TournamentError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let store = Arc::new(MemoryStore::new());
        let config = EngineConfig {
            tick_interval_secs: 1,
            ..EngineConfig::default()
        };
        let engine = Arc::new(TournamentEngine::new(Stores::shared(store), config));

        engine.start().await;
        engine.start().await;
        let handle = engine.stop().await.expect("loop was running");
        handle.await.unwrap();
        assert!(engine.stop().await.is_none());
    }

    fn lock_entries(engine: &TournamentEngine) -> usize {
        engine.locks.lock().unwrap().len()
    }

    #[tokio::test]
    async fn test_lock_table_released_after_adhoc_matches() {
        let (_, engine) = engine();
        for _ in 0..200 {
            engine
                .create_adhoc_match(Uuid::new_v4(), Uuid::new_v4())
                .await
                .unwrap();
        }
        assert_eq!(lock_entries(&engine), 0);
    }

    #[tokio::test]
    async fn test_lock_table_released_after_contended_joins() {
        let (_, engine) = engine();
        let engine = Arc::new(engine);
        let tournament = engine.open_tournament("2026-10", "Cork", "B", 4, 16).await.unwrap();

        let joins: Vec<_> = (0..12)
            .map(|_| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    engine.join_tournament(tournament.id, Uuid::new_v4()).await
                })
            })
            .collect();
        for join in joins {
            join.await.unwrap().unwrap();
        }

        let joined = engine.load_tournament(tournament.id).await.unwrap();
        assert_eq!(joined.participant_ids.len(), 12);
        assert_eq!(lock_entries(&engine), 0);
    }

    #[tokio::test]
    async fn test_waiter_keeps_lock_entry() {
        let (_, engine) = engine();
        let key = Uuid::new_v4();

        let first = engine.lock(key).await;
        let second = engine.lock(Uuid::new_v4()).await;
        assert_eq!(lock_entries(&engine), 2);
        drop(second);
        assert_eq!(lock_entries(&engine), 1);

        let engine = Arc::new(engine);
        let waiter = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                let _guard = engine.lock(key).await;
            })
        };
        tokio::task::yield_now().await;
        drop(first);
        assert_eq!(lock_entries(&engine), 1);
        waiter.await.unwrap();
        assert_eq!(lock_entries(&engine), 0);
    }
}
