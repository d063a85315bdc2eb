//! Ranking and labelling of overlap candidates for ad-hoc matches.
//!
//! A [`SlotRanker`] picks up to [`PICK_COUNT`] candidates and labels them.
//! [`ChronologicalRanker`] is the default policy and the fallback used by
//! [`rank_with_fallback`] whenever another ranker times out, fails, or returns
//! output that does not match the candidate list.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, time::Duration};
use thiserror::Error;

use super::models::{AvailabilitySlot, SlotCandidate};
use crate::tournament::models::ParticipantId;

/// Number of picks offered to participants
pub const PICK_COUNT: usize = 3;

/// Default time allowed for a ranking call
pub const DEFAULT_RANKING_TIMEOUT: Duration = Duration::from_secs(5);

/// Ranking errors
#[derive(Debug, Error)]
pub enum RankingError {
    #[error("Ranking timed out after {0:?}")]
    Timeout(Duration),

    #[error("Ranking request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ranking service returned status {0}")]
    Status(u16),

    #[error("Unusable ranking output: {0}")]
    Parse(String),
}

pub type RankingResult<T> = Result<T, RankingError>;

/// Availability summary for one side of the match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSummary {
    pub participant_id: ParticipantId,
    pub display_name: String,
    /// e.g. `Tuesday 18:00-20:00`
    pub slots: Vec<String>,
}

impl ParticipantSummary {
    pub fn new(
        participant_id: ParticipantId,
        display_name: impl Into<String>,
        slots: &[AvailabilitySlot],
    ) -> Self {
        Self {
            participant_id,
            display_name: display_name.into(),
            slots: slots.iter().map(AvailabilitySlot::summary).collect(),
        }
    }
}

/// Context handed to a ranker alongside the candidates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingContext {
    pub participant_a: ParticipantSummary,
    pub participant_b: ParticipantSummary,
}

/// A chosen start time and its label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedSlot {
    pub datetime: NaiveDateTime,
    pub label: String,
}

impl From<&SlotCandidate> for RankedSlot {
    fn from(candidate: &SlotCandidate) -> Self {
        Self {
            datetime: candidate.starts_at(),
            label: candidate.label(),
        }
    }
}

/// Strategy for choosing which candidates to offer
#[async_trait]
pub trait SlotRanker: Send + Sync {
    /// Pick and label up to [`PICK_COUNT`] of `candidates`
    async fn rank(
        &self,
        context: &RankingContext,
        candidates: &[SlotCandidate],
    ) -> RankingResult<Vec<RankedSlot>>;
}

/// Earliest candidates first
#[derive(Debug, Clone, Copy, Default)]
pub struct ChronologicalRanker;

impl ChronologicalRanker {
    pub fn pick(candidates: &[SlotCandidate]) -> Vec<RankedSlot> {
        let mut sorted = candidates.to_vec();
        sorted.sort();
        sorted.iter().take(PICK_COUNT).map(RankedSlot::from).collect()
    }
}

#[async_trait]
impl SlotRanker for ChronologicalRanker {
    async fn rank(
        &self,
        _context: &RankingContext,
        candidates: &[SlotCandidate],
    ) -> RankingResult<Vec<RankedSlot>> {
        Ok(Self::pick(candidates))
    }
}

/// Check that picks are exactly the expected number of distinct candidates
pub fn validate_picks(
    picks: Vec<RankedSlot>,
    candidates: &[SlotCandidate],
) -> RankingResult<Vec<RankedSlot>> {
    let expected = candidates.len().min(PICK_COUNT);
    if picks.len() != expected {
        return Err(RankingError::Parse(format!(
            "expected {expected} picks, got {}",
            picks.len()
        )));
    }
    if let Some(unknown) = picks
        .iter()
        .find(|pick| !candidates.iter().any(|c| c.starts_at() == pick.datetime))
    {
        return Err(RankingError::Parse(format!(
            "pick {} is not a candidate",
            unknown.datetime
        )));
    }
    let mut seen = HashSet::new();
    if let Some(repeated) = picks.iter().find(|pick| !seen.insert(pick.datetime)) {
        return Err(RankingError::Parse(format!(
            "pick {} appears more than once",
            repeated.datetime
        )));
    }
    if picks.iter().any(|pick| pick.label.trim().is_empty()) {
        return Err(RankingError::Parse("empty label".to_string()));
    }
    Ok(picks)
}

#[derive(Debug, Serialize)]
struct RankRequest<'a> {
    context: &'a RankingContext,
    candidates: Vec<RankedSlot>,
    count: usize,
}

#[derive(Debug, Deserialize)]
struct RankResponse {
    picks: Vec<RankedSlot>,
}

/// Parse a ranking service response body
pub fn parse_picks(body: &str, candidates: &[SlotCandidate]) -> RankingResult<Vec<RankedSlot>> {
    let response: RankResponse =
        serde_json::from_str(body).map_err(|e| RankingError::Parse(e.to_string()))?;
    validate_picks(response.picks, candidates)
}

/// Ranker backed by an external text-generation service
///
/// Posts the context and candidates as JSON and expects
/// `{"picks": [{"datetime": "...", "label": "..."}]}` back.
pub struct HttpSlotRanker {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpSlotRanker {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(endpoint, reqwest::Client::new())
    }

    pub fn with_client(endpoint: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }
}

#[async_trait]
impl SlotRanker for HttpSlotRanker {
    async fn rank(
        &self,
        context: &RankingContext,
        candidates: &[SlotCandidate],
    ) -> RankingResult<Vec<RankedSlot>> {
        let request = RankRequest {
            context,
            candidates: candidates.iter().map(RankedSlot::from).collect(),
            count: candidates.len().min(PICK_COUNT),
        };

        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(RankingError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        parse_picks(&body, candidates)
    }
}

/// Ask `ranker` for picks, falling back to chronological order on any failure
///
/// Never returns an error; an empty candidate list yields no picks without
/// calling the ranker.
pub async fn rank_with_fallback(
    ranker: &dyn SlotRanker,
    timeout: Duration,
    context: &RankingContext,
    candidates: &[SlotCandidate],
) -> Vec<RankedSlot> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let outcome = match tokio::time::timeout(timeout, ranker.rank(context, candidates)).await {
        Ok(result) => result.and_then(|picks| validate_picks(picks, candidates)),
        Err(_) => Err(RankingError::Timeout(timeout)),
    };

    match outcome {
        Ok(picks) => picks,
        Err(e) => {
            log::warn!("Slot ranking fell back to chronological order: {}", e);
            ChronologicalRanker::pick(candidates)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use uuid::Uuid;

    fn candidates(count: u32) -> Vec<SlotCandidate> {
        (0..count)
            .map(|day| SlotCandidate {
                date: NaiveDate::from_ymd_opt(2026, 10, 20 + day).unwrap(),
                start: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                end: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            })
            .collect()
    }

    fn context() -> RankingContext {
        let summary = |name: &str| ParticipantSummary {
            participant_id: Uuid::new_v4(),
            display_name: name.to_string(),
            slots: vec!["Tuesday 18:00-20:00".to_string()],
        };
        RankingContext {
            participant_a: summary("Aoife"),
            participant_b: summary("Brian"),
        }
    }

    struct FixedRanker(Vec<RankedSlot>);

    #[async_trait]
    impl SlotRanker for FixedRanker {
        async fn rank(
            &self,
            _context: &RankingContext,
            _candidates: &[SlotCandidate],
        ) -> RankingResult<Vec<RankedSlot>> {
            Ok(self.0.clone())
        }
    }

    struct SlowRanker;

    #[async_trait]
    impl SlotRanker for SlowRanker {
        async fn rank(
            &self,
            _context: &RankingContext,
            candidates: &[SlotCandidate],
        ) -> RankingResult<Vec<RankedSlot>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ChronologicalRanker::pick(candidates))
        }
    }

    struct FailingRanker;

    #[async_trait]
    impl SlotRanker for FailingRanker {
        async fn rank(
            &self,
            _context: &RankingContext,
            _candidates: &[SlotCandidate],
        ) -> RankingResult<Vec<RankedSlot>> {
            Err(RankingError::Status(503))
        }
    }

    #[test]
    fn test_chronological_takes_first_three() {
        let mut all = candidates(5);
        all.reverse();
        let picks = ChronologicalRanker::pick(&all);
        assert_eq!(picks.len(), 3);
        assert_eq!(picks[0].datetime.date(), NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
        assert!(picks.windows(2).all(|w| w[0].datetime < w[1].datetime));
    }

    #[tokio::test]
    async fn test_ranker_picks_used_when_valid() {
        let all = candidates(5);
        let picks: Vec<RankedSlot> = all[2..5]
            .iter()
            .map(|c| RankedSlot {
                datetime: c.starts_at(),
                label: "Evening after work".to_string(),
            })
            .collect();

        let ranked = rank_with_fallback(
            &FixedRanker(picks.clone()),
            DEFAULT_RANKING_TIMEOUT,
            &context(),
            &all,
        )
        .await;
        assert_eq!(ranked, picks);
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let all = candidates(4);
        let ranked =
            rank_with_fallback(&SlowRanker, Duration::from_millis(20), &context(), &all).await;
        assert_eq!(ranked, ChronologicalRanker::pick(&all));
    }

    #[tokio::test]
    async fn test_error_falls_back() {
        let all = candidates(4);
        let ranked =
            rank_with_fallback(&FailingRanker, DEFAULT_RANKING_TIMEOUT, &context(), &all).await;
        assert_eq!(ranked, ChronologicalRanker::pick(&all));
    }

    #[tokio::test]
    async fn test_wrong_pick_count_falls_back() {
        let all = candidates(4);
        let two = ChronologicalRanker::pick(&all)[..2].to_vec();
        let ranked =
            rank_with_fallback(&FixedRanker(two), DEFAULT_RANKING_TIMEOUT, &context(), &all).await;
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked, ChronologicalRanker::pick(&all));
    }

    #[tokio::test]
    async fn test_unknown_datetime_falls_back() {
        let all = candidates(3);
        let mut picks = ChronologicalRanker::pick(&all);
        picks[1].datetime = picks[1].datetime + chrono::Duration::minutes(30);
        let ranked =
            rank_with_fallback(&FixedRanker(picks), DEFAULT_RANKING_TIMEOUT, &context(), &all)
                .await;
        assert_eq!(ranked, ChronologicalRanker::pick(&all));
    }

    #[tokio::test]
    async fn test_repeated_pick_falls_back() {
        let all = candidates(5);
        let same = RankedSlot {
            datetime: all[3].starts_at(),
            label: "Friday evening".to_string(),
        };
        let ranked = rank_with_fallback(
            &FixedRanker(vec![same.clone(), same.clone(), same]),
            DEFAULT_RANKING_TIMEOUT,
            &context(),
            &all,
        )
        .await;
        assert_eq!(ranked, ChronologicalRanker::pick(&all));
    }

    #[test]
    fn test_validate_rejects_repeated_datetime() {
        let all = candidates(3);
        let mut picks = ChronologicalRanker::pick(&all);
        picks[2].datetime = picks[0].datetime;
        let err = validate_picks(picks, &all).unwrap_err();
        assert!(matches!(err, RankingError::Parse(ref msg) if msg.contains("more than once")));
    }

    #[tokio::test]
    async fn test_no_candidates_no_picks() {
        let ranked =
            rank_with_fallback(&FailingRanker, DEFAULT_RANKING_TIMEOUT, &context(), &[]).await;
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_parse_picks() {
        let all = candidates(2);
        let body = r#"{"picks": [
            {"datetime": "2026-10-21T18:00:00", "label": "Wednesday evening"},
            {"datetime": "2026-10-20T18:00:00", "label": "Tuesday evening"}
        ]}"#;
        let picks = parse_picks(body, &all).unwrap();
        assert_eq!(picks.len(), 2);
        assert_eq!(picks[0].label, "Wednesday evening");

        assert!(matches!(
            parse_picks("not json", &all),
            Err(RankingError::Parse(_))
        ));
        assert!(matches!(
            parse_picks(r#"{"picks": []}"#, &all),
            Err(RankingError::Parse(_))
        ));
    }
}
