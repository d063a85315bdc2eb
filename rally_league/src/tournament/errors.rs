//! Tournament error types.

use thiserror::Error;

use super::models::{
    MatchId, MatchStatus, ParticipantId, ProposalId, TournamentId, TournamentStatus,
};
use crate::db::StoreError;

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    /// Tournament not found
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    /// Match not found
    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    /// Time proposal not found on the match
    #[error("Proposal {proposal_id} not found on match {match_id}")]
    ProposalNotFound {
        match_id: MatchId,
        proposal_id: ProposalId,
    },

    /// Tournament is in the wrong lifecycle state for the operation
    #[error("Invalid tournament state: expected {expected:?}, got {actual:?}")]
    InvalidState {
        expected: TournamentStatus,
        actual: TournamentStatus,
    },

    /// Results can only be reported while a tournament is in play
    #[error("Tournament is not in play: {0:?}")]
    NotInPlay(TournamentStatus),

    /// Match is in the wrong state for the operation
    #[error("Match {match_id} is {status:?}")]
    InvalidMatchState {
        match_id: MatchId,
        status: MatchStatus,
    },

    /// Caller does not play in the match
    #[error("Participant {participant_id} does not play in match {match_id}")]
    NotAParticipant {
        participant_id: ParticipantId,
        match_id: MatchId,
    },

    /// Reported winner is not one of the match's participants
    #[error("Winner {0} does not play in the match")]
    InvalidWinner(ParticipantId),

    /// Tournament roster is at capacity
    #[error("Tournament is full")]
    TournamentFull,

    /// Match does not belong to a tournament
    #[error("Match {0} is not a tournament match")]
    NotTournamentMatch(MatchId),

    /// Match belongs to a tournament and is scheduled at activation
    #[error("Match {0} is not an ad-hoc match")]
    NotAdHocMatch(MatchId),

    /// Opponent's report disagrees with the pending one
    #[error("Reported result for match {0} does not match the pending report")]
    ResultMismatch(MatchId),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;
