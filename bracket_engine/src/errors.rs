//! Bracket engine error types.

use crate::graph::{MatchId, ParticipantId};
use thiserror::Error;

/// Errors raised while generating or progressing a bracket
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    /// Bad or incompatible input (participant count, missing parameter, limits)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unknown tournament type or stage engine
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A result was already recorded for this match
    #[error("Match {0} is already resolved")]
    AlreadyResolved(MatchId),

    /// A measurement was already recorded for this leaderboard entrant
    #[error("Measurement for participant {0} is already recorded")]
    MeasurementRecorded(ParticipantId),

    /// The generated graph disagrees with its closed-form counts
    #[error("Internal invariant violated: {0}")]
    InternalInvariant(String),

    /// No match with this id exists in the bracket
    #[error("Match {0} not found")]
    MatchNotFound(MatchId),

    /// One or both slots of the match are still unresolved
    #[error("Match {0} is not ready: both participants must be known")]
    MatchNotReady(MatchId),

    /// The match cannot move to the requested state
    #[error("Match {match_id} cannot transition from {status}")]
    InvalidTransition { match_id: MatchId, status: String },

    /// The reported result is inconsistent with the match
    #[error("Invalid result: {0}")]
    InvalidResult(String),

    /// Participant is not part of this bracket
    #[error("Participant {0} not found")]
    UnknownParticipant(ParticipantId),

    /// Predictor is not on the prediction roster
    #[error("Predictor '{0}' not found")]
    UnknownPredictor(String),

    /// Picks are locked once a match has started
    #[error("Predictions for match {0} are locked")]
    PredictionLocked(MatchId),
}

impl BracketError {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        BracketError::Configuration(message.into())
    }

    /// Whether the error was caused by the caller's input rather than engine state
    pub fn is_client_error(&self) -> bool {
        !matches!(self, BracketError::InternalInvariant(_))
    }
}

/// Result type for bracket operations
pub type BracketResult<T> = Result<T, BracketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BracketError::config("March Madness requires exactly 68 participants");
        assert_eq!(
            err.to_string(),
            "Configuration error: March Madness requires exactly 68 participants"
        );

        let err = BracketError::AlreadyResolved(MatchId(7));
        assert_eq!(err.to_string(), "Match 7 is already resolved");
    }

    #[test]
    fn test_internal_invariant_is_not_client_error() {
        assert!(!BracketError::InternalInvariant("count".into()).is_client_error());
        assert!(BracketError::UnsupportedFormat("x".into()).is_client_error());
    }
}
