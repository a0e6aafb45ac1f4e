//! Coordinator error taxonomy

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the coordinator
///
/// Collaborator and persistence failures are absorbed where they happen and
/// turned into status or log signals. Only `CycleFailure` marks a running
/// cycle as failed.
#[derive(Debug, Error)]
pub enum CoordError {
    #[error("{collaborator} unavailable: {reason}")]
    CollaboratorUnavailable { collaborator: String, reason: String },

    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] StoreError),

    #[error("Cycle {sequence} failed: {reason}")]
    CycleFailure { sequence: u64, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CoordError {
    pub fn unavailable(collaborator: impl Into<String>, reason: impl ToString) -> Self {
        Self::CollaboratorUnavailable {
            collaborator: collaborator.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error ends the cycle it occurred in
    pub fn is_fatal_to_cycle(&self) -> bool {
        matches!(self, CoordError::CycleFailure { .. })
    }
}

pub type Result<T> = std::result::Result<T, CoordError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_cycle_failure_is_fatal() {
        assert!(
            CoordError::CycleFailure {
                sequence: 1,
                reason: "boom".to_string()
            }
            .is_fatal_to_cycle()
        );
        assert!(!CoordError::unavailable("github", "timeout").is_fatal_to_cycle());
        assert!(!CoordError::PersistenceFailure(StoreError::Rejected("full".to_string())).is_fatal_to_cycle());
        assert!(!CoordError::Config("bad".to_string()).is_fatal_to_cycle());
    }

    #[test]
    fn test_display() {
        let err = CoordError::unavailable("hub", "connection refused");
        assert_eq!(err.to_string(), "hub unavailable: connection refused");

        let err = CoordError::CycleFailure {
            sequence: 9,
            reason: "panic".to_string(),
        };
        assert_eq!(err.to_string(), "Cycle 9 failed: panic");
    }

    #[test]
    fn test_from_store_error() {
        let err: CoordError = StoreError::NotFound("opp-1".to_string()).into();
        assert!(matches!(err, CoordError::PersistenceFailure(_)));
    }
}
