//! Repository host error types

use std::time::Duration;

use thiserror::Error;

/// Errors returned by a [`RepositoryHost`](super::RepositoryHost)
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Repository host unavailable: {0}")]
    Unavailable(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl RepoError {
    /// Whether the same call may succeed on a later cycle
    pub fn is_retryable(&self) -> bool {
        match self {
            RepoError::Unavailable(_) => false,
            RepoError::Api { status, .. } => *status == 429 || *status >= 500,
            RepoError::Network(_) => true,
            RepoError::Timeout(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(RepoError::Timeout(Duration::from_secs(15)).is_retryable());
        assert!(
            RepoError::Api {
                status: 502,
                message: "bad gateway".to_string()
            }
            .is_retryable()
        );
        assert!(
            !RepoError::Api {
                status: 422,
                message: "name already exists".to_string()
            }
            .is_retryable()
        );
        assert!(!RepoError::Unavailable("no token".to_string()).is_retryable());
    }
}
