//! Storage error types

use thiserror::Error;

/// Errors returned by a [`Store`](super::Store)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage rejected the write: {0}")]
    Rejected(String),
}

impl StoreError {
    /// Whether retrying the same operation later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Io(_) | StoreError::Rejected(_))
    }
}
