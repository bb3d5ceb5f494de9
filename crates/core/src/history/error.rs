//! Error types for the run history store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while importing or persisting run history.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// The document parsed but is not shaped like an export.
    #[error("Invalid format: expected {{ \"runs\": [...] }}")]
    InvalidFormat,

    /// The document is not valid JSON.
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The persistence backend failed to read or write.
    #[error("History storage failed at {path}: {reason}")]
    Storage { path: PathBuf, reason: String },
}

impl HistoryError {
    pub(crate) fn storage(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        HistoryError::Storage {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Type alias for Result with HistoryError.
pub type HistoryResult<T> = Result<T, HistoryError>;
