//! Storage-specific error type.

use std::path::PathBuf;

use roomwatch_domain::error::RoomwatchError;

/// Errors originating from the JSON-lines storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Creating, opening or writing a file failed.
    #[error("failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The record could not be serialised.
    #[error("JSON serialisation error")]
    Json(#[from] serde_json::Error),
}

impl From<StorageError> for RoomwatchError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
