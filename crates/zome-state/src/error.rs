//! Error types for zome-state

use thiserror::Error;

/// Errors produced by an [`EntryStore`](crate::EntryStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// No entry is stored at the given address
    #[error("Entry not found: {address}")]
    NotFound { address: String },

    /// The string is not a well-formed content address
    #[error("Invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Entry content could not be encoded or decoded
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
