//! Error types for the subscription directory.

use shared_types::TopicParseError;
use thiserror::Error;
use twin_replication::StoreError;

/// Errors surfaced by the directory subsystem.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// The replicated store reported a failure. Retryable unless the
    /// underlying error is a shard key mismatch.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A topic path or filter failed to parse.
    #[error("Invalid topic: {0}")]
    InvalidTopic(#[from] TopicParseError),

    /// Rejected configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The update coordinator task is no longer running.
    #[error("Update coordinator shut down")]
    CoordinatorShutdown,
}

impl DirectoryError {
    /// True if retrying the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            DirectoryError::Store(err) => err.is_retryable(),
            DirectoryError::CoordinatorShutdown => false,
            DirectoryError::InvalidTopic(_) | DirectoryError::InvalidConfig(_) => false,
        }
    }
}
