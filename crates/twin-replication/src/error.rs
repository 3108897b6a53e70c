//! Error types for the replicated store.

use shared_types::ShardId;
use thiserror::Error;

/// Errors surfaced by [`crate::ReplicatedStore`] operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The requested consistency level was not reached in time. Retryable;
    /// the local write has already been applied.
    #[error("Replication timeout: {acked} of {required} required acknowledgements")]
    ReplicationTimeout { required: usize, acked: usize },

    /// The replication backend failed transiently. Retryable with backoff.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Shard index outside `[0, shard_count)`. Fatal: indicates a shard
    /// count mismatch between cluster members.
    #[error("Invalid shard key: shard {shard} >= shard count {shard_count}")]
    InvalidShardKey { shard: ShardId, shard_count: u16 },
}

impl StoreError {
    /// True for errors the caller may retry; `InvalidShardKey` is a
    /// configuration error and never retryable.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, StoreError::InvalidShardKey { .. })
    }
}

/// Errors from the dissemination substrate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReplicationError {
    /// The gossip channel is closed; no peer can receive deltas.
    #[error("Replication channel closed")]
    ChannelClosed,
}

impl From<ReplicationError> for StoreError {
    fn from(err: ReplicationError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}
