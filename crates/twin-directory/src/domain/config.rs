//! Directory configuration.
//!
//! All replicas must run with the same `shard_count` and signature
//! parameters; the remaining knobs are per-node tuning.

use crate::domain::signature::SignatureParams;
use crate::error::DirectoryError;
use std::time::Duration;
use twin_replication::{ReadConsistency, WriteConsistency};

/// Configuration for one directory node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryConfig {
    /// Shards in the replicated entry map. Cluster-wide constant.
    pub shard_count: u16,
    /// Signature width and hash count. Cluster-wide constant.
    pub signature: SignatureParams,
    /// How long the coordinator absorbs further local changes before
    /// flushing one replicated put.
    pub debounce_window: Duration,
    /// Consistency level for coordinator flushes.
    pub write_consistency: WriteConsistency,
    /// Consistency level for routing reads.
    pub read_consistency: ReadConsistency,
    /// Upper bound on waiting for write acknowledgements.
    pub write_timeout: Duration,
    /// Period of the anti-entropy reconciliation loop.
    pub reconcile_interval: Duration,
    /// Depth of the coordinator command queue.
    pub command_queue_depth: usize,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            shard_count: 8,
            signature: SignatureParams::default(),
            debounce_window: Duration::from_millis(100),
            write_consistency: WriteConsistency::Local,
            read_consistency: ReadConsistency::Local,
            write_timeout: Duration::from_secs(5),
            reconcile_interval: Duration::from_secs(10),
            command_queue_depth: 64,
        }
    }
}

impl DirectoryConfig {
    pub fn builder() -> DirectoryConfigBuilder {
        DirectoryConfigBuilder::default()
    }

    /// Reject configurations that cannot work at runtime.
    pub fn validate(&self) -> Result<(), DirectoryError> {
        if self.shard_count == 0 {
            return Err(DirectoryError::InvalidConfig(
                "shard_count must be at least 1".to_string(),
            ));
        }
        if self.signature.width_bits == 0 || self.signature.width_bits % 8 != 0 {
            return Err(DirectoryError::InvalidConfig(format!(
                "signature width_bits must be a positive multiple of 8, got {}",
                self.signature.width_bits
            )));
        }
        if self.signature.hash_count == 0 {
            return Err(DirectoryError::InvalidConfig(
                "signature hash_count must be at least 1".to_string(),
            ));
        }
        if self.debounce_window.is_zero() {
            return Err(DirectoryError::InvalidConfig(
                "debounce_window must be non-zero".to_string(),
            ));
        }
        if self.command_queue_depth == 0 {
            return Err(DirectoryError::InvalidConfig(
                "command_queue_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`DirectoryConfig`].
#[derive(Clone, Debug, Default)]
pub struct DirectoryConfigBuilder {
    config: DirectoryConfig,
}

impl DirectoryConfigBuilder {
    pub fn shard_count(mut self, shard_count: u16) -> Self {
        self.config.shard_count = shard_count;
        self
    }

    pub fn signature(mut self, params: SignatureParams) -> Self {
        self.config.signature = params;
        self
    }

    pub fn debounce_window(mut self, window: Duration) -> Self {
        self.config.debounce_window = window;
        self
    }

    pub fn write_consistency(mut self, consistency: WriteConsistency) -> Self {
        self.config.write_consistency = consistency;
        self
    }

    pub fn read_consistency(mut self, consistency: ReadConsistency) -> Self {
        self.config.read_consistency = consistency;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    pub fn reconcile_interval(mut self, interval: Duration) -> Self {
        self.config.reconcile_interval = interval;
        self
    }

    pub fn command_queue_depth(mut self, depth: usize) -> Self {
        self.config.command_queue_depth = depth;
        self
    }

    pub fn build(self) -> Result<DirectoryConfig, DirectoryError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
