//! # Twin Replication - Replicated Subscription Store
//!
//! Conflict-free replicated map from shard to per-owner directory records,
//! shared by every node of the cluster.
//!
//! ## Model
//!
//! Each `(shard, owner)` slot holds an [`EntryRecord`]: either a live value
//! with the owner's **generation counter**, or a tombstone. The merge
//! function is commutative, associative, and idempotent, so replicas
//! converge regardless of delivery order:
//!
//! - higher generation wins, whatever the record kinds;
//! - on equal generations a tombstone dominates a live record;
//! - a strictly newer put from the true owner always revives the entry
//!   (anti-resurrection rule).
//!
//! Only the owning node issues normal writes for its own slot; removal of
//! *another* node's entry goes through [`ReplicatedStore::remove_address`],
//! which tombstones at the highest generation observed locally.
//!
//! ## Substrate
//!
//! Dissemination is delegated to a [`DeltaReplicator`]. The in-process
//! [`InMemoryGossipBus`] fans deltas out over a `tokio::sync::broadcast`
//! channel to every attached store; distributed deployments plug in a
//! transport-backed replicator instead.

pub mod consistency;
pub mod error;
pub mod record;
pub mod replicator;
pub mod store;

pub use consistency::{ReadConsistency, WriteConsistency};
pub use error::{ReplicationError, StoreError};
pub use record::{merge_maps, merge_record, EntryMap, EntryRecord, Versioned};
pub use replicator::{DeltaReplicator, InMemoryGossipBus, LocalOnlyReplicator, ReplicaDelta};
pub use store::{ReplicatedStore, ShardView};

/// Maximum deltas buffered per attached store before backpressure.
pub const DEFAULT_GOSSIP_CAPACITY: usize = 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_gossip_capacity() {
        assert_eq!(DEFAULT_GOSSIP_CAPACITY, 1024);
    }
}
