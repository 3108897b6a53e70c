//! Deterministic shard assignment for owner addresses.
//!
//! Every node must map the same owner to the same shard without
//! coordination, so the function is pure over (address, shard_count).
//! Shards here partition the replicated entry map for lock granularity
//! and incremental dissemination; they carry no placement semantics.

use crate::domain::hash_positions::murmur_hash;
use shared_types::{NodeAddress, ShardId};

/// Map an owner address to its shard.
pub fn shard_of(owner: &NodeAddress, shard_count: u16) -> ShardId {
    if shard_count == 0 {
        return 0;
    }
    (murmur_hash(owner.as_str(), 0) % shard_count as u64) as ShardId
}
