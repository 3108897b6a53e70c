//! Read and write consistency levels.
//!
//! Consistency trades latency against staleness: a local write returns as
//! soon as the delta is applied to the local shard map, while stricter
//! levels suspend the caller until enough peers acknowledge the delta or
//! the write timeout elapses.

use serde::{Deserialize, Serialize};

/// How many peers must acknowledge a write before it returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteConsistency {
    /// Apply locally and hand the delta to background gossip. Never blocks
    /// on network I/O and never fails for replication reasons.
    #[default]
    Local,
    /// Wait until a majority of the cluster (local replica included) holds
    /// the write.
    Majority,
    /// Wait until every known peer acknowledged the write.
    All,
}

impl WriteConsistency {
    /// Remote acknowledgements required for a cluster with `peer_count`
    /// peers (self excluded).
    pub fn required_acks(self, peer_count: usize) -> usize {
        match self {
            WriteConsistency::Local => 0,
            // Majority of peer_count + 1 members, minus the local replica.
            WriteConsistency::Majority => (peer_count + 1) / 2,
            WriteConsistency::All => peer_count,
        }
    }
}

/// How fresh a read of the merged view must be.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadConsistency {
    /// Locally merged view; never touches the network.
    #[default]
    Local,
    /// Request a read-repair round before answering. Substrate-dependent;
    /// the in-memory bus applies deltas synchronously, so this degrades to
    /// the local view in-process.
    Majority,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_requires_no_acks() {
        assert_eq!(WriteConsistency::Local.required_acks(0), 0);
        assert_eq!(WriteConsistency::Local.required_acks(10), 0);
    }

    #[test]
    fn test_majority_counts_local_replica() {
        // 3-node cluster: 2 peers, majority is 2 members, 1 remote ack.
        assert_eq!(WriteConsistency::Majority.required_acks(2), 1);
        // 5-node cluster: 4 peers, majority is 3 members, 2 remote acks.
        assert_eq!(WriteConsistency::Majority.required_acks(4), 2);
        // Single node: majority is satisfied locally.
        assert_eq!(WriteConsistency::Majority.required_acks(0), 0);
    }

    #[test]
    fn test_all_requires_every_peer() {
        assert_eq!(WriteConsistency::All.required_acks(3), 3);
    }
}
