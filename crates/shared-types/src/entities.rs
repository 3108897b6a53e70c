//! Core cluster entities shared by all directory subsystems.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a shard of the replicated directory.
///
/// Always in `[0, shard_count)`; the shard count is fixed cluster-wide.
pub type ShardId = u16;

/// Address of a cluster member.
///
/// The canonical string form (e.g. `"twin-node-3:2552"`) is what gets
/// hashed for shard assignment and what the membership feed reports, so
/// two nodes must never disagree on the rendering of the same member.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeAddress(String);

impl NodeAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Canonical string form, stable across restarts of the same node.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Byte view used for shard hashing.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Reference to a local event recipient.
///
/// Owned by the node that created it. A `SubscriberRef` is never
/// replicated on its own; it only travels inside its owner's directory
/// entry so that remote nodes can address a delivery attempt.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriberRef {
    /// Node that owns the subscriber.
    pub node: NodeAddress,
    /// Local handle, unique within the owning node.
    pub handle: String,
}

impl SubscriberRef {
    pub fn new(node: NodeAddress, handle: impl Into<String>) -> Self {
        Self {
            node,
            handle: handle.into(),
        }
    }
}

impl fmt::Display for SubscriberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.node, self.handle)
    }
}
