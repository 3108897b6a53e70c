//! Cluster membership entities.
//!
//! Membership detection itself lives in the cluster substrate; the
//! directory only consumes a stream of status events and keeps a
//! read-only snapshot of the members currently reported `up`.

use crate::entities::NodeAddress;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Reported status of a cluster member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipStatus {
    /// Member is up and participating.
    Up,
    /// Member left or was removed.
    Down,
    /// Member is temporarily unreachable; not yet removed.
    Unreachable,
}

/// One event from the external membership feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEvent {
    pub address: NodeAddress,
    pub status: MembershipStatus,
}

impl MembershipEvent {
    pub fn up(address: NodeAddress) -> Self {
        Self {
            address,
            status: MembershipStatus::Up,
        }
    }

    pub fn down(address: NodeAddress) -> Self {
        Self {
            address,
            status: MembershipStatus::Down,
        }
    }
}

/// The set of members currently reported `up`.
///
/// Liveness comes solely from this snapshot. Unreachable members are
/// treated as live so that a transient partition never causes their
/// directory entries to be pruned.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipSnapshot {
    members: BTreeSet<NodeAddress>,
}

impl MembershipSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(members: impl IntoIterator<Item = NodeAddress>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }

    pub fn contains(&self, address: &NodeAddress) -> bool {
        self.members.contains(address)
    }

    pub fn members(&self) -> impl Iterator<Item = &NodeAddress> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Fold one feed event into the snapshot. Returns true if the set of
    /// live members changed.
    pub fn apply(&mut self, event: &MembershipEvent) -> bool {
        match event.status {
            MembershipStatus::Up => self.members.insert(event.address.clone()),
            MembershipStatus::Down => self.members.remove(&event.address),
            // Unreachable members stay live until the substrate removes them.
            MembershipStatus::Unreachable => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(name: &str) -> NodeAddress {
        NodeAddress::new(name)
    }

    #[test]
    fn test_apply_up_and_down() {
        let mut snapshot = MembershipSnapshot::new();
        assert!(snapshot.apply(&MembershipEvent::up(addr("a"))));
        assert!(snapshot.contains(&addr("a")));

        assert!(snapshot.apply(&MembershipEvent::down(addr("a"))));
        assert!(!snapshot.contains(&addr("a")));
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut snapshot = MembershipSnapshot::new();
        assert!(snapshot.apply(&MembershipEvent::up(addr("a"))));
        assert!(!snapshot.apply(&MembershipEvent::up(addr("a"))));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_unreachable_member_stays_live() {
        let mut snapshot = MembershipSnapshot::of([addr("a"), addr("b")]);
        let changed = snapshot.apply(&MembershipEvent {
            address: addr("a"),
            status: MembershipStatus::Unreachable,
        });
        assert!(!changed);
        assert!(snapshot.contains(&addr("a")));
    }
}
