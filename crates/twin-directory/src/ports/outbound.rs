//! Driven ports: what the directory requires from its environment.

use shared_types::MembershipSnapshot;

/// Source of the current cluster membership view.
///
/// The reconciler compares the set of owners present in the replicated
/// store against this view and prunes owners that are no longer members.
pub trait MembershipProvider: Send + Sync {
    /// The membership view as currently known. May lag reality; the
    /// reconciler tolerates staleness because pruning re-runs every
    /// interval.
    fn snapshot(&self) -> MembershipSnapshot;
}

impl MembershipProvider for tokio::sync::watch::Receiver<MembershipSnapshot> {
    fn snapshot(&self) -> MembershipSnapshot {
        self.borrow().clone()
    }
}
