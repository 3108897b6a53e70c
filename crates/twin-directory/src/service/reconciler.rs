//! Anti-entropy reconciliation.
//!
//! A periodic loop compares the owners present in the replicated store
//! against the cluster membership view and tombstones owners that are no
//! longer members, so entries of crashed nodes do not route traffic
//! forever. Pruning is idempotent and may run concurrently on several
//! nodes; the tombstone merge rules make the duplicates harmless.

use crate::domain::shard_of;
use crate::metrics::MetricsRecorder;
use crate::ports::MembershipProvider;
use crate::DirectoryStore;
use shared_types::{MembershipSnapshot, NodeAddress};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use twin_replication::{StoreError, WriteConsistency};

/// Outcome of one reconciliation cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Live owners seen in the store before pruning.
    pub live_owners: usize,
    /// Owners tombstoned this cycle.
    pub pruned: Vec<NodeAddress>,
}

/// One reconciliation cycle against an explicit membership view.
///
/// The local node is implicitly a member: its own entry is never pruned
/// here, whatever the snapshot says (the feed may simply not mention us
/// yet). An empty snapshot means the membership substrate has not
/// reported anything; pruning everyone on no information would be wrong,
/// so the cycle is skipped.
pub async fn sync_once(
    store: &DirectoryStore,
    membership: &MembershipSnapshot,
    metrics: &dyn MetricsRecorder,
) -> Result<ReconcileReport, StoreError> {
    if membership.is_empty() {
        debug!("Membership view empty, reconciliation skipped");
        return Ok(ReconcileReport::default());
    }

    let owners = store.live_owners()?;
    let live_owners = owners.len();
    let mut pruned = Vec::new();

    for owner in owners {
        if owner == *store.origin() || membership.contains(&owner) {
            continue;
        }
        let shard = shard_of(&owner, store.shard_count());
        store
            .remove_address(shard, owner.clone(), WriteConsistency::Local)
            .await?;
        metrics.record_removal();
        info!(owner = %owner, "Pruned departed owner");
        pruned.push(owner);
    }

    metrics.record_sync_cycle(pruned.len() as u64);
    Ok(ReconcileReport { live_owners, pruned })
}

/// The periodic reconciliation task.
pub struct Reconciler {
    store: Arc<DirectoryStore>,
    membership: watch::Receiver<MembershipSnapshot>,
    trigger: mpsc::Receiver<()>,
    interval: Duration,
    metrics: Arc<dyn MetricsRecorder>,
}

impl Reconciler {
    pub fn spawn(
        store: Arc<DirectoryStore>,
        membership: watch::Receiver<MembershipSnapshot>,
        trigger: mpsc::Receiver<()>,
        interval: Duration,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> JoinHandle<()> {
        let reconciler = Self {
            store,
            membership,
            trigger,
            interval,
            metrics,
        };
        tokio::spawn(reconciler.run())
    }

    /// Idle between cycles; a cycle starts on the interval tick, on an
    /// explicit trigger, or when the membership view changes. A failed
    /// cycle is abandoned and retried at the next occasion.
    async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                nudge = self.trigger.recv() => {
                    if nudge.is_none() {
                        debug!("Trigger channel closed, reconciler stopping");
                        break;
                    }
                }
                changed = self.membership.changed() => {
                    if changed.is_err() {
                        debug!("Membership feed closed, reconciler stopping");
                        break;
                    }
                }
            }

            let snapshot = MembershipProvider::snapshot(&self.membership);
            match sync_once(&self.store, &snapshot, self.metrics.as_ref()).await {
                Ok(report) if report.pruned.is_empty() => {
                    debug!(live_owners = report.live_owners, "Reconciliation clean");
                }
                Ok(report) => {
                    info!(
                        live_owners = report.live_owners,
                        pruned = report.pruned.len(),
                        "Reconciliation pruned stale owners"
                    );
                }
                Err(err) => {
                    warn!(error = %err, "Reconciliation cycle abandoned");
                    self.metrics.record_sync_failure();
                }
            }
        }
    }
}
