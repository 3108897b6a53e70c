//! Membership feed tracker.
//!
//! Folds the event stream from the cluster substrate into a shared
//! snapshot the reconciler reads. A member going down nudges the
//! reconciler immediately instead of waiting for the next interval tick.

use shared_types::{MembershipEvent, MembershipSnapshot, MembershipStatus};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Task folding membership events into a watchable snapshot.
pub struct MembershipTracker;

impl MembershipTracker {
    /// Spawn the tracker. Returns the snapshot receiver handed to the
    /// reconciler and the task handle; the task ends when the feed closes.
    pub fn spawn(
        initial: MembershipSnapshot,
        mut feed: mpsc::Receiver<MembershipEvent>,
        sync_nudge: mpsc::Sender<()>,
    ) -> (watch::Receiver<MembershipSnapshot>, JoinHandle<()>) {
        let (snapshot_tx, snapshot_rx) = watch::channel(initial.clone());

        let join = tokio::spawn(async move {
            let mut snapshot = initial;
            while let Some(event) = feed.recv().await {
                let changed = snapshot.apply(&event);
                if !changed {
                    continue;
                }
                info!(
                    member = %event.address,
                    status = ?event.status,
                    members = snapshot.len(),
                    "Membership changed"
                );
                if snapshot_tx.send(snapshot.clone()).is_err() {
                    debug!("No snapshot readers left, tracker stopping");
                    break;
                }
                if event.status == MembershipStatus::Down {
                    // Prune promptly; a full queue means a sync is already due.
                    let _ = sync_nudge.try_send(());
                }
            }
        });

        (snapshot_rx, join)
    }
}
