//! Delta dissemination substrate.
//!
//! The store hands every local mutation to a [`DeltaReplicator`]; how the
//! delta reaches the other replicas is the substrate's business. The
//! in-process [`InMemoryGossipBus`] is the implementation used by local
//! deployments and the test suite; distributed deployments provide a
//! transport-backed replicator instead.

use crate::error::ReplicationError;
use crate::record::EntryRecord;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared_types::{NodeAddress, ShardId};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// One replicated mutation of a `(shard, owner)` slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaDelta<T> {
    /// Correlation id for tracing a delta across nodes.
    pub id: Uuid,
    /// Node that produced the delta.
    pub origin: NodeAddress,
    pub shard: ShardId,
    pub owner: NodeAddress,
    pub record: EntryRecord<T>,
}

impl<T: Serialize> ReplicaDelta<T> {
    /// Compact wire encoding for transport-backed replicators.
    pub fn to_bytes(&self) -> Result<Vec<u8>, String> {
        bincode::serialize(self).map_err(|e| e.to_string())
    }
}

impl<T: DeserializeOwned> ReplicaDelta<T> {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        bincode::deserialize(bytes).map_err(|e| e.to_string())
    }
}

/// Dissemination port of the replicated store (driven side).
#[async_trait]
pub trait DeltaReplicator<T>: Send + Sync {
    /// Hand a delta to the substrate.
    ///
    /// Returns the number of *peer* replicas that acknowledged receipt.
    /// The caller decides whether that satisfies its consistency level.
    async fn disseminate(&self, delta: ReplicaDelta<T>) -> Result<usize, ReplicationError>;

    /// Number of peer replicas currently reachable (self excluded).
    fn peer_count(&self) -> usize;
}

/// Replicator for a store with no peers. Every write is purely local.
#[derive(Default)]
pub struct LocalOnlyReplicator;

#[async_trait]
impl<T: Send + 'static> DeltaReplicator<T> for LocalOnlyReplicator {
    async fn disseminate(&self, delta: ReplicaDelta<T>) -> Result<usize, ReplicationError> {
        debug!(delta = %delta.id, owner = %delta.owner, "No peers, delta kept local");
        Ok(0)
    }

    fn peer_count(&self) -> usize {
        0
    }
}

/// In-memory gossip bus connecting stores within one process.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer
/// semantics: every attached store runs an apply loop on its own receiver.
/// Delivery is synchronous with the send, so the receiver count doubles
/// as the acknowledgement count.
pub struct InMemoryGossipBus<T> {
    sender: broadcast::Sender<ReplicaDelta<T>>,
}

impl<T: Clone + Send + Sync + 'static> InMemoryGossipBus<T> {
    pub fn new() -> Self {
        Self::with_capacity(crate::DEFAULT_GOSSIP_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Attach a store to the bus: spawns its apply loop and returns the
    /// task handle. The loop skips deltas the store produced itself (its
    /// local apply already happened) and survives lag by dropping old
    /// deltas, which is safe because merges are idempotent and each put
    /// carries the owner's full state.
    pub fn attach(&self, store: Arc<crate::ReplicatedStore<T>>) -> JoinHandle<()> {
        let mut receiver = self.sender.subscribe();
        tokio::spawn(async move {
            loop {
                let delta = match receiver.recv().await {
                    Ok(delta) => delta,
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        debug!(lagged = count, "Apply loop lagged, deltas dropped");
                        continue;
                    }
                };

                if delta.origin == *store.origin() {
                    continue;
                }

                if let Err(err) = store.apply_delta(&delta) {
                    // Only a shard count mismatch can land here.
                    warn!(delta = %delta.id, error = %err, "Rejected replicated delta");
                }
            }
        })
    }

    /// Number of attached apply loops.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for InMemoryGossipBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> DeltaReplicator<T> for InMemoryGossipBus<T> {
    async fn disseminate(&self, delta: ReplicaDelta<T>) -> Result<usize, ReplicationError> {
        match self.sender.send(delta) {
            // One receiver is the origin's own apply loop.
            Ok(receivers) => Ok(receivers.saturating_sub(1)),
            Err(err) => {
                warn!(error = %err, "Delta dropped (no attached stores)");
                Err(ReplicationError::ChannelClosed)
            }
        }
    }

    fn peer_count(&self) -> usize {
        self.sender.receiver_count().saturating_sub(1)
    }
}
