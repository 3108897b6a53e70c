//! The sharded replicated store.
//!
//! One instance lives on every node. Writes are applied to the local
//! shard maps first (immediately visible to local reads) and then handed
//! to the [`DeltaReplicator`]; remote visibility is asynchronous and
//! bounded by the caller's [`WriteConsistency`].
//!
//! The store never enforces ownership: the Local Update Coordinator is
//! the only component issuing `put`s, and only for its own address.
//! `remove_address` is the one exception to single-writer: any node may
//! tombstone a departed owner, and doing so concurrently from several
//! nodes is idempotent.

use crate::consistency::{ReadConsistency, WriteConsistency};
use crate::error::StoreError;
use crate::record::{merge_record, EntryMap, EntryRecord, Versioned};
use crate::replicator::{DeltaReplicator, ReplicaDelta};
use serde_json::json;
use shared_types::{NodeAddress, ShardId};
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

/// Live entries of one shard, tombstones filtered out.
pub type ShardView<T> = BTreeMap<NodeAddress, Versioned<T>>;

/// Replicated map from shard to per-owner entry records.
pub struct ReplicatedStore<T> {
    origin: NodeAddress,
    shard_count: u16,
    shards: Vec<RwLock<EntryMap<T>>>,
    replicator: Arc<dyn DeltaReplicator<T>>,
    write_timeout: Duration,
}

impl<T> ReplicatedStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a store for `origin` with `shard_count` shards.
    ///
    /// The shard count must match on every cluster member; it is part of
    /// the replicated key space and cannot change at runtime.
    pub fn new(
        origin: NodeAddress,
        shard_count: u16,
        replicator: Arc<dyn DeltaReplicator<T>>,
        write_timeout: Duration,
    ) -> Result<Self, StoreError> {
        if shard_count == 0 {
            return Err(StoreError::InvalidShardKey {
                shard: 0,
                shard_count: 0,
            });
        }
        let shards = (0..shard_count).map(|_| RwLock::new(BTreeMap::new())).collect();
        Ok(Self {
            origin,
            shard_count,
            shards,
            replicator,
            write_timeout,
        })
    }

    pub fn origin(&self) -> &NodeAddress {
        &self.origin
    }

    pub fn shard_count(&self) -> u16 {
        self.shard_count
    }

    fn shard_map(&self, shard: ShardId) -> Result<&RwLock<EntryMap<T>>, StoreError> {
        self.shards
            .get(shard as usize)
            .ok_or(StoreError::InvalidShardKey {
                shard,
                shard_count: self.shard_count,
            })
    }

    /// Merge one record into its shard slot. Used for both local writes
    /// and deltas arriving from peers.
    pub fn apply_delta(&self, delta: &ReplicaDelta<T>) -> Result<(), StoreError> {
        self.apply_record(delta.shard, &delta.owner, &delta.record)
    }

    fn apply_record(
        &self,
        shard: ShardId,
        owner: &NodeAddress,
        record: &EntryRecord<T>,
    ) -> Result<(), StoreError> {
        let mut map = self
            .shard_map(shard)?
            .write()
            .map_err(|_| StoreError::Unavailable("shard lock poisoned".to_string()))?;
        let merged = match map.get(owner) {
            Some(existing) => merge_record(existing, record),
            None => record.clone(),
        };
        map.insert(owner.clone(), merged);
        Ok(())
    }

    /// Insert or overwrite the entry for `owner` in `shard`.
    ///
    /// The write is visible to local reads before this returns. Under
    /// `WriteConsistency::Local` dissemination is fire-and-forget; under
    /// stricter levels the call suspends until enough peers acknowledged
    /// or the write timeout elapsed (`ReplicationTimeout`, retryable;
    /// the local apply is not rolled back).
    pub async fn put(
        &self,
        shard: ShardId,
        owner: NodeAddress,
        entry: Versioned<T>,
        consistency: WriteConsistency,
    ) -> Result<(), StoreError> {
        let record = EntryRecord::Live(entry);
        self.apply_record(shard, &owner, &record)?;
        self.disseminate(shard, owner, record, consistency).await
    }

    /// Tombstone the entry owned by `owner` in `shard`.
    ///
    /// Idempotent: removing an absent or already-tombstoned owner is a
    /// no-op success. The tombstone carries the highest generation
    /// observed locally, so it suppresses every put it has seen while a
    /// strictly newer put from the true owner still revives the slot.
    pub async fn remove_address(
        &self,
        shard: ShardId,
        owner: NodeAddress,
        consistency: WriteConsistency,
    ) -> Result<(), StoreError> {
        let record = {
            let mut map = self
                .shard_map(shard)?
                .write()
                .map_err(|_| StoreError::Unavailable("shard lock poisoned".to_string()))?;
            match map.get(&owner) {
                Some(EntryRecord::Live(v)) => {
                    let tombstone = EntryRecord::Tombstone {
                        generation: v.generation,
                    };
                    map.insert(owner.clone(), tombstone.clone());
                    tombstone
                }
                Some(EntryRecord::Tombstone { .. }) | None => {
                    debug!(shard, owner = %owner, "remove_address on absent owner, no-op");
                    return Ok(());
                }
            }
        };
        self.disseminate(shard, owner, record, consistency).await
    }

    async fn disseminate(
        &self,
        shard: ShardId,
        owner: NodeAddress,
        record: EntryRecord<T>,
        consistency: WriteConsistency,
    ) -> Result<(), StoreError> {
        let delta = ReplicaDelta {
            id: Uuid::new_v4(),
            origin: self.origin.clone(),
            shard,
            owner,
            record,
        };

        match consistency {
            WriteConsistency::Local => {
                // Fire-and-forget: failures here are absorbed by design,
                // background anti-entropy repairs the divergence.
                let replicator = Arc::clone(&self.replicator);
                tokio::spawn(async move {
                    if let Err(err) = replicator.disseminate(delta).await {
                        debug!(error = %err, "Local-consistency dissemination deferred to gossip");
                    }
                });
                Ok(())
            }
            WriteConsistency::Majority | WriteConsistency::All => {
                let required = consistency.required_acks(self.replicator.peer_count());
                let acked = match timeout(self.write_timeout, self.replicator.disseminate(delta))
                    .await
                {
                    Err(_) => {
                        return Err(StoreError::ReplicationTimeout { required, acked: 0 });
                    }
                    Ok(Err(err)) => return Err(err.into()),
                    Ok(Ok(acked)) => acked,
                };
                if acked < required {
                    warn!(required, acked, "Write under-acknowledged");
                    return Err(StoreError::ReplicationTimeout { required, acked });
                }
                Ok(())
            }
        }
    }

    /// The locally merged view of every shard, live entries only.
    ///
    /// `ReadConsistency::Majority` would force a read-repair round on a
    /// transport-backed substrate; the in-memory bus applies deltas
    /// synchronously, so both levels read the same local view here.
    pub async fn get_all_shards(
        &self,
        _consistency: ReadConsistency,
    ) -> Result<Vec<(ShardId, ShardView<T>)>, StoreError> {
        let mut result = Vec::with_capacity(self.shards.len());
        for (shard, map) in self.shards.iter().enumerate() {
            let map = map
                .read()
                .map_err(|_| StoreError::Unavailable("shard lock poisoned".to_string()))?;
            let view: ShardView<T> = map
                .iter()
                .filter_map(|(owner, record)| {
                    record.as_live().map(|v| (owner.clone(), v.clone()))
                })
                .collect();
            result.push((shard as ShardId, view));
        }
        Ok(result)
    }

    /// Highest generation observed for `owner` in `shard`, live or
    /// tombstoned. A restarting owner resumes its counter above this so
    /// its first write is not suppressed by its own old tombstone.
    pub fn generation_of(&self, shard: ShardId, owner: &NodeAddress) -> Result<Option<u64>, StoreError> {
        let map = self
            .shard_map(shard)?
            .read()
            .map_err(|_| StoreError::Unavailable("shard lock poisoned".to_string()))?;
        Ok(map.get(owner).map(EntryRecord::generation))
    }

    /// Distinct owner addresses with a live entry anywhere in the store.
    pub fn live_owners(&self) -> Result<BTreeSet<NodeAddress>, StoreError> {
        let mut owners = BTreeSet::new();
        for map in &self.shards {
            let map = map
                .read()
                .map_err(|_| StoreError::Unavailable("shard lock poisoned".to_string()))?;
            owners.extend(
                map.iter()
                    .filter(|(_, record)| record.is_live())
                    .map(|(owner, _)| owner.clone()),
            );
        }
        Ok(owners)
    }

    /// Operator diagnostics: per-shard owner generations and liveness.
    pub fn diagnostics(&self) -> serde_json::Value {
        let mut shards = serde_json::Map::new();
        for (shard, map) in self.shards.iter().enumerate() {
            let Ok(map) = map.read() else { continue };
            let owners: serde_json::Map<String, serde_json::Value> = map
                .iter()
                .map(|(owner, record)| {
                    (
                        owner.to_string(),
                        json!({
                            "generation": record.generation(),
                            "live": record.is_live(),
                        }),
                    )
                })
                .collect();
            shards.insert(shard.to_string(), serde_json::Value::Object(owners));
        }
        json!({
            "origin": self.origin.to_string(),
            "shard_count": self.shard_count,
            "shards": shards,
        })
    }
}
