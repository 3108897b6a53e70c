//! The routing read path.
//!
//! Local delivery is exact (wildcard matching against the authoritative
//! table); remote fan-out is candidate selection over the replicated
//! signatures. Routing never fails: if the store cannot be read the
//! decision degrades to local-only, which keeps local delivery intact.

use crate::domain::SubscriptionTable;
use crate::metrics::MetricsRecorder;
use crate::ports::{RouteDecision, RoutingApi};
use crate::DirectoryStore;
use async_trait::async_trait;
use shared_types::TopicPath;
use std::sync::{Arc, RwLock};
use tracing::warn;
use twin_replication::ReadConsistency;

/// Resolves published topics to local subscribers and remote candidates.
pub struct SubscriptionRouter {
    table: Arc<RwLock<SubscriptionTable>>,
    store: Arc<DirectoryStore>,
    read_consistency: ReadConsistency,
    metrics: Arc<dyn MetricsRecorder>,
}

impl SubscriptionRouter {
    pub fn new(
        table: Arc<RwLock<SubscriptionTable>>,
        store: Arc<DirectoryStore>,
        read_consistency: ReadConsistency,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Self {
        Self {
            table,
            store,
            read_consistency,
            metrics,
        }
    }
}

#[async_trait]
impl RoutingApi for SubscriptionRouter {
    async fn route(&self, topic: &TopicPath) -> RouteDecision {
        let local_subscribers = self
            .table
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .matching_subscribers(topic);

        let remote_candidates = match self.store.get_all_shards(self.read_consistency).await {
            Ok(shards) => shards
                .into_iter()
                .flat_map(|(_, view)| view)
                .filter(|(owner, entry)| {
                    owner != self.store.origin() && entry.value.signature.may_match(topic)
                })
                .map(|(owner, _)| owner)
                .collect(),
            Err(err) => {
                warn!(error = %err, topic = %topic, "Store read failed, routing local-only");
                Vec::new()
            }
        };

        self.metrics.record_route(remote_candidates.len() as u64);
        RouteDecision {
            local_subscribers,
            remote_candidates,
        }
    }
}
