//! The directory node facade.
//!
//! Wires one replicated store, the update coordinator, the membership
//! tracker, the reconciler and the router into a single handle. This is
//! the only type most embedders touch.

use crate::domain::{DirectoryConfig, SubscriptionTable};
use crate::error::DirectoryError;
use crate::metrics::{DirectoryMetrics, MetricsRecorder};
use crate::ports::{RouteDecision, RoutingApi, SubscriptionApi};
use crate::service::coordinator::{SubscriptionHandle, UpdateCoordinator};
use crate::service::membership::MembershipTracker;
use crate::service::reconciler::Reconciler;
use crate::service::router::SubscriptionRouter;
use crate::DirectoryStore;
use async_trait::async_trait;
use serde_json::json;
use shared_types::{MembershipEvent, MembershipSnapshot, NodeAddress, SubscriberRef, TopicFilter, TopicPath};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use twin_replication::{DeltaReplicator, ReplicatedStore};

use crate::domain::DirectoryEntry;

/// A running directory node.
pub struct DirectoryNode {
    store: Arc<DirectoryStore>,
    subscriptions: SubscriptionHandle,
    router: SubscriptionRouter,
    metrics: Arc<DirectoryMetrics>,
    sync_trigger: mpsc::Sender<()>,
    coordinator_join: JoinHandle<()>,
    tracker_join: JoinHandle<()>,
    reconciler_join: JoinHandle<()>,
}

impl DirectoryNode {
    /// Validate the configuration and start all directory tasks.
    ///
    /// The caller owns the dissemination substrate: with the in-process
    /// bus, attach the returned node's store (`bus.attach(node.store())`)
    /// so deltas from peers flow in.
    pub fn spawn(
        config: DirectoryConfig,
        origin: NodeAddress,
        replicator: Arc<dyn DeltaReplicator<DirectoryEntry>>,
        initial_membership: MembershipSnapshot,
        membership_feed: mpsc::Receiver<MembershipEvent>,
    ) -> Result<Self, DirectoryError> {
        config.validate()?;

        let store = Arc::new(ReplicatedStore::new(
            origin,
            config.shard_count,
            replicator,
            config.write_timeout,
        )?);
        let table = Arc::new(RwLock::new(SubscriptionTable::new()));
        let metrics = Arc::new(DirectoryMetrics::new());

        let (subscriptions, coordinator_join) = UpdateCoordinator::spawn(
            config.clone(),
            Arc::clone(&store),
            Arc::clone(&table),
            Arc::clone(&metrics) as Arc<dyn MetricsRecorder>,
        );

        let (sync_trigger, trigger_rx) = mpsc::channel(4);
        let (membership_rx, tracker_join) =
            MembershipTracker::spawn(initial_membership, membership_feed, sync_trigger.clone());
        let reconciler_join = Reconciler::spawn(
            Arc::clone(&store),
            membership_rx,
            trigger_rx,
            config.reconcile_interval,
            Arc::clone(&metrics) as Arc<dyn MetricsRecorder>,
        );

        let router = SubscriptionRouter::new(
            table,
            Arc::clone(&store),
            config.read_consistency,
            Arc::clone(&metrics) as Arc<dyn MetricsRecorder>,
        );

        Ok(Self {
            store,
            subscriptions,
            router,
            metrics,
            sync_trigger,
            coordinator_join,
            tracker_join,
            reconciler_join,
        })
    }

    /// The node's replicated store, for attaching to a gossip bus.
    pub fn store(&self) -> Arc<DirectoryStore> {
        Arc::clone(&self.store)
    }

    pub fn metrics(&self) -> Arc<DirectoryMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Request an immediate reconciliation cycle.
    pub fn sync_now(&self) {
        if self.sync_trigger.try_send(()).is_err() {
            debug!("Sync already pending");
        }
    }

    /// Operator diagnostics: store contents plus counter snapshot.
    pub fn diagnostics(&self) -> serde_json::Value {
        json!({
            "store": self.store.diagnostics(),
            "metrics": self.metrics.snapshot(),
        })
    }

    /// Graceful stop: retire this node's entry, then stop the background
    /// tasks.
    pub async fn shutdown(&self) -> Result<(), DirectoryError> {
        let result = self.subscriptions.shutdown().await;
        self.coordinator_join.abort();
        self.tracker_join.abort();
        self.reconciler_join.abort();
        result
    }
}

#[async_trait]
impl SubscriptionApi for DirectoryNode {
    async fn subscribe(
        &self,
        subscriber: SubscriberRef,
        filters: Vec<TopicFilter>,
    ) -> Result<(), DirectoryError> {
        self.subscriptions.subscribe(subscriber, filters).await
    }

    async fn unsubscribe(
        &self,
        subscriber: SubscriberRef,
        filters: Vec<TopicFilter>,
    ) -> Result<(), DirectoryError> {
        self.subscriptions.unsubscribe(subscriber, filters).await
    }
}

#[async_trait]
impl RoutingApi for DirectoryNode {
    async fn route(&self, topic: &TopicPath) -> RouteDecision {
        self.router.route(topic).await
    }
}
