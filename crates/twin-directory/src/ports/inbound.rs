//! Driving ports: what the platform calls on the directory.

use crate::error::DirectoryError;
use async_trait::async_trait;
use shared_types::{NodeAddress, SubscriberRef, TopicFilter, TopicPath};

/// Outcome of a routing query for one published topic.
///
/// `local_subscribers` is exact; `remote_candidates` is a safe
/// over-approximation and may contain false positives.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteDecision {
    /// Local subscribers whose filters match the topic.
    pub local_subscribers: Vec<SubscriberRef>,
    /// Remote nodes whose signature may match the topic.
    pub remote_candidates: Vec<NodeAddress>,
}

impl RouteDecision {
    pub fn is_empty(&self) -> bool {
        self.local_subscribers.is_empty() && self.remote_candidates.is_empty()
    }
}

/// Registration surface for local subscribers.
#[async_trait]
pub trait SubscriptionApi: Send + Sync {
    /// Register filters for a local subscriber. The local table is
    /// updated before this returns; replication follows the configured
    /// consistency level.
    async fn subscribe(
        &self,
        subscriber: SubscriberRef,
        filters: Vec<TopicFilter>,
    ) -> Result<(), DirectoryError>;

    /// Remove filters for a subscriber; an empty list removes the
    /// subscriber entirely. Succeeds when nothing matched.
    async fn unsubscribe(
        &self,
        subscriber: SubscriberRef,
        filters: Vec<TopicFilter>,
    ) -> Result<(), DirectoryError>;
}

/// Read path: where should a published event go?
#[async_trait]
pub trait RoutingApi: Send + Sync {
    /// Resolve a published topic to local subscribers and remote
    /// candidate nodes. Never fails; a degraded store yields a
    /// local-only decision.
    async fn route(&self, topic: &TopicPath) -> RouteDecision;
}
