//! # Twin Directory
//!
//! The cluster subscription directory: replicates which topics each
//! node's local actors are interested in and answers "who wants topic T"
//! on every member.
//!
//! ## Architecture
//!
//! This crate follows the platform's Hexagonal layout (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): pure logic, no I/O
//!   - `TopicSignature`: lossy compressed encoding of a node's topic set
//!   - `shard_of`: deterministic shard assignment
//!   - `SubscriptionTable`: authoritative local subscriber table
//!   - `DirectoryConfig` / `DirectoryConfigBuilder`
//!
//! - **Ports Layer** (`ports/`): trait definitions
//!   - `SubscriptionApi` / `RoutingApi`: driving ports
//!   - `MembershipProvider`: driven port (cluster substrate)
//!
//! - **Service Layer** (`service/`): sequential tasks
//!   - `UpdateCoordinator`: single-writer owner of the local table,
//!     debounces bursts into one replicated put
//!   - `Reconciler`: anti-entropy loop pruning departed owners
//!   - `SubscriptionRouter`: the read path
//!   - `MembershipTracker`: folds the membership feed into a snapshot
//!   - `DirectoryNode`: facade wiring the above over one store
//!
//! ## Consistency model
//!
//! The directory is eventually consistent by design. Local effects are
//! immediate (a subscribe is visible to the local router before the call
//! returns); remote visibility follows gossip. Routing answers are safe
//! over-approximations: stale or false-positive candidates cost a wasted
//! probe, never a lost local delivery.
//!
//! ## Usage Example
//!
//! ```ignore
//! use twin_directory::{DirectoryConfig, DirectoryGossipBus, DirectoryNode};
//! use shared_types::{MembershipSnapshot, NodeAddress, SubscriberRef, TopicFilter, TopicPath};
//! use std::sync::Arc;
//!
//! let bus = Arc::new(DirectoryGossipBus::new());
//! let (feed_tx, feed_rx) = tokio::sync::mpsc::channel(16);
//! let me = NodeAddress::new("twin-node-1:2552");
//!
//! let node = DirectoryNode::spawn(
//!     DirectoryConfig::default(),
//!     me.clone(),
//!     bus.clone(),
//!     MembershipSnapshot::of([me.clone()]),
//!     feed_rx,
//! )?;
//! bus.attach(node.store());
//!
//! let twin = SubscriberRef::new(me, "twin-7");
//! node.subscribe(twin, vec![TopicFilter::parse("thing/created")?]).await?;
//! let decision = node.route(&TopicPath::parse("thing/created")?).await;
//! ```

pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use domain::{
    shard_of, DirectoryConfig, DirectoryConfigBuilder, DirectoryEntry, SignatureParams,
    SubscriptionTable, TopicSignature,
};
pub use error::DirectoryError;
pub use metrics::{DirectoryMetrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::{MembershipProvider, RouteDecision, RoutingApi, SubscriptionApi};
pub use service::{
    sync_once, DirectoryNode, MembershipTracker, ReconcileReport, Reconciler, SubscriptionHandle,
    SubscriptionRouter, UpdateCoordinator,
};

use twin_replication::{InMemoryGossipBus, ReplicatedStore};

/// The replicated store specialized to directory entries.
pub type DirectoryStore = ReplicatedStore<DirectoryEntry>;

/// In-process gossip bus specialized to directory entries.
pub type DirectoryGossipBus = InMemoryGossipBus<DirectoryEntry>;
