//! # Shared Types Crate
//!
//! Cross-subsystem domain entities for the MeshTwin cluster.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses a crate boundary
//!   (node addresses, topics, subscriber references, membership events)
//!   is defined here.
//! - **Replication-Safe**: all types carried inside replicated directory
//!   entries derive `Serialize`/`Deserialize` and order deterministically.

pub mod entities;
pub mod membership;
pub mod topic;

pub use entities::{NodeAddress, ShardId, SubscriberRef};
pub use membership::{MembershipEvent, MembershipSnapshot, MembershipStatus};
pub use topic::{FilterSegment, TopicFilter, TopicParseError, TopicPath};
