//! Domain layer: pure logic, no I/O.

pub mod config;
pub mod entry;
pub mod hash_positions;
pub mod sharding;
pub mod signature;
pub mod subscriptions;

pub use config::{DirectoryConfig, DirectoryConfigBuilder};
pub use entry::DirectoryEntry;
pub use sharding::shard_of;
pub use signature::{SignatureParams, TopicSignature};
pub use subscriptions::SubscriptionTable;
