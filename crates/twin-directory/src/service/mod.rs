//! Service layer: the sequential tasks that animate the domain.

pub mod coordinator;
pub mod membership;
pub mod node;
pub mod reconciler;
pub mod router;

pub use coordinator::{SubscriptionHandle, UpdateCoordinator};
pub use membership::MembershipTracker;
pub use node::DirectoryNode;
pub use reconciler::{sync_once, ReconcileReport, Reconciler};
pub use router::SubscriptionRouter;
