//! Ports layer: trait boundaries between the directory and its callers.

pub mod inbound;
pub mod outbound;

pub use inbound::{RouteDecision, RoutingApi, SubscriptionApi};
pub use outbound::MembershipProvider;
