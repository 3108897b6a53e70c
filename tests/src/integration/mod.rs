//! Cross-crate integration: full directory nodes over the in-process bus.

pub mod convergence;
pub mod failure;
pub mod propagation;

#[cfg(test)]
pub(crate) mod harness {
    use shared_types::{MembershipEvent, MembershipSnapshot, NodeAddress};
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use twin_directory::{
        DirectoryConfig, DirectoryEntry, DirectoryGossipBus, DirectoryNode,
    };
    use twin_replication::DeltaReplicator;

    pub fn addr(name: &str) -> NodeAddress {
        NodeAddress::new(name)
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    pub struct TestNode {
        pub node: DirectoryNode,
        pub feed: mpsc::Sender<MembershipEvent>,
    }

    /// Spawn `names` directory nodes on one gossip bus, all seeded with
    /// the full membership view.
    pub fn cluster(bus: &Arc<DirectoryGossipBus>, names: &[&str]) -> Vec<TestNode> {
        init_tracing();
        let membership = MembershipSnapshot::of(names.iter().map(|n| addr(n)));
        names
            .iter()
            .map(|name| {
                let (feed, feed_rx) = mpsc::channel(16);
                let node = DirectoryNode::spawn(
                    DirectoryConfig::default(),
                    addr(name),
                    Arc::clone(bus) as Arc<dyn DeltaReplicator<DirectoryEntry>>,
                    membership.clone(),
                    feed_rx,
                )
                .expect("spawn directory node");
                bus.attach(node.store());
                TestNode { node, feed }
            })
            .collect()
    }
}
