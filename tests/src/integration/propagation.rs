//! Subscription propagation across the cluster.
//!
//! A registration on one node must become routable from every other node
//! after one debounce window plus gossip, and bursts of registrations
//! must collapse into a single replicated write.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{addr, cluster};
    use shared_types::{SubscriberRef, TopicFilter, TopicPath};
    use std::sync::Arc;
    use std::time::Duration;
    use twin_directory::{shard_of, DirectoryGossipBus, RoutingApi, SubscriptionApi};

    fn filter(raw: &str) -> TopicFilter {
        TopicFilter::parse(raw).unwrap()
    }

    fn topic(raw: &str) -> TopicPath {
        TopicPath::parse(raw).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscription_visible_cluster_wide() {
        let bus = Arc::new(DirectoryGossipBus::new());
        let nodes = cluster(&bus, &["node-a:1", "node-b:1", "node-c:1"]);

        nodes[0]
            .node
            .subscribe(
                SubscriberRef::new(addr("node-a:1"), "twin-1"),
                vec![filter("thing/created")],
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Local delivery on the owner, exact.
        let local = nodes[0].node.route(&topic("thing/created")).await;
        assert_eq!(local.local_subscribers.len(), 1);
        assert!(local.remote_candidates.is_empty());

        // Every peer sees node-a as a candidate, and only node-a.
        for peer in &nodes[1..] {
            let decision = peer.node.route(&topic("thing/created")).await;
            assert!(decision.local_subscribers.is_empty());
            assert_eq!(decision.remote_candidates, vec![addr("node-a:1")]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_into_one_replicated_write() {
        let bus = Arc::new(DirectoryGossipBus::new());
        let nodes = cluster(&bus, &["node-a:1", "node-b:1"]);

        for i in 0..10 {
            nodes[0]
                .node
                .subscribe(
                    SubscriberRef::new(addr("node-a:1"), format!("twin-{i}")),
                    vec![filter(&format!("thing/{i}/created"))],
                )
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Startup resync plus exactly one debounced flush for the burst.
        let snapshot = nodes[0].node.metrics().snapshot();
        assert_eq!(snapshot.puts_issued, 2);
        assert_eq!(snapshot.updates_coalesced, 9);

        let origin = addr("node-a:1");
        let store = nodes[0].node.store();
        let shard = shard_of(&origin, store.shard_count());
        assert_eq!(store.generation_of(shard, &origin).unwrap(), Some(2));

        // And the whole burst still routes from the peer.
        for i in 0..10 {
            let decision = nodes[1]
                .node
                .route(&topic(&format!("thing/{i}/created")))
                .await;
            assert_eq!(decision.remote_candidates, vec![addr("node-a:1")]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_clears_remote_candidacy() {
        let bus = Arc::new(DirectoryGossipBus::new());
        let nodes = cluster(&bus, &["node-a:1", "node-b:1"]);
        let twin = SubscriberRef::new(addr("node-a:1"), "twin-1");

        nodes[0]
            .node
            .subscribe(twin.clone(), vec![filter("thing/created")])
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!nodes[1]
            .node
            .route(&topic("thing/created"))
            .await
            .remote_candidates
            .is_empty());

        // The flush re-derives the signature from scratch, so removal
        // clears bits despite the filter being add-only in isolation.
        nodes[0].node.unsubscribe(twin, vec![]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let decision = nodes[1].node.route(&topic("thing/created")).await;
        assert!(decision.remote_candidates.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wildcard_subscription_routes_remotely() {
        let bus = Arc::new(DirectoryGossipBus::new());
        let nodes = cluster(&bus, &["node-a:1", "node-b:1"]);

        nodes[1]
            .node
            .subscribe(
                SubscriberRef::new(addr("node-b:1"), "twin-wild"),
                vec![filter("thing/+/created"), filter("policy/#")],
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        for raw in ["thing/sensor/created", "policy/p1/modified"] {
            let decision = nodes[0].node.route(&topic(raw)).await;
            assert_eq!(
                decision.remote_candidates,
                vec![addr("node-b:1")],
                "topic {raw} should route to node-b"
            );
        }

        // A topic outside both filter families routes nowhere.
        let decision = nodes[0].node.route(&topic("connection/opened")).await;
        assert!(decision.remote_candidates.is_empty());
    }
}
