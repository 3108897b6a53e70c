//! Replica convergence.
//!
//! The directory must reach the same merged view on every node whatever
//! order gossip arrives in. The unit suite proves the merge function's
//! algebra; here full stores exchange real deltas.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{addr, cluster};
    use rand::seq::SliceRandom;
    use shared_types::{NodeAddress, SubscriberRef, TopicFilter, TopicPath};
    use std::sync::Arc;
    use std::time::Duration;
    use twin_directory::{DirectoryGossipBus, RoutingApi, SubscriptionApi};
    use twin_replication::{
        EntryRecord, LocalOnlyReplicator, ReplicaDelta, ReplicatedStore, Versioned,
    };
    use uuid::Uuid;

    fn filter(raw: &str) -> TopicFilter {
        TopicFilter::parse(raw).unwrap()
    }

    fn topic(raw: &str) -> TopicPath {
        TopicPath::parse(raw).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_subscriptions_converge_everywhere() {
        let bus = Arc::new(DirectoryGossipBus::new());
        let names = ["node-a:1", "node-b:1", "node-c:1"];
        let nodes = cluster(&bus, &names);

        // Every node registers its own interest at the same time.
        for (i, test_node) in nodes.iter().enumerate() {
            test_node
                .node
                .subscribe(
                    SubscriberRef::new(addr(names[i]), "twin"),
                    vec![filter(&format!("thing/{}/created", names[i]))],
                )
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(300)).await;

        // All stores hold the same live owner set.
        let expected: Vec<NodeAddress> = names.iter().map(|n| addr(n)).collect();
        for test_node in &nodes {
            let owners = test_node.node.store().live_owners().unwrap();
            assert_eq!(owners.into_iter().collect::<Vec<_>>(), expected);
        }

        // And routing agrees: each owner's topic resolves to that owner
        // from every other node.
        for (i, owner_name) in names.iter().enumerate() {
            let t = topic(&format!("thing/{owner_name}/created"));
            for (j, test_node) in nodes.iter().enumerate() {
                let decision = test_node.node.route(&t).await;
                if i == j {
                    assert_eq!(decision.local_subscribers.len(), 1);
                    assert!(decision.remote_candidates.is_empty());
                } else {
                    assert_eq!(decision.remote_candidates, vec![addr(owner_name)]);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_delta_order_does_not_matter() {
        // Two detached stores replay the same delta batch in different
        // orders and must land on identical views.
        let history: Vec<ReplicaDelta<u32>> = vec![
            live_delta("node-a:1", 1, 10),
            live_delta("node-a:1", 2, 20),
            tombstone_delta("node-b:1", 1),
            live_delta("node-b:1", 1, 11),
            live_delta("node-b:1", 2, 12),
            live_delta("node-c:1", 5, 50),
            tombstone_delta("node-c:1", 5),
        ];

        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let left = replay(&history).await;
            let mut shuffled = history.clone();
            shuffled.shuffle(&mut rng);
            let right = replay(&shuffled).await;

            assert_eq!(left.live_owners().unwrap(), right.live_owners().unwrap());
            assert_eq!(left.diagnostics(), right.diagnostics());
        }
    }

    fn live_delta(owner: &str, generation: u64, value: u32) -> ReplicaDelta<u32> {
        ReplicaDelta {
            id: Uuid::new_v4(),
            origin: addr(owner),
            shard: 0,
            owner: addr(owner),
            record: EntryRecord::Live(Versioned::new(generation, value)),
        }
    }

    fn tombstone_delta(owner: &str, generation: u64) -> ReplicaDelta<u32> {
        ReplicaDelta {
            id: Uuid::new_v4(),
            origin: addr("node-x:1"),
            shard: 0,
            owner: addr(owner),
            record: EntryRecord::Tombstone { generation },
        }
    }

    async fn replay(deltas: &[ReplicaDelta<u32>]) -> ReplicatedStore<u32> {
        let store = ReplicatedStore::new(
            addr("observer:1"),
            1,
            Arc::new(LocalOnlyReplicator),
            Duration::from_millis(100),
        )
        .unwrap();
        for delta in deltas {
            store.apply_delta(delta).unwrap();
        }
        store
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_joiner_catches_up_on_new_writes() {
        let bus = Arc::new(DirectoryGossipBus::new());
        let nodes = cluster(&bus, &["node-a:1", "node-b:1"]);
        tokio::time::sleep(Duration::from_millis(200)).await;

        // node-c attaches after the others already announced.
        let late = cluster(&bus, &["node-c:1"]).remove(0);
        tokio::time::sleep(Duration::from_millis(200)).await;

        // It only learns about peers through deltas sent after it joined.
        nodes[0]
            .node
            .subscribe(
                SubscriberRef::new(addr("node-a:1"), "twin"),
                vec![filter("thing/created")],
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let decision = late.node.route(&topic("thing/created")).await;
        assert_eq!(decision.remote_candidates, vec![addr("node-a:1")]);
    }
}
