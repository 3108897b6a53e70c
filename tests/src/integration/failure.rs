//! Failure handling: departed members, stale gossip, graceful retirement.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{addr, cluster};
    use shared_types::{
        MembershipEvent, MembershipStatus, SubscriberRef, TopicFilter, TopicPath,
    };
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::time::Duration;
    use twin_directory::{
        shard_of, DirectoryEntry, DirectoryGossipBus, RoutingApi, SignatureParams,
        SubscriptionApi, TopicSignature,
    };
    use twin_replication::{DeltaReplicator, EntryRecord, ReplicaDelta, Versioned};
    use uuid::Uuid;

    fn filter(raw: &str) -> TopicFilter {
        TopicFilter::parse(raw).unwrap()
    }

    fn topic(raw: &str) -> TopicPath {
        TopicPath::parse(raw).unwrap()
    }

    fn entry_for(filters: &[TopicFilter]) -> DirectoryEntry {
        DirectoryEntry::new(
            TopicSignature::encode(filters.iter(), &SignatureParams::default()),
            BTreeSet::new(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_crashed_member_is_pruned_after_down_event() {
        let bus = Arc::new(DirectoryGossipBus::new());
        let nodes = cluster(&bus, &["node-a:1", "node-b:1", "node-c:1"]);

        nodes[2]
            .node
            .subscribe(
                SubscriberRef::new(addr("node-c:1"), "twin-1"),
                vec![filter("thing/created")],
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        // node-c crashes: no retirement write, the substrate reports Down.
        for survivor in &nodes[..2] {
            survivor
                .feed
                .send(MembershipEvent::down(addr("node-c:1")))
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(100)).await;

        for survivor in &nodes[..2] {
            let decision = survivor.node.route(&topic("thing/created")).await;
            assert!(decision.remote_candidates.is_empty());
            assert!(!survivor
                .node
                .store()
                .live_owners()
                .unwrap()
                .contains(&addr("node-c:1")));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_gossip_does_not_resurrect_pruned_member() {
        let bus = Arc::new(DirectoryGossipBus::new());
        let nodes = cluster(&bus, &["node-a:1", "node-b:1"]);

        nodes[1]
            .node
            .subscribe(
                SubscriberRef::new(addr("node-b:1"), "twin-1"),
                vec![filter("thing/created")],
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        nodes[0]
            .feed
            .send(MembershipEvent::down(addr("node-b:1")))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // A delayed replica of node-b's last put (generation 2: startup
        // resync plus one flush) arrives after the prune. Equal
        // generations: the tombstone dominates.
        let stale = ReplicaDelta {
            id: Uuid::new_v4(),
            origin: addr("node-z:1"),
            shard: shard_of(&addr("node-b:1"), 8),
            owner: addr("node-b:1"),
            record: EntryRecord::Live(Versioned::new(2, entry_for(&[filter("thing/created")]))),
        };
        bus.disseminate(stale).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let decision = nodes[0].node.route(&topic("thing/created")).await;
        assert!(decision.remote_candidates.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_member_is_not_pruned() {
        let bus = Arc::new(DirectoryGossipBus::new());
        let nodes = cluster(&bus, &["node-a:1", "node-b:1"]);

        nodes[1]
            .node
            .subscribe(
                SubscriberRef::new(addr("node-b:1"), "twin-1"),
                vec![filter("thing/created")],
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        // A transient partition must not cost node-b its entry.
        nodes[0]
            .feed
            .send(MembershipEvent {
                address: addr("node-b:1"),
                status: MembershipStatus::Unreachable,
            })
            .await
            .unwrap();
        nodes[0].node.sync_now();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let decision = nodes[0].node.route(&topic("thing/created")).await;
        assert_eq!(decision.remote_candidates, vec![addr("node-b:1")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_graceful_shutdown_beats_the_reconciler() {
        let bus = Arc::new(DirectoryGossipBus::new());
        let nodes = cluster(&bus, &["node-a:1", "node-b:1"]);

        nodes[1]
            .node
            .subscribe(
                SubscriberRef::new(addr("node-b:1"), "twin-1"),
                vec![filter("thing/created")],
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Retirement tombstones immediately; no membership event needed.
        nodes[1].node.shutdown().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let decision = nodes[0].node.route(&topic("thing/created")).await;
        assert!(decision.remote_candidates.is_empty());
    }
}
