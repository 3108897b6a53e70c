//! The authoritative local subscription table.
//!
//! One table per node, owned by the update coordinator. It is the exact
//! source of truth the lossy replicated signature is derived from, and
//! the structure the router consults for precise local matching.

use shared_types::{SubscriberRef, TopicFilter, TopicPath};
use std::collections::{BTreeMap, BTreeSet};

/// Exact mapping of local subscribers to their topic filters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubscriptionTable {
    filters: BTreeMap<SubscriberRef, BTreeSet<TopicFilter>>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add filters for a subscriber. Returns true if the table changed,
    /// which is what decides whether a replication flush is needed.
    pub fn subscribe(
        &mut self,
        subscriber: SubscriberRef,
        filters: impl IntoIterator<Item = TopicFilter>,
    ) -> bool {
        let entry = self.filters.entry(subscriber).or_default();
        let mut changed = false;
        for filter in filters {
            changed |= entry.insert(filter);
        }
        changed
    }

    /// Remove specific filters from a subscriber; an empty filter list
    /// removes the subscriber entirely. Returns true if the table changed.
    pub fn unsubscribe(&mut self, subscriber: &SubscriberRef, filters: &[TopicFilter]) -> bool {
        let Some(entry) = self.filters.get_mut(subscriber) else {
            return false;
        };
        let changed = if filters.is_empty() {
            true
        } else {
            let mut removed = false;
            for filter in filters {
                removed |= entry.remove(filter);
            }
            removed
        };
        if filters.is_empty() || entry.is_empty() {
            self.filters.remove(subscriber);
        }
        changed
    }

    /// Subscribers whose filters match the topic exactly.
    pub fn matching_subscribers(&self, topic: &TopicPath) -> Vec<SubscriberRef> {
        self.filters
            .iter()
            .filter(|(_, filters)| filters.iter().any(|f| f.matches(topic)))
            .map(|(subscriber, _)| subscriber.clone())
            .collect()
    }

    /// Every distinct filter in the table. The signature is encoded from
    /// this set, so duplicates across subscribers collapse.
    pub fn all_filters(&self) -> BTreeSet<TopicFilter> {
        self.filters.values().flatten().cloned().collect()
    }

    /// Every subscriber currently present.
    pub fn subscribers(&self) -> impl Iterator<Item = &SubscriberRef> {
        self.filters.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }
}
