//! Metrics hooks for directory operations.
//!
//! Thread-safe counters for monitoring replication write volume, debounce
//! effectiveness, reconciliation activity, and the read path.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for the subscription directory.
#[derive(Default)]
pub struct DirectoryMetrics {
    /// Replicated puts issued by the update coordinator.
    pub puts_issued: AtomicU64,
    /// Local changes absorbed into an already-pending debounce window.
    pub updates_coalesced: AtomicU64,
    /// `remove_address` tombstones issued (graceful shutdown + pruning).
    pub removals_issued: AtomicU64,
    /// Completed reconciliation cycles.
    pub sync_cycles: AtomicU64,
    /// Reconciliation cycles abandoned on store failure.
    pub sync_failures: AtomicU64,
    /// Stale owners pruned by reconciliation.
    pub stale_owners_pruned: AtomicU64,
    /// Routing queries served.
    pub routes_served: AtomicU64,
    /// Remote candidates emitted across all routing queries.
    pub remote_candidates: AtomicU64,
}

impl DirectoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_put(&self) {
        self.puts_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coalesced(&self) {
        self.updates_coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_removal(&self) {
        self.removals_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sync_cycle(&self, pruned: u64) {
        self.sync_cycles.fetch_add(1, Ordering::Relaxed);
        self.stale_owners_pruned.fetch_add(pruned, Ordering::Relaxed);
    }

    pub fn record_sync_failure(&self) {
        self.sync_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_route(&self, remote_candidates: u64) {
        self.routes_served.fetch_add(1, Ordering::Relaxed);
        self.remote_candidates
            .fetch_add(remote_candidates, Ordering::Relaxed);
    }

    /// Point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            puts_issued: self.puts_issued.load(Ordering::Relaxed),
            updates_coalesced: self.updates_coalesced.load(Ordering::Relaxed),
            removals_issued: self.removals_issued.load(Ordering::Relaxed),
            sync_cycles: self.sync_cycles.load(Ordering::Relaxed),
            sync_failures: self.sync_failures.load(Ordering::Relaxed),
            stale_owners_pruned: self.stale_owners_pruned.load(Ordering::Relaxed),
            routes_served: self.routes_served.load(Ordering::Relaxed),
            remote_candidates: self.remote_candidates.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time metrics snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub puts_issued: u64,
    pub updates_coalesced: u64,
    pub removals_issued: u64,
    pub sync_cycles: u64,
    pub sync_failures: u64,
    pub stale_owners_pruned: u64,
    pub routes_served: u64,
    pub remote_candidates: u64,
}

/// Trait for custom metrics recording implementations.
///
/// Implement to integrate with an external metrics system; the default
/// [`DirectoryMetrics`] keeps process-local atomic counters.
pub trait MetricsRecorder: Send + Sync {
    fn record_put(&self);
    fn record_coalesced(&self);
    fn record_removal(&self);
    fn record_sync_cycle(&self, pruned: u64);
    fn record_sync_failure(&self);
    fn record_route(&self, remote_candidates: u64);
}

/// No-op recorder for when metrics are disabled.
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_put(&self) {}
    fn record_coalesced(&self) {}
    fn record_removal(&self) {}
    fn record_sync_cycle(&self, _: u64) {}
    fn record_sync_failure(&self) {}
    fn record_route(&self, _: u64) {}
}

impl MetricsRecorder for DirectoryMetrics {
    fn record_put(&self) {
        DirectoryMetrics::record_put(self);
    }

    fn record_coalesced(&self) {
        DirectoryMetrics::record_coalesced(self);
    }

    fn record_removal(&self) {
        DirectoryMetrics::record_removal(self);
    }

    fn record_sync_cycle(&self, pruned: u64) {
        DirectoryMetrics::record_sync_cycle(self, pruned);
    }

    fn record_sync_failure(&self) {
        DirectoryMetrics::record_sync_failure(self);
    }

    fn record_route(&self, remote_candidates: u64) {
        DirectoryMetrics::record_route(self, remote_candidates);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = DirectoryMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_sync_cycle_accumulates_pruned() {
        let metrics = DirectoryMetrics::new();
        metrics.record_sync_cycle(0);
        metrics.record_sync_cycle(3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.sync_cycles, 2);
        assert_eq!(snapshot.stale_owners_pruned, 3);
    }

    #[test]
    fn test_route_accumulates_candidates() {
        let metrics = DirectoryMetrics::new();
        metrics.record_route(2);
        metrics.record_route(0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.routes_served, 2);
        assert_eq!(snapshot.remote_candidates, 2);
    }

    #[test]
    fn test_noop_metrics() {
        let metrics = NoOpMetrics;
        metrics.record_put();
        metrics.record_sync_cycle(5);
        metrics.record_route(1);
    }
}
