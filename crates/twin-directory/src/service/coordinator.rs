//! The local update coordinator.
//!
//! One sequential task per node owns the local subscription table and is
//! the only writer of this node's replicated entry. Registrations apply
//! to the table immediately (the caller's ack means "locally visible"),
//! while replication is debounced: the first change in a quiet period
//! arms a flush deadline, further changes before the deadline coalesce
//! into the same flush. Each flush re-derives the full entry from the
//! table and writes it at the next generation.

use crate::domain::{shard_of, DirectoryConfig, DirectoryEntry, SubscriptionTable, TopicSignature};
use crate::error::DirectoryError;
use crate::metrics::MetricsRecorder;
use crate::ports::SubscriptionApi;
use crate::DirectoryStore;
use async_trait::async_trait;
use shared_types::{ShardId, SubscriberRef, TopicFilter};
use std::sync::{Arc, RwLock};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use twin_replication::Versioned;

enum Command {
    Subscribe {
        subscriber: SubscriberRef,
        filters: Vec<TopicFilter>,
        reply: oneshot::Sender<()>,
    },
    Unsubscribe {
        subscriber: SubscriberRef,
        filters: Vec<TopicFilter>,
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cheap cloneable handle to the coordinator task.
#[derive(Clone)]
pub struct SubscriptionHandle {
    commands: mpsc::Sender<Command>,
}

impl SubscriptionHandle {
    async fn send(
        &self,
        command: Command,
        reply: oneshot::Receiver<()>,
    ) -> Result<(), DirectoryError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| DirectoryError::CoordinatorShutdown)?;
        reply.await.map_err(|_| DirectoryError::CoordinatorShutdown)
    }

    /// Stop the coordinator. Flushes nothing further; the node's entry is
    /// tombstoned best-effort so peers stop routing here promptly rather
    /// than waiting for their reconcilers.
    pub async fn shutdown(&self) -> Result<(), DirectoryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Shutdown { reply: reply_tx }, reply_rx).await
    }
}

#[async_trait]
impl SubscriptionApi for SubscriptionHandle {
    async fn subscribe(
        &self,
        subscriber: SubscriberRef,
        filters: Vec<TopicFilter>,
    ) -> Result<(), DirectoryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(
            Command::Subscribe {
                subscriber,
                filters,
                reply: reply_tx,
            },
            reply_rx,
        )
        .await
    }

    async fn unsubscribe(
        &self,
        subscriber: SubscriberRef,
        filters: Vec<TopicFilter>,
    ) -> Result<(), DirectoryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(
            Command::Unsubscribe {
                subscriber,
                filters,
                reply: reply_tx,
            },
            reply_rx,
        )
        .await
    }
}

/// The coordinator task state.
pub struct UpdateCoordinator {
    config: DirectoryConfig,
    store: Arc<DirectoryStore>,
    table: Arc<RwLock<SubscriptionTable>>,
    metrics: Arc<dyn MetricsRecorder>,
    commands: mpsc::Receiver<Command>,
    shard: ShardId,
    generation: u64,
    flush_deadline: Option<Instant>,
}

impl UpdateCoordinator {
    /// Spawn the coordinator for the store's origin address.
    ///
    /// Issues a full resync flush on startup so a restarted node
    /// re-announces itself, overriding any tombstone left from its
    /// previous incarnation.
    pub fn spawn(
        config: DirectoryConfig,
        store: Arc<DirectoryStore>,
        table: Arc<RwLock<SubscriptionTable>>,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> (SubscriptionHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.command_queue_depth);
        let shard = shard_of(store.origin(), config.shard_count);
        let coordinator = Self {
            config,
            store,
            table,
            metrics,
            commands: rx,
            shard,
            generation: 0,
            flush_deadline: None,
        };
        let join = tokio::spawn(coordinator.run());
        (SubscriptionHandle { commands: tx }, join)
    }

    async fn run(mut self) {
        info!(
            origin = %self.store.origin(),
            shard = self.shard,
            "Update coordinator started"
        );
        self.flush().await;

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(Command::Subscribe { subscriber, filters, reply }) => {
                            let changed = self.lock_table().subscribe(subscriber, filters);
                            let _ = reply.send(());
                            self.note_change(changed);
                        }
                        Some(Command::Unsubscribe { subscriber, filters, reply }) => {
                            let changed = self.lock_table().unsubscribe(&subscriber, &filters);
                            let _ = reply.send(());
                            self.note_change(changed);
                        }
                        Some(Command::Shutdown { reply }) => {
                            self.retire().await;
                            let _ = reply.send(());
                            break;
                        }
                        None => {
                            self.retire().await;
                            break;
                        }
                    }
                }
                _ = sleep_until_deadline(self.flush_deadline) => {
                    self.flush().await;
                }
            }
        }
    }

    fn lock_table(&self) -> std::sync::RwLockWriteGuard<'_, SubscriptionTable> {
        // The table holds plain data; a panicked writer cannot leave it
        // half-updated in a way later readers would misread.
        self.table
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn note_change(&mut self, changed: bool) {
        if !changed {
            return;
        }
        match self.flush_deadline {
            Some(_) => self.metrics.record_coalesced(),
            None => {
                self.flush_deadline = Some(Instant::now() + self.config.debounce_window);
            }
        }
    }

    /// Re-derive the entry from the table and replicate it at the next
    /// generation. On a retryable failure the deadline is re-armed so the
    /// write goes out again; the local apply already happened, so local
    /// routing is never behind.
    ///
    /// The generation starts strictly above the highest the local store
    /// has observed for this address, tombstones included. A tombstone
    /// from a previous incarnation may gossip in at any time, not just
    /// before startup, so the check happens on every flush; whatever
    /// stale generation arrived, the next write out-generations it.
    async fn flush(&mut self) {
        let entry = {
            let table = self
                .table
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            DirectoryEntry::new(
                TopicSignature::encode(table.all_filters().iter(), &self.config.signature),
                table.subscribers().cloned().collect(),
            )
        };

        let observed = match self.store.generation_of(self.shard, self.store.origin()) {
            Ok(observed) => observed.unwrap_or(0),
            Err(err) => {
                warn!(error = %err, "Could not read local generation, using cached counter");
                0
            }
        };
        self.generation = self.generation.max(observed) + 1;
        let result = self
            .store
            .put(
                self.shard,
                self.store.origin().clone(),
                Versioned::new(self.generation, entry),
                self.config.write_consistency,
            )
            .await;

        match result {
            Ok(()) => {
                debug!(generation = self.generation, "Directory entry flushed");
                self.metrics.record_put();
                self.flush_deadline = None;
            }
            Err(err) if err.is_retryable() => {
                warn!(error = %err, generation = self.generation, "Flush under-replicated, retrying");
                self.flush_deadline = Some(Instant::now() + self.config.debounce_window);
            }
            Err(err) => {
                error!(error = %err, "Flush failed fatally");
                self.flush_deadline = None;
            }
        }
    }

    /// Best-effort retirement: tombstone this node's entry so peers drop
    /// it without waiting for membership-driven pruning.
    async fn retire(&mut self) {
        match self
            .store
            .remove_address(
                self.shard,
                self.store.origin().clone(),
                self.config.write_consistency,
            )
            .await
        {
            Ok(()) => {
                self.metrics.record_removal();
                info!(origin = %self.store.origin(), "Directory entry retired");
            }
            Err(err) => {
                warn!(error = %err, "Retirement tombstone not replicated");
            }
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
