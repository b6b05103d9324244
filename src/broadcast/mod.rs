//! Fan-out of changed snapshots to live subscribers.
//!
//! Every subscriber owns an unbounded channel; the registry maps a
//! subscriber id to the sending half. A send that fails means the
//! receiving side is gone, and the entry is dropped during the same pass.

use crate::snapshot::Snapshot;
use crate::state::SnapshotStore;
use dashmap::DashMap;
use futures::Stream;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

#[cfg(test)]
mod tests;

type Registry = DashMap<Uuid, mpsc::UnboundedSender<Arc<Snapshot>>>;

/// Registry of connected subscribers
pub struct Broadcaster {
    subscribers: Arc<Registry>,

    /// Serializes publish against subscribe so a new subscriber never sees
    /// an older snapshot after a newer one, or the same snapshot twice
    gate: Mutex<()>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(DashMap::new()),
            gate: Mutex::new(()),
        }
    }

    /// Register a new subscriber
    ///
    /// If the store already holds a published snapshot it is queued to this
    /// subscriber alone before the handle is returned.
    pub fn subscribe(&self, store: &SnapshotStore) -> Subscription {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);

        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(current) = store.published() {
            let _ = tx.send(current);
        }

        let id = Uuid::new_v4();
        self.subscribers.insert(id, tx);
        debug!(subscriber = %id, total = self.subscribers.len(), "Subscriber registered");

        Subscription {
            id,
            rx,
            registry: Arc::clone(&self.subscribers),
        }
    }

    /// Store a changed snapshot and push it to every subscriber
    ///
    /// Returns the number of subscribers it was delivered to.
    pub fn publish(&self, store: &SnapshotStore, snapshot: Snapshot) -> usize {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = store.replace(snapshot);
        self.push(snapshot)
    }

    /// Deliver a snapshot to every registered subscriber
    ///
    /// Subscribers whose channel is closed are removed; the others are
    /// unaffected. Returns the number of successful deliveries.
    pub fn push(&self, snapshot: Arc<Snapshot>) -> usize {
        let mut delivered = 0;
        self.subscribers.retain(|id, tx| {
            if tx.send(Arc::clone(&snapshot)).is_ok() {
                delivered += 1;
                true
            } else {
                debug!(subscriber = %id, "Dropping closed subscriber");
                false
            }
        });
        delivered
    }

    /// Remove a subscriber explicitly. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: Uuid) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    /// Number of currently registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of one subscriber
///
/// Yields snapshots in publish order. Dropping the subscription
/// unregisters it.
pub struct Subscription {
    id: Uuid,
    rx: mpsc::UnboundedReceiver<Arc<Snapshot>>,
    registry: Arc<Registry>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the next snapshot
    ///
    /// Returns `None` once the subscriber has been removed from the
    /// broadcaster and all queued snapshots were consumed.
    pub async fn recv(&mut self) -> Option<Arc<Snapshot>> {
        self.rx.recv().await
    }

    /// Take a queued snapshot without waiting
    pub fn try_recv(&mut self) -> Option<Arc<Snapshot>> {
        self.rx.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = Arc<Snapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.registry.remove(&self.id).is_some() {
            debug!(subscriber = %self.id, "Subscriber disconnected");
        }
    }
}
