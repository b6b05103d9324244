use crate::snapshot::Snapshot;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Holder of the single current snapshot
///
/// Readers clone an `Arc` under a short read lock, so they always observe a
/// whole snapshot. Replacement swaps the `Arc` under the write lock. The
/// poller is the only writer.
pub struct SnapshotStore {
    inner: RwLock<Current>,
}

struct Current {
    snapshot: Arc<Snapshot>,
    /// False until the first changed snapshot is stored
    published: bool,
}

impl SnapshotStore {
    /// Create store holding the empty initial snapshot
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Current {
                snapshot: Arc::new(Snapshot::empty()),
                published: false,
            }),
        }
    }

    /// Current snapshot (the empty initial value before the first change)
    pub fn current(&self) -> Arc<Snapshot> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard.snapshot)
    }

    /// Current snapshot, only if one has been produced by a poll
    pub fn published(&self) -> Option<Arc<Snapshot>> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.published.then(|| Arc::clone(&guard.snapshot))
    }

    /// Atomically replace the current snapshot, returning the shared handle
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.snapshot = Arc::clone(&snapshot);
        guard.published = true;
        drop(guard);

        debug!(
            entities = snapshot.entity_count(),
            taken_at = %snapshot.taken_at,
            "Snapshot replaced"
        );

        snapshot
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
