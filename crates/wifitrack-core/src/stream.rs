// ── Snapshot stream ──
//
// Subscription handle for consuming entry-set changes from the store.
// One item per worker publication: changes are pre-batched, so a slow
// listener only ever sees the latest consistent set.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::EntrySnapshot;

/// A subscription to the published entry set.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via [`changed`](Self::changed) or by converting to a
/// `Stream`.
pub struct SnapshotStream {
    current: Arc<Vec<Arc<EntrySnapshot>>>,
    receiver: watch::Receiver<Arc<Vec<Arc<EntrySnapshot>>>>,
}

impl SnapshotStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<Vec<Arc<EntrySnapshot>>>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at subscription time.
    pub fn current(&self) -> &Arc<Vec<Arc<EntrySnapshot>>> {
        &self.current
    }

    /// The latest snapshot (may have changed since subscription).
    pub fn latest(&self) -> Arc<Vec<Arc<EntrySnapshot>>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next publication, returning the new snapshot.
    /// Returns `None` once the tracker (sender side) is dropped.
    pub async fn changed(&mut self) -> Option<Arc<Vec<Arc<EntrySnapshot>>>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    /// The first item is the value present at conversion time.
    pub fn into_stream(self) -> WatchStream<Arc<Vec<Arc<EntrySnapshot>>>> {
        WatchStream::new(self.receiver)
    }
}
