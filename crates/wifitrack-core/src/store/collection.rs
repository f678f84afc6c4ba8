// ── Reactive snapshot collection ──
//
// Concurrent storage for published entry snapshots with push-based
// change notification. The worker is the only writer; reads are
// wait-free from any context.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::EntrySnapshot;

/// Token-keyed collection of published snapshots.
///
/// `DashMap` gives O(1) token lookups from the notification context;
/// the `watch` channel carries the full snapshot vec, replaced once per
/// worker batch so listeners see one notification per task, not one per
/// entry.
pub(crate) struct SnapshotCollection {
    by_token: DashMap<String, Arc<EntrySnapshot>>,

    /// Version counter, bumped on every publication.
    version: watch::Sender<u64>,

    /// Full snapshot vec, replaced wholesale on publication.
    snapshot: watch::Sender<Arc<Vec<Arc<EntrySnapshot>>>>,
}

impl SnapshotCollection {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_token: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Replace the entire published set in one step.
    ///
    /// One watch send per call regardless of how many entries changed --
    /// the batching guarantee listeners rely on.
    pub(crate) fn replace_all(&self, entries: Vec<Arc<EntrySnapshot>>) {
        self.by_token.clear();
        for entry in &entries {
            self.by_token
                .insert(entry.token.clone(), Arc::clone(entry));
        }

        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(entries));
        self.version.send_modify(|v| *v += 1);
    }

    pub(crate) fn get_by_token(&self, token: &str) -> Option<Arc<EntrySnapshot>> {
        self.by_token.get(token).map(|r| Arc::clone(r.value()))
    }

    /// Current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<EntrySnapshot>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<EntrySnapshot>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_token.len()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }
}
