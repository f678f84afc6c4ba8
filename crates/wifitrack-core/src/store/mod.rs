// ── Published entry store ──
//
// The read side of the tracker: immutable snapshots published by the
// worker, consumed by the notification context. Entries themselves never
// leave the worker.

mod collection;

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::EntrySnapshot;
use crate::stream::SnapshotStream;

use collection::SnapshotCollection;

pub struct EntryStore {
    entries: SnapshotCollection,
    /// Lock-free pointer to the connected entry, read on every UI frame.
    connected: ArcSwapOption<EntrySnapshot>,
    last_publish: watch::Sender<Option<DateTime<Utc>>>,
}

impl EntryStore {
    pub fn new() -> Self {
        let (last_publish, _) = watch::channel(None);
        Self {
            entries: SnapshotCollection::new(),
            connected: ArcSwapOption::const_empty(),
            last_publish,
        }
    }

    /// Publish a fresh batch. Called once per worker task, never per
    /// individual field write.
    pub(crate) fn publish(&self, snapshots: Vec<Arc<EntrySnapshot>>) {
        let connected = snapshots
            .iter()
            .find(|s| s.connected_state.is_connected())
            .cloned();
        self.connected.store(connected);
        self.entries.replace_all(snapshots);
        // send_replace stores the value even when no receiver is attached.
        self.last_publish.send_replace(Some(Utc::now()));
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn entries_snapshot(&self) -> Arc<Vec<Arc<EntrySnapshot>>> {
        self.entries.snapshot()
    }

    pub fn entry_by_token(&self, token: &str) -> Option<Arc<EntrySnapshot>> {
        self.entries.get_by_token(token)
    }

    pub fn connected_entry(&self) -> Option<Arc<EntrySnapshot>> {
        self.connected.load_full()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.entries.subscribe())
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_publish(&self) -> Option<DateTime<Utc>> {
        *self.last_publish.borrow()
    }
}

impl Default for EntryStore {
    fn default() -> Self {
        Self::new()
    }
}
