// ── Tracker abstraction ──
//
// Full lifecycle management for network entry tracking. Owns the worker
// task that serializes all mutation, the command processor that routes
// write operations to the platform, and the periodic scan loop. Consumers
// read immutable snapshots from the EntryStore and subscribe to change
// notifications.

mod events;
mod worker;

pub use events::{PlatformEvent, PlatformHandle, TrackerEvent};

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use wifitrack_platform::{CarrierLookup, ConfigStore, Scanner, WifiState};

use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::config::TrackerConfig;
use crate::error::CoreError;
use crate::model::ConnectedState;
use crate::store::EntryStore;
use crate::stream::SnapshotStream;

use worker::WorkerState;

const COMMAND_CHANNEL_SIZE: usize = 64;
const EVENT_CHANNEL_SIZE: usize = 256;
const NOTIFY_CHANNEL_SIZE: usize = 64;

// ── Tracker ──────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<TrackerInner>`. Manages the worker task,
/// command routing, the periodic scan loop, and reactive snapshot
/// publication through the [`EntryStore`].
#[derive(Clone)]
pub struct Tracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    config: TrackerConfig,
    store: Arc<EntryStore>,
    scanner: Arc<dyn Scanner>,
    config_store: Arc<dyn ConfigStore>,
    carrier: Option<Arc<dyn CarrierLookup>>,
    /// True while the app is visible AND Wi-Fi is enabled; gates the
    /// scan loop.
    eligible: watch::Sender<bool>,
    wifi_state: watch::Sender<WifiState>,
    notify_tx: broadcast::Sender<TrackerEvent>,
    event_tx: mpsc::Sender<PlatformEvent>,
    event_rx: Mutex<Option<mpsc::Receiver<PlatformEvent>>>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Tracker {
    /// Create a new Tracker. Does NOT start background tasks --
    /// call [`start()`](Self::start) to load configs and begin tracking.
    pub fn new(
        config: TrackerConfig,
        scanner: Arc<dyn Scanner>,
        config_store: Arc<dyn ConfigStore>,
        carrier: Option<Arc<dyn CarrierLookup>>,
    ) -> Self {
        let store = Arc::new(EntryStore::new());
        let (eligible, _) = watch::channel(false);
        let (wifi_state, _) = watch::channel(WifiState::Disabled);
        let (notify_tx, _) = broadcast::channel(NOTIFY_CHANNEL_SIZE);
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Self {
            inner: Arc::new(TrackerInner {
                config,
                store,
                scanner,
                config_store,
                carrier,
                eligible,
                wifi_state,
                notify_tx,
                event_tx,
                event_rx: Mutex::new(Some(event_rx)),
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Access the tracker configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.inner.config
    }

    /// Access the underlying EntryStore.
    pub fn store(&self) -> &Arc<EntryStore> {
        &self.inner.store
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Load the initial saved configurations and spawn background tasks
    /// (worker, command processor, scan loop).
    ///
    /// Idempotent: a second call on a running tracker is a no-op.
    pub async fn start(&self) -> Result<(), CoreError> {
        // Hold the slot locked while loading so a failed load leaves the
        // receiver in place and a later start() can retry.
        let mut event_rx_slot = self.inner.event_rx.lock().await;
        if event_rx_slot.is_none() {
            return Ok(());
        }

        let configs = self
            .inner
            .config_store
            .saved_configs()
            .await
            .map_err(|e| CoreError::from_platform("load saved configs", e))?;
        debug!(count = configs.len(), "loaded saved configurations");
        self.inner
            .event_tx
            .send(PlatformEvent::ConfigsChanged { configs })
            .await
            .map_err(|_| CoreError::TrackerStopped)?;

        let Some(event_rx) = event_rx_slot.take() else {
            return Ok(());
        };
        drop(event_rx_slot);

        let mut handles = self.inner.task_handles.lock().await;

        {
            let tracker = self.clone();
            handles.push(tokio::spawn(worker_task(tracker, event_rx)));
        }

        if let Some(command_rx) = self.inner.command_rx.lock().await.take() {
            let tracker = self.clone();
            handles.push(tokio::spawn(command_processor_task(tracker, command_rx)));
        }

        if !self.inner.config.scan_interval.is_zero() {
            let tracker = self.clone();
            handles.push(tokio::spawn(scan_loop_task(tracker)));
        }

        info!("tracker started");
        Ok(())
    }

    /// Stop the tracker: cancel background tasks and wait for them to
    /// finish. Events already queued are still applied before the worker
    /// exits.
    pub async fn stop(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("tracker stopped");
    }

    // ── Platform-facing surface ──────────────────────────────────

    /// Cloneable handle the embedder uses to push platform signals in
    /// (scan results, connectivity changes, scores, hotspot payloads).
    pub fn handle(&self) -> PlatformHandle {
        PlatformHandle {
            tx: self.inner.event_tx.clone(),
        }
    }

    /// Report app visibility. Scanning runs only while visible.
    pub async fn set_visible(&self, visible: bool) -> Result<(), CoreError> {
        self.handle()
            .deliver(PlatformEvent::VisibilityChanged { visible })
            .await
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command against the platform.
    ///
    /// Sends the command through the internal channel to the command
    /// processor task and awaits the result. All failures -- including
    /// platform rejections and the disconnect ack timeout -- come back
    /// through the returned `Result`, never as a panic.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::TrackerStopped);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();
        self.inner
            .command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::TrackerStopped)?;

        rx.await.map_err(|_| CoreError::TrackerStopped)?
    }

    // ── Read surface ─────────────────────────────────────────────

    /// Reactive stream over the full published entry list.
    pub fn entries(&self) -> SnapshotStream {
        self.inner.store.subscribe()
    }

    /// Current published entry list.
    pub fn entries_snapshot(&self) -> Arc<Vec<Arc<crate::model::EntrySnapshot>>> {
        self.inner.store.entries_snapshot()
    }

    /// Look up one published entry by its key token.
    pub fn entry_by_token(&self, token: &str) -> Option<Arc<crate::model::EntrySnapshot>> {
        self.inner.store.entry_by_token(token)
    }

    /// The currently connected entry, if any.
    pub fn connected_entry(&self) -> Option<Arc<crate::model::EntrySnapshot>> {
        self.inner.store.connected_entry()
    }

    /// Subscribe to tracker notifications.
    pub fn events(&self) -> broadcast::Receiver<TrackerEvent> {
        self.inner.notify_tx.subscribe()
    }

    /// Last reported radio state.
    pub fn wifi_state(&self) -> WifiState {
        *self.inner.wifi_state.borrow()
    }

    /// Watch radio state changes.
    pub fn watch_wifi_state(&self) -> watch::Receiver<WifiState> {
        self.inner.wifi_state.subscribe()
    }

    /// One line per published entry, for diagnostics.
    pub fn verbose_summary(&self) -> String {
        let snapshots = self.inner.store.entries_snapshot();
        let mut lines: Vec<String> = snapshots
            .iter()
            .map(|s| {
                format!(
                    "{} [{}] level={} speed={:?} state={:?} saved={}",
                    s.ssid, s.security_label, s.level, s.speed, s.connected_state, s.saved,
                )
            })
            .collect();
        lines.sort();
        lines.join("\n")
    }
}

// ── Worker task ──────────────────────────────────────────────────

/// Single consumer of the platform event queue.
///
/// Coalesces event bursts into one batch, applies the batch to the
/// confined [`WorkerState`], publishes once, and broadcasts the
/// notifications. On cancellation, events already queued are still
/// applied so no accepted signal is dropped.
async fn worker_task(tracker: Tracker, mut rx: mpsc::Receiver<PlatformEvent>) {
    let cancel = tracker.inner.cancel.clone();
    let mut state = WorkerState::new(tracker.inner.config.clone());

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let mut batch = Vec::new();
                while let Ok(event) = rx.try_recv() {
                    batch.push(event);
                }
                if !batch.is_empty() {
                    apply_and_publish(&tracker, &mut state, batch);
                }
                break;
            }
            event = rx.recv() => {
                let Some(first) = event else { break };
                let mut batch = vec![first];
                while let Ok(event) = rx.try_recv() {
                    batch.push(event);
                }
                apply_and_publish(&tracker, &mut state, batch);
            }
        }
    }
}

fn apply_and_publish(tracker: &Tracker, state: &mut WorkerState, batch: Vec<PlatformEvent>) {
    let count = batch.len();
    let notifications = state.apply_batch(batch);

    state.publish(
        &tracker.inner.store,
        tracker.inner.carrier.as_deref(),
    );

    tracker
        .inner
        .eligible
        .send_if_modified(|e| std::mem::replace(e, state.eligible()) != state.eligible());
    tracker
        .inner
        .wifi_state
        .send_if_modified(|w| std::mem::replace(w, state.wifi_state()) != state.wifi_state());

    for notification in notifications {
        let _ = tracker.inner.notify_tx.send(notification);
    }
    let _ = tracker.inner.notify_tx.send(TrackerEvent::EntriesChanged);

    debug!(
        events = count,
        entries = tracker.inner.store.entry_count(),
        "batch applied"
    );
}

// ── Command processor ────────────────────────────────────────────

/// Process commands from the mpsc channel, routing each to the
/// appropriate platform call. Pending senders are dropped on shutdown,
/// which surfaces as `TrackerStopped` at the `execute` call site.
async fn command_processor_task(tracker: Tracker, mut rx: mpsc::Receiver<CommandEnvelope>) {
    let cancel = tracker.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&tracker, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

/// Route a command to the appropriate platform call.
///
/// Token-addressed commands resolve the target configuration through
/// the published snapshot; an entry with no resolved configuration is
/// not connectable.
async fn route_command(tracker: &Tracker, cmd: Command) -> Result<CommandResult, CoreError> {
    let store = &tracker.inner.store;

    match cmd {
        Command::Connect { token } => {
            let snapshot = store
                .entry_by_token(&token)
                .ok_or_else(|| CoreError::EntryNotFound {
                    token: token.clone(),
                })?;
            let network_id = snapshot
                .network_id
                .ok_or(CoreError::NotConnectable { token })?;
            tracker
                .inner
                .config_store
                .connect(network_id)
                .await
                .map_err(|e| CoreError::from_platform("connect", e))?;
            Ok(CommandResult::Ok)
        }

        Command::Disconnect { token } => {
            if store.entry_by_token(&token).is_none() {
                return Err(CoreError::EntryNotFound { token });
            }

            // Subscribe before issuing the request so the ack cannot be
            // missed between the call and the wait.
            let events = tracker.inner.notify_tx.subscribe();
            tracker
                .inner
                .config_store
                .disconnect()
                .await
                .map_err(|e| CoreError::from_platform("disconnect", e))?;

            let timeout = tracker.inner.config.disconnect_timeout;
            match tokio::time::timeout(timeout, wait_for_disconnect(events)).await {
                Ok(result) => result.map(|()| CommandResult::Ok),
                Err(_) => Err(CoreError::OperationTimedOut {
                    operation: "disconnect".to_owned(),
                    timeout_secs: timeout.as_secs(),
                }),
            }
        }

        Command::Forget { token } => {
            let snapshot = store
                .entry_by_token(&token)
                .ok_or_else(|| CoreError::EntryNotFound {
                    token: token.clone(),
                })?;
            let network_id = snapshot
                .network_id
                .ok_or(CoreError::NotConnectable { token })?;
            tracker
                .inner
                .config_store
                .forget(network_id)
                .await
                .map_err(|e| CoreError::from_platform("forget", e))?;
            Ok(CommandResult::Ok)
        }

        Command::Save { config } => {
            let network_id = tracker
                .inner
                .config_store
                .save(config)
                .await
                .map_err(|e| CoreError::from_platform("save", e))?;
            Ok(CommandResult::Saved { network_id })
        }
    }
}

/// Wait until the network loss (or an explicit disconnected transition)
/// is observed on the notification channel.
async fn wait_for_disconnect(
    mut events: broadcast::Receiver<TrackerEvent>,
) -> Result<(), CoreError> {
    loop {
        match events.recv().await {
            Ok(TrackerEvent::NetworkLost(_))
            | Ok(TrackerEvent::ConnectionChanged(ConnectedState::Disconnected)) => return Ok(()),
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "disconnect wait: notification receiver lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return Err(CoreError::TrackerStopped),
        }
    }
}

// ── Scan loop ────────────────────────────────────────────────────

/// Drive the scanner while eligible (app visible and Wi-Fi enabled):
/// one fast scan on becoming eligible for low first-paint latency, then
/// full scans on the configured interval. At most one timer exists at
/// any time; losing eligibility tears it down.
async fn scan_loop_task(tracker: Tracker) {
    let cancel = tracker.inner.cancel.clone();
    let mut eligible_rx = tracker.inner.eligible.subscribe();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            result = eligible_rx.wait_for(|eligible| *eligible) => {
                if result.is_err() {
                    return;
                }
            }
        }

        if let Err(e) = tracker.inner.scanner.request_fast_scan().await {
            warn!(error = %e, "fast scan request failed");
        }

        let mut interval = tokio::time::interval(tracker.inner.config.scan_interval);
        interval.tick().await; // consume the immediate first tick

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                result = eligible_rx.changed() => {
                    if result.is_err() {
                        return;
                    }
                    if !*eligible_rx.borrow_and_update() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    if let Err(e) = tracker.inner.scanner.request_full_scan().await {
                        warn!(error = %e, "periodic scan request failed");
                    }
                }
            }
        }
    }
}
