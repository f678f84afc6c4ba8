// ── Event types ──
//
// PlatformEvent is the inbound demultiplexing surface: every platform
// broadcast/callback becomes one typed event on the worker queue.
// TrackerEvent is the outbound notification, batched per worker task.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use wifitrack_platform::{
    ConnectionInfo, HotspotPayload, NetworkId, SavedConfig, ScanRecord, ScoredNetwork, WifiState,
};

use crate::error::CoreError;
use crate::model::ConnectedState;

/// Inbound platform signals, applied in submission order by the worker.
#[derive(Debug, Clone)]
pub enum PlatformEvent {
    /// A scan cycle finished and produced results.
    ScanResults {
        records: Vec<ScanRecord>,
        observed_at: DateTime<Utc>,
    },
    /// A scan cycle finished without results. Still advances the cache
    /// clock so stale records age out.
    ScanFailed { observed_at: DateTime<Utc> },
    ConfigsChanged { configs: Vec<SavedConfig> },
    ConnectionChanged {
        info: ConnectionInfo,
        state: ConnectedState,
    },
    NetworkLost { network_id: NetworkId },
    ScoresChanged { scores: Vec<ScoredNetwork> },
    WifiStateChanged { state: WifiState },
    HotspotsChanged { payloads: Vec<HotspotPayload> },
    /// App moved to/from the foreground (affects scan eligibility only).
    VisibilityChanged { visible: bool },
}

/// Outbound notifications, fired on the listener context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    /// At least one observable entry attribute changed; read the store.
    EntriesChanged,
    WifiStateChanged(WifiState),
    ConnectionChanged(ConnectedState),
    NetworkLost(NetworkId),
}

/// Cloneable handle the embedder uses to push platform signals in.
#[derive(Clone)]
pub struct PlatformHandle {
    pub(crate) tx: mpsc::Sender<PlatformEvent>,
}

impl PlatformHandle {
    /// Deliver one platform event to the worker queue.
    pub async fn deliver(&self, event: PlatformEvent) -> Result<(), CoreError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| CoreError::TrackerStopped)
    }
}
