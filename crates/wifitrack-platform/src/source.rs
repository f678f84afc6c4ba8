// ── Platform operation traits ──
//
// The tracker calls back into the host OS through these. Scan results,
// connection info, and score updates flow the other way, pushed into the
// tracker's event channel by the embedder -- see wifitrack-core's
// PlatformEvent.

use async_trait::async_trait;

use crate::error::PlatformError;
use crate::types::{NetworkId, SavedConfig};

/// Low-level scanner control.
///
/// Both methods only *request* a scan; results are delivered asynchronously
/// as a scan-results event once the radio finishes the cycle.
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Request a fast dual-band scan (low latency, reduced channel set).
    async fn request_fast_scan(&self) -> Result<(), PlatformError>;

    /// Request a full-band scan.
    async fn request_full_scan(&self) -> Result<(), PlatformError>;
}

/// Persisted network profile store.
///
/// Operations are keyed by the opaque [`NetworkId`]. Failures come back
/// as `Err` from the future -- never through a separate callback.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn saved_configs(&self) -> Result<Vec<SavedConfig>, PlatformError>;

    async fn connect(&self, id: NetworkId) -> Result<(), PlatformError>;

    /// Disconnect from the current network. Completion of the future means
    /// the request was accepted; the actual network loss arrives later as
    /// a connectivity event.
    async fn disconnect(&self) -> Result<(), PlatformError>;

    async fn forget(&self, id: NetworkId) -> Result<(), PlatformError>;

    async fn save(&self, config: SavedConfig) -> Result<NetworkId, PlatformError>;
}

/// Carrier/subscription lookup, used only for label composition.
pub trait CarrierLookup: Send + Sync {
    fn has_active_sim(&self, carrier_id: i32) -> bool;

    fn display_name(&self, carrier_id: i32) -> Option<String>;
}
