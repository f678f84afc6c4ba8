// wifitrack-platform: the narrow seam between wifitrack-core and the host OS.
//
// Everything the platform *provides* lives here: raw scan results, saved
// configuration records, connection info, and the operation traits the
// tracker calls back into. Nothing in this crate derives state -- derived
// entry state is wifitrack-core's job.

pub mod error;
pub mod source;
pub mod types;

pub use error::PlatformError;
pub use source::{CarrierLookup, ConfigStore, Scanner};
pub use types::{
    Bssid, ConnectionInfo, HotspotPayload, KeyManagement, NetworkCapabilities, NetworkId,
    SavedConfig, ScanRecord, ScoredNetwork, WifiState,
};
