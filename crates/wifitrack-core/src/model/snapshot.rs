// ── Published entry views ──
//
// EntrySnapshot is the only shape the notification context ever sees:
// immutable plain data, rebuilt by the worker and published wholesale.
// Entries themselves never cross the thread boundary.

use serde::{Deserialize, Serialize};

use wifitrack_platform::{NetworkCapabilities, NetworkId};

use super::key::{EntryKey, EntryKind};

/// Signal level reported when an entry has no in-window scans and is not
/// connected.
pub const UNREACHABLE_LEVEL: i32 = -1;

const MIN_RSSI: i32 = -90;
const MAX_RSSI: i32 = -55;
const MAX_LEVEL: i32 = 4;

/// Quantize a raw RSSI into the 0..=4 display scale.
pub fn signal_level(rssi_dbm: i32) -> i32 {
    if rssi_dbm <= MIN_RSSI {
        0
    } else if rssi_dbm >= MAX_RSSI {
        MAX_LEVEL
    } else {
        (rssi_dbm - MIN_RSSI) * MAX_LEVEL / (MAX_RSSI - MIN_RSSI)
    }
}

// ── ConnectedState ──────────────────────────────────────────────────

/// Per-entry connection state machine, driven by connectivity callbacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectedState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectedState {
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

// ── Speed ───────────────────────────────────────────────────────────

/// Throughput badge derived from the score oracle.
///
/// Computed from the *average* badge across the target scan subset, not
/// a single scan, so the estimate stays stable between scan cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Speed {
    #[default]
    None,
    Slow,
    Moderate,
    Fast,
    VeryFast,
}

impl Speed {
    /// Snap an averaged badge value to the nearest bucket.
    /// Badge anchors: Slow=5, Moderate=10, Fast=20, VeryFast=30.
    pub fn from_badge(avg_badge: u32) -> Self {
        match avg_badge {
            0 => Self::None,
            1..=7 => Self::Slow,
            8..=15 => Self::Moderate,
            16..=25 => Self::Fast,
            _ => Self::VeryFast,
        }
    }
}

// ── EntrySnapshot ───────────────────────────────────────────────────

/// Immutable, presentation-ready view of one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySnapshot {
    pub key: EntryKey,
    /// Stable token, equal to `key.to_token()`; precomputed because the
    /// UI uses it as a list key on every frame.
    pub token: String,
    pub ssid: String,
    pub kind: EntryKind,

    pub security_label: String,
    pub level: i32,
    pub speed: Speed,
    pub connected_state: ConnectedState,

    /// Active-network capability flags; default when not connected.
    pub capabilities: NetworkCapabilities,

    pub saved: bool,
    pub suggested: bool,
    /// Platform id of the target config, when one exists. Command
    /// routing (connect/forget) resolves through this.
    pub network_id: Option<NetworkId>,
    /// Carrier display name for suggestion entries with an active SIM.
    pub carrier_name: Option<String>,

    /// Hotspot-only annotations.
    pub device_name: Option<String>,
    pub battery_percent: Option<u8>,
}
