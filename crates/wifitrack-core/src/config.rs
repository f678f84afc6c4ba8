// ── Tracker configuration ──
//
// Built by the embedder and handed to `Tracker::new` -- the core never
// reads files or global state. The verbose flag lives here instead of a
// process-wide static so tests and multiple trackers can differ.

use std::time::Duration;

use crate::model::SecurityType;

/// Which optional security features this device's radio/supplicant supports.
///
/// Unsupported types are filtered out of target-resolution candidates
/// (except in the final full-key fallback, which is unfiltered).
#[derive(Debug, Clone, Copy)]
pub struct PlatformCompat {
    pub sae_supported: bool,
    pub owe_supported: bool,
    pub suite_b_supported: bool,
    pub wpa3_enterprise_supported: bool,
}

impl PlatformCompat {
    pub fn supports(&self, security: SecurityType) -> bool {
        match security {
            SecurityType::Sae => self.sae_supported,
            SecurityType::Owe => self.owe_supported,
            SecurityType::EapSuiteB => self.suite_b_supported,
            SecurityType::EapWpa3Enterprise => self.wpa3_enterprise_supported,
            SecurityType::Open | SecurityType::Wep | SecurityType::Psk | SecurityType::Eap => true,
        }
    }
}

impl Default for PlatformCompat {
    fn default() -> Self {
        Self {
            sae_supported: true,
            owe_supported: true,
            suite_b_supported: true,
            wpa3_enterprise_supported: true,
        }
    }
}

/// Configuration for a single [`Tracker`](crate::Tracker) instance.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Eviction horizon for cached scan records.
    pub max_scan_age: Duration,
    /// Interval between repeating full-band scans once eligible.
    pub scan_interval: Duration,
    /// Bounded wait for the network-lost acknowledgment after a
    /// disconnect request.
    pub disconnect_timeout: Duration,
    /// Security feature support toggles.
    pub compat: PlatformCompat,
    /// Emit per-entry diagnostic summaries.
    pub verbose: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_scan_age: Duration::from_secs(15 * 60),
            scan_interval: Duration::from_secs(10),
            disconnect_timeout: Duration::from_secs(10),
            compat: PlatformCompat::default(),
            verbose: false,
        }
    }
}
