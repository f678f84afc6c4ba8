// ── Raw platform payload types ──
//
// These are the inputs the host OS hands to the tracker: scan results,
// saved configuration records, active-connection info, score updates.
// All of them are immutable once delivered; classification happens in
// wifitrack-core.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ── NetworkId ───────────────────────────────────────────────────────

/// Opaque platform identifier for a saved network profile.
///
/// The config store keys connect/forget/save operations by this id;
/// the core never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkId(pub i64);

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Bssid ───────────────────────────────────────────────────────────

/// BSSID, normalized to lowercase colon-separated format (aa:bb:cc:dd:ee:ff).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bssid(String);

impl Bssid {
    /// Create a normalized BSSID from any common format.
    /// Accepts colon-separated, dash-separated, or bare hex.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalized = raw.as_ref().to_lowercase().replace('-', ":");
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Bssid {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

// ── WifiState ───────────────────────────────────────────────────────

/// Radio state reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WifiState {
    Disabled,
    Enabling,
    Enabled,
    Disabling,
}

impl WifiState {
    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

// ── ScanRecord ──────────────────────────────────────────────────────

/// A single access-point observation from one scan cycle.
///
/// The capability string is the raw security advertisement exactly as
/// the radio reported it (e.g. `"[WPA2-PSK-CCMP][RSN-SAE-CCMP][ESS]"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub ssid: String,
    pub bssid: Bssid,
    pub capabilities: String,
    pub rssi_dbm: i32,
    pub frequency_mhz: u32,
    pub timestamp: DateTime<Utc>,
}

// ── KeyManagement ───────────────────────────────────────────────────

/// Key-management bits of a saved configuration or active connection.
///
/// Mirrors the platform's allowed-key-management flags; the core derives
/// a single `SecurityType` from these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyManagement {
    pub sae: bool,
    pub psk: bool,
    pub suite_b_192: bool,
    pub eap: bool,
    pub ieee8021x: bool,
    pub owe: bool,
}

impl KeyManagement {
    pub fn psk() -> Self {
        Self { psk: true, ..Self::default() }
    }

    pub fn sae() -> Self {
        Self { sae: true, ..Self::default() }
    }

    pub fn eap() -> Self {
        Self { eap: true, ..Self::default() }
    }

    pub fn owe() -> Self {
        Self { owe: true, ..Self::default() }
    }

    /// Open network: no key management bits at all.
    pub fn open() -> Self {
        Self::default()
    }
}

// ── SavedConfig ─────────────────────────────────────────────────────

/// A persisted credential/profile record from the platform config store.
///
/// Always classifies to exactly one security type. The passphrase is
/// never serialized and never logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedConfig {
    pub network_id: NetworkId,
    pub ssid: String,
    pub key_mgmt: KeyManagement,
    pub wep_keys_present: bool,

    #[serde(skip)]
    pub passphrase: Option<SecretString>,

    /// Added by an app suggestion rather than the user.
    pub from_suggestion: bool,
    /// Created for a scoped network request (peer-to-peer style).
    pub from_network_specifier: bool,

    /// Package name of the creator (meaningful for suggestions).
    pub creator: Option<String>,
    pub carrier_id: Option<i32>,
    pub subscription_id: Option<i32>,
}

impl SavedConfig {
    /// Minimal plain-saved config, useful as a builder base.
    pub fn new(network_id: NetworkId, ssid: impl Into<String>, key_mgmt: KeyManagement) -> Self {
        Self {
            network_id,
            ssid: ssid.into(),
            key_mgmt,
            wep_keys_present: false,
            passphrase: None,
            from_suggestion: false,
            from_network_specifier: false,
            creator: None,
            carrier_id: None,
            subscription_id: None,
        }
    }
}

// ── NetworkCapabilities ─────────────────────────────────────────────

/// Capability flags for the active network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCapabilities {
    pub validated: bool,
    pub captive_portal: bool,
    pub metered: bool,
    pub low_quality: bool,
}

// ── ConnectionInfo ──────────────────────────────────────────────────

/// Live info about the currently associated network.
///
/// Delivered by connectivity callbacks; `rssi_dbm` and `link_speed_mbps`
/// are live radio link stats, not scan-derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub ssid: String,
    pub bssid: Bssid,
    pub network_id: NetworkId,
    pub key_mgmt: KeyManagement,
    pub rssi_dbm: i32,
    pub link_speed_mbps: u32,
    pub capabilities: NetworkCapabilities,
}

// ── HotspotPayload ──────────────────────────────────────────────────

/// Provider payload describing a phone-hotspot network.
///
/// The device id is the authoritative identity: a payload with a new id
/// is a different hotspot even if the SSID matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotPayload {
    pub device_id: Uuid,
    pub device_name: String,
    pub ssid: String,
    pub key_mgmt: KeyManagement,
    /// Provider-reported connection strength, already quantized 0..=4.
    pub connection_level: i32,
    pub battery_percent: Option<u8>,
}

// ── ScoredNetwork ───────────────────────────────────────────────────

/// Historical throughput badge for one (SSID, BSSID) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredNetwork {
    pub ssid: String,
    pub bssid: Bssid,
    /// Throughput badge value in Mbps-equivalent buckets; 0 = unscored.
    pub badge: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bssid_normalizes_dashes() {
        let bssid = Bssid::new("AA-BB-CC-DD-EE-FF");
        assert_eq!(bssid.as_str(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn bssid_normalizes_case() {
        let bssid = Bssid::new("AA:BB:CC:DD:EE:FF");
        assert_eq!(bssid.as_str(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn bssid_from_str() {
        let bssid: Bssid = "AA-BB-CC-DD-EE-FF".parse().unwrap();
        assert_eq!(bssid.to_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn saved_config_passphrase_not_serialized() {
        let mut config = SavedConfig::new(NetworkId(7), "Home", KeyManagement::psk());
        config.passphrase = Some(SecretString::from("hunter2".to_owned()));
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
    }
}
