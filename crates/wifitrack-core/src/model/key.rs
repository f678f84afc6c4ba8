// ── Entry identity keys ──
//
// IdentityKey pins down one logical network: SSID plus the grouped
// security-type set. EntryKey adds the discriminators that split one
// identity into distinct displayed entries (suggestion profile, network
// request flag, hotspot device id) and round-trips losslessly through a
// string token so a listener can re-locate an entry across process
// restarts.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use wifitrack_platform::{HotspotPayload, SavedConfig, ScanRecord};

use super::security::{SecurityType, grouped_types};

/// Structural prefix every serialized key token starts with.
///
/// Tokens without it are treated as a default key, never an error:
/// persisted keys must not crash a restart.
const TOKEN_PREFIX: &str = "NetworkEntry:";

// ── IdentityKey ─────────────────────────────────────────────────────

/// SSID + grouped security-type set identifying one logical network.
///
/// Equality is set equality: a key built from a SAE-only scan equals a
/// key built from a PSK config, because grouping closes over the
/// transition pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityKey {
    pub ssid: String,
    pub security_types: BTreeSet<SecurityType>,
}

impl IdentityKey {
    /// Build a grouped identity from any set of observed types.
    pub fn new(ssid: impl Into<String>, types: impl IntoIterator<Item = SecurityType>) -> Self {
        Self {
            ssid: ssid.into(),
            security_types: grouped_types(types),
        }
    }
}

impl Default for IdentityKey {
    fn default() -> Self {
        // Empty SSID, Open/OWE group: the most permissive classification,
        // so a defaulted key still resolves somewhere.
        Self::new(String::new(), [SecurityType::Open])
    }
}

// ── SuggestionProfile ───────────────────────────────────────────────

/// Discriminator for app-suggested networks: two configs with the same
/// identity but different suggestion profiles are distinct entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuggestionProfile {
    pub creator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<i32>,
}

// ── EntryKind ───────────────────────────────────────────────────────

/// Which flavor of entry a key belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    #[default]
    Standard,
    Known,
    Hotspot,
}

// ── EntryKey ────────────────────────────────────────────────────────

/// Unique key for one displayed entry.
///
/// Never changes after construction for standard entries. Hotspot keys
/// are derived fresh from the provider payload; a device-id change
/// replaces the whole key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryKey {
    #[serde(default)]
    pub kind: EntryKind,
    pub identity: IdentityKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<SuggestionProfile>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub network_request: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<Uuid>,
}

impl EntryKey {
    pub fn standard(identity: IdentityKey) -> Self {
        Self {
            kind: EntryKind::Standard,
            identity,
            ..Self::default()
        }
    }

    pub fn known(identity: IdentityKey) -> Self {
        Self {
            kind: EntryKind::Known,
            identity,
            ..Self::default()
        }
    }

    /// Key for a scan result: identity from the grouped advertised types.
    pub fn from_scan(scan: &ScanRecord) -> Self {
        Self::standard(IdentityKey::new(
            scan.ssid.clone(),
            SecurityType::of_scan(scan),
        ))
    }

    /// Key for a saved config: identity from the single config type
    /// (grouped), plus the suggestion/request discriminators.
    pub fn from_config(config: &SavedConfig) -> Self {
        let security = SecurityType::from_key_management(config.key_mgmt, config.wep_keys_present);
        let suggestion = config.from_suggestion.then(|| SuggestionProfile {
            creator: config.creator.clone().unwrap_or_default(),
            carrier_id: config.carrier_id,
            subscription_id: config.subscription_id,
        });

        Self {
            kind: EntryKind::Standard,
            identity: IdentityKey::new(config.ssid.clone(), [security]),
            suggestion,
            network_request: config.from_network_specifier,
            device_id: None,
        }
    }

    /// Key for a hotspot payload. The device id is the authoritative
    /// identity component.
    pub fn from_hotspot(payload: &HotspotPayload) -> Self {
        let security = SecurityType::from_key_management(payload.key_mgmt, false);
        Self {
            kind: EntryKind::Hotspot,
            identity: IdentityKey::new(payload.ssid.clone(), [security]),
            suggestion: None,
            network_request: false,
            device_id: Some(payload.device_id),
        }
    }

    pub fn ssid(&self) -> &str {
        &self.identity.ssid
    }

    pub fn security_types(&self) -> &BTreeSet<SecurityType> {
        &self.identity.security_types
    }

    // ── Token round-trip ─────────────────────────────────────────────

    /// Serialize to the stable string token.
    ///
    /// The body is JSON so SSIDs containing arbitrary characters (commas,
    /// colons, quotes) survive the round trip.
    pub fn to_token(&self) -> String {
        match serde_json::to_string(self) {
            Ok(body) => format!("{TOKEN_PREFIX}{body}"),
            // Unreachable for this type; keep the prefix so a reparse
            // lands on the default key instead of tripping the prefix check.
            Err(_) => format!("{TOKEN_PREFIX}{{}}"),
        }
    }

    /// Parse a token produced by [`to_token`](Self::to_token).
    ///
    /// Malformed input yields `EntryKey::default()` with a logged warning,
    /// never an error.
    pub fn from_token(token: &str) -> Self {
        let Some(body) = token.strip_prefix(TOKEN_PREFIX) else {
            warn!(token, "entry key token missing structural prefix, using default key");
            return Self::default();
        };
        match serde_json::from_str(body) {
            Ok(key) => key,
            Err(e) => {
                warn!(token, error = %e, "malformed entry key token, using default key");
                Self::default()
            }
        }
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_token())
    }
}
