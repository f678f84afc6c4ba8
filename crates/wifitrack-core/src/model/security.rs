// ── Security classification ──
//
// Converts raw capability advertisements and saved-config key-management
// bits into the coarse `SecurityType` taxonomy, and groups the
// transition-compatible pairs into one identity. A second, finer layer
// (`advertised_label`) reads the WPA sub-variant straight from the
// capability string for display.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use wifitrack_platform::{KeyManagement, ScanRecord};

/// Coarse security classification of a network.
///
/// The declaration order is the one fixed total rank order used by
/// target-resolution tie-breaks: lower ranks are broader-compatibility.
/// The only special case layered on top is OWE-over-Open (see
/// `entry::resolve`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
)]
pub enum SecurityType {
    #[strum(serialize = "Open")]
    Open,
    #[strum(serialize = "Enhanced Open")]
    Owe,
    #[strum(serialize = "WEP")]
    Wep,
    #[strum(serialize = "WPA2-Personal")]
    Psk,
    #[strum(serialize = "WPA3-Personal")]
    Sae,
    #[strum(serialize = "WPA/WPA2-Enterprise")]
    Eap,
    #[strum(serialize = "WPA3-Enterprise 192-bit")]
    EapSuiteB,
    #[strum(serialize = "WPA3-Enterprise")]
    EapWpa3Enterprise,
}

impl SecurityType {
    /// Classify a raw capability advertisement.
    ///
    /// First match wins; outcomes are mutually exclusive. A scan with no
    /// recognizable (or no) capability string classifies as Open -- an
    /// entry must always have *some* valid classification.
    pub fn from_capabilities(caps: &str) -> Vec<SecurityType> {
        let psk = caps.contains("PSK");
        let sae = caps.contains("SAE");

        if psk && sae {
            return vec![Self::Psk, Self::Sae];
        }
        // OWE_TRANSITION contains "OWE"; check the transition marker first.
        if caps.contains("OWE_TRANSITION") {
            return vec![Self::Open, Self::Owe];
        }
        if caps.contains("OWE") {
            return vec![Self::Owe];
        }
        if caps.contains("WEP") {
            return vec![Self::Wep];
        }
        if sae {
            return vec![Self::Sae];
        }
        if psk {
            return vec![Self::Psk];
        }
        // EAP_SUITE_B_192 contains "EAP"; check the longer marker first.
        if caps.contains("EAP_SUITE_B_192") {
            return vec![Self::EapSuiteB];
        }
        if caps.contains("EAP") {
            return vec![Self::Eap];
        }
        vec![Self::Open]
    }

    pub fn of_scan(scan: &ScanRecord) -> Vec<SecurityType> {
        Self::from_capabilities(&scan.capabilities)
    }

    /// Classify key-management bits. Exactly one result: saved configs
    /// and active connections are single-security in this model.
    pub fn from_key_management(km: KeyManagement, wep_keys_present: bool) -> SecurityType {
        if km.sae {
            Self::Sae
        } else if km.psk {
            Self::Psk
        } else if km.suite_b_192 {
            Self::EapSuiteB
        } else if km.eap || km.ieee8021x {
            Self::Eap
        } else if km.owe {
            Self::Owe
        } else if wep_keys_present {
            Self::Wep
        } else {
            Self::Open
        }
    }

    /// The transition-mode partner that shares an identity with this type,
    /// if any. Symmetric by construction.
    pub fn grouped_partner(self) -> Option<SecurityType> {
        match self {
            Self::Open => Some(Self::Owe),
            Self::Owe => Some(Self::Open),
            Self::Psk => Some(Self::Sae),
            Self::Sae => Some(Self::Psk),
            Self::Eap => Some(Self::EapWpa3Enterprise),
            Self::EapWpa3Enterprise => Some(Self::Eap),
            Self::Wep | Self::EapSuiteB => None,
        }
    }
}

/// Close a set of security types once over the grouped pairs.
///
/// Single hop only: each input type adds at most its own partner; the
/// expansion is not applied recursively to the added partners (the pairs
/// are symmetric, so one hop already reaches the fixpoint).
pub fn grouped_types(types: impl IntoIterator<Item = SecurityType>) -> BTreeSet<SecurityType> {
    let mut out = BTreeSet::new();
    for t in types {
        out.insert(t);
        if let Some(partner) = t.grouped_partner() {
            out.insert(partner);
        }
    }
    out
}

/// Human security label from the *advertised* WPA sub-variant.
///
/// A finer classification than `SecurityType`, read straight from the
/// best scan's capability string so transition APs show both modes.
pub fn advertised_label(caps: &str) -> &'static str {
    let psk = caps.contains("PSK");
    let sae = caps.contains("SAE");

    if caps.contains("WEP") {
        return "WEP";
    }
    if psk && sae {
        return "WPA2/WPA3-Personal";
    }
    if sae {
        return "WPA3-Personal";
    }
    if psk {
        let wpa1 = caps.contains("WPA-PSK");
        let wpa2 = caps.contains("WPA2-PSK") || caps.contains("RSN-PSK");
        return match (wpa1, wpa2) {
            (true, true) => "WPA/WPA2-Personal",
            (true, false) => "WPA-Personal",
            _ => "WPA2-Personal",
        };
    }
    if caps.contains("OWE_TRANSITION") {
        return "Open / Enhanced Open";
    }
    if caps.contains("OWE") {
        return "Enhanced Open";
    }
    if caps.contains("EAP_SUITE_B_192") {
        return "WPA3-Enterprise 192-bit";
    }
    if caps.contains("EAP") {
        if caps.contains("RSN-EAP") {
            return "WPA2-Enterprise";
        }
        return "WPA-Enterprise";
    }
    "Open"
}
