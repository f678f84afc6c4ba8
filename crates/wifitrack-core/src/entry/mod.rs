// ── Network entries ──
//
// One NetworkEntry per EntryKey, aggregating the scans, configs, and
// connection info that match its identity and deriving the
// presentation-ready fields the UI reads. One entry kind enum instead of
// an inheritance chain; per-kind differences live in small match arms.
//
// Invariant: the scan and config maps are cleared and rebuilt wholesale
// on every update call, never patched incrementally, so no stale records
// survive a security-type regrouping.

mod resolve;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use wifitrack_platform::{
    Bssid, CarrierLookup, ConnectionInfo, HotspotPayload, NetworkCapabilities, SavedConfig,
    ScanRecord,
};

use crate::config::PlatformCompat;
use crate::error::CoreError;
use crate::model::{
    ConnectedState, EntryKey, EntryKind, EntrySnapshot, IdentityKey, SecurityType, Speed,
    UNREACHABLE_LEVEL, advertised_label, grouped_types, signal_level,
};

use resolve::{candidate_types, choose_target, target_scans};

/// Score-oracle view: (SSID, BSSID) -> throughput badge.
pub type ScoreBoard = HashMap<(String, Bssid), u32>;

pub struct NetworkEntry {
    key: EntryKey,
    compat: PlatformCompat,

    scans_by_security: BTreeMap<SecurityType, Vec<Arc<ScanRecord>>>,
    configs_by_security: BTreeMap<SecurityType, SavedConfig>,

    // Resolved target, recomputed whenever either map or the connection
    // changes. UI-facing getters read these, never the raw maps.
    target_candidates: BTreeSet<SecurityType>,
    target_security: Option<SecurityType>,
    target_scans: Vec<Arc<ScanRecord>>,

    connection: Option<ConnectionInfo>,
    connected_state: ConnectedState,

    level: i32,
    speed: Speed,

    // Hotspot-only provider fields.
    device_name: Option<String>,
    battery_percent: Option<u8>,
    provider_level: Option<i32>,
}

impl NetworkEntry {
    /// Entry for a standard (scanned and/or saved) network.
    pub fn standard(key: EntryKey, compat: PlatformCompat) -> Self {
        Self::empty(key, compat)
    }

    /// Entry representing a saved network independent of scan presence.
    pub fn known(config: &SavedConfig, compat: PlatformCompat) -> Self {
        let security = SecurityType::from_key_management(config.key_mgmt, config.wep_keys_present);
        let key = EntryKey::known(IdentityKey::new(config.ssid.clone(), [security]));
        let mut entry = Self::empty(key, compat);
        entry.configs_by_security.insert(security, config.clone());
        entry.resolve();
        entry
    }

    /// Entry for a phone-hotspot provider payload.
    pub fn hotspot(payload: &HotspotPayload, compat: PlatformCompat) -> Self {
        let mut entry = Self::empty(EntryKey::from_hotspot(payload), compat);
        entry.apply_hotspot_payload(payload);
        entry
    }

    fn empty(key: EntryKey, compat: PlatformCompat) -> Self {
        let mut entry = Self {
            key,
            compat,
            scans_by_security: BTreeMap::new(),
            configs_by_security: BTreeMap::new(),
            target_candidates: BTreeSet::new(),
            target_security: None,
            target_scans: Vec::new(),
            connection: None,
            connected_state: ConnectedState::Disconnected,
            level: UNREACHABLE_LEVEL,
            speed: Speed::None,
            device_name: None,
            battery_percent: None,
            provider_level: None,
        };
        entry.resolve();
        entry
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn key(&self) -> &EntryKey {
        &self.key
    }

    pub fn kind(&self) -> EntryKind {
        self.key.kind
    }

    pub fn token(&self) -> String {
        self.key.to_token()
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn connected_state(&self) -> ConnectedState {
        self.connected_state
    }

    pub fn target_security(&self) -> Option<SecurityType> {
        self.target_security
    }

    /// The scans backing the current target, newest resolution.
    pub fn target_scan_results(&self) -> &[Arc<ScanRecord>] {
        &self.target_scans
    }

    /// The config the target resolves to, if any.
    pub fn target_config(&self) -> Option<&SavedConfig> {
        self.target_security
            .and_then(|t| self.configs_by_security.get(&t))
    }

    pub fn is_saved(&self) -> bool {
        self.configs_by_security
            .values()
            .any(|c| !c.from_suggestion && !c.from_network_specifier)
    }

    /// Human security label from the best target scan's advertisement,
    /// falling back to the coarse target type when nothing is in range.
    pub fn security_label(&self) -> String {
        match self.best_target_scan() {
            Some(scan) => advertised_label(&scan.capabilities).to_owned(),
            None => self
                .target_security
                .unwrap_or(SecurityType::Open)
                .to_string(),
        }
    }

    // ── Updates (worker-confined) ────────────────────────────────────

    /// Replace the matching-scans map from a fresh batch.
    ///
    /// Every input must carry this entry's SSID; a mismatch is a caller
    /// contract violation and fails fast before any mutation.
    pub fn update_scans(&mut self, scans: Vec<Arc<ScanRecord>>) -> Result<(), CoreError> {
        if let Some(bad) = scans.iter().find(|s| s.ssid != self.key.ssid()) {
            return Err(CoreError::SsidMismatch {
                expected: self.key.ssid().to_owned(),
                got: bad.ssid.clone(),
            });
        }

        self.scans_by_security.clear();
        for scan in scans {
            for t in grouped_types(SecurityType::of_scan(&scan)) {
                if self.key.security_types().contains(&t) {
                    self.scans_by_security
                        .entry(t)
                        .or_default()
                        .push(Arc::clone(&scan));
                }
            }
        }

        self.resolve();
        Ok(())
    }

    /// Replace the matching-configs map from the current saved list.
    pub fn update_configs(&mut self, configs: Vec<SavedConfig>) -> Result<(), CoreError> {
        if let Some(bad) = configs.iter().find(|c| c.ssid != self.key.ssid()) {
            return Err(CoreError::SsidMismatch {
                expected: self.key.ssid().to_owned(),
                got: bad.ssid.clone(),
            });
        }

        self.configs_by_security.clear();
        for config in configs {
            let t = SecurityType::from_key_management(config.key_mgmt, config.wep_keys_present);
            self.configs_by_security.insert(t, config);
        }

        self.resolve();
        Ok(())
    }

    /// Apply the current platform connection, if it belongs to this entry.
    pub fn update_connection(&mut self, connection: Option<(&ConnectionInfo, ConnectedState)>) {
        match connection {
            Some((info, state)) if self.matches_connection(info) => {
                self.connection = Some(info.clone());
                self.connected_state = state;
            }
            _ => {
                self.connection = None;
                self.connected_state = ConnectedState::Disconnected;
            }
        }
        self.resolve();
    }

    /// Refresh the speed estimate from the score oracle.
    ///
    /// Never touches a Connected entry: live link stats take precedence
    /// and must not flicker when scan sets change.
    pub fn update_speed(&mut self, scores: &ScoreBoard) {
        if self.connected_state.is_connected() {
            return;
        }
        let badges: Vec<u32> = self
            .target_scans
            .iter()
            .filter_map(|s| scores.get(&(s.ssid.clone(), s.bssid.clone())).copied())
            .filter(|b| *b > 0)
            .collect();
        self.speed = if badges.is_empty() {
            Speed::None
        } else {
            let count = u32::try_from(badges.len()).unwrap_or(1);
            Speed::from_badge(badges.iter().sum::<u32>() / count)
        };
    }

    /// Re-derive the whole entry from a new hotspot payload. The payload
    /// is the authoritative source of the key: a changed device id
    /// replaces the identity outright.
    pub fn update_hotspot(&mut self, payload: &HotspotPayload) {
        self.key = EntryKey::from_hotspot(payload);
        self.apply_hotspot_payload(payload);
    }

    // ── Internals ────────────────────────────────────────────────────

    fn apply_hotspot_payload(&mut self, payload: &HotspotPayload) {
        self.device_name = Some(payload.device_name.clone());
        self.battery_percent = payload.battery_percent;
        self.provider_level = Some(payload.connection_level);
        self.resolve();
    }

    fn matches_connection(&self, info: &ConnectionInfo) -> bool {
        match self.key.kind {
            EntryKind::Standard | EntryKind::Known => {
                if self
                    .configs_by_security
                    .values()
                    .any(|c| c.network_id == info.network_id)
                {
                    return true;
                }
                info.ssid == self.key.ssid()
                    && self
                        .key
                        .security_types()
                        .contains(&SecurityType::from_key_management(info.key_mgmt, false))
            }
            EntryKind::Hotspot => info.ssid == self.key.ssid(),
        }
    }

    /// Recompute the resolved target and scan-derived level. Runs after
    /// every map or connection change; read/write ordering matters, so
    /// getters only ever see a fully recomputed state.
    fn resolve(&mut self) {
        let connected_type = self
            .connection
            .as_ref()
            .map(|i| SecurityType::from_key_management(i.key_mgmt, false));

        self.target_candidates = candidate_types(
            self.key.security_types(),
            &self.scans_by_security,
            &self.configs_by_security,
            connected_type,
            &self.compat,
        );
        self.target_security = choose_target(&self.target_candidates);
        self.target_scans = target_scans(&self.target_candidates, &self.scans_by_security);
        self.recompute_level();
    }

    fn recompute_level(&mut self) {
        if self.connected_state.is_connected() {
            // Live link stats win while connected.
            if let Some(info) = &self.connection {
                self.level = signal_level(info.rssi_dbm);
                self.speed = Speed::from_badge(info.link_speed_mbps);
            }
            return;
        }
        if self.key.kind == EntryKind::Hotspot {
            self.level = self.provider_level.unwrap_or(UNREACHABLE_LEVEL);
            return;
        }
        self.level = self
            .best_target_scan()
            .map_or(UNREACHABLE_LEVEL, |s| signal_level(s.rssi_dbm));
    }

    fn best_target_scan(&self) -> Option<&Arc<ScanRecord>> {
        self.target_scans.iter().max_by_key(|s| s.rssi_dbm)
    }

    // ── Published view ───────────────────────────────────────────────

    /// Build the immutable snapshot the notification context receives.
    pub fn snapshot(&self, carrier: Option<&dyn CarrierLookup>) -> EntrySnapshot {
        let carrier_name = self.key.suggestion.as_ref().and_then(|s| {
            let id = s.carrier_id?;
            let lookup = carrier?;
            lookup.has_active_sim(id).then(|| lookup.display_name(id))?
        });

        EntrySnapshot {
            key: self.key.clone(),
            token: self.key.to_token(),
            ssid: self.key.ssid().to_owned(),
            kind: self.key.kind,
            security_label: self.security_label(),
            level: self.level,
            speed: self.speed,
            connected_state: self.connected_state,
            capabilities: self
                .connection
                .as_ref()
                .map_or_else(NetworkCapabilities::default, |i| i.capabilities),
            saved: self.is_saved(),
            suggested: self.key.suggestion.is_some(),
            network_id: self.target_config().map(|c| c.network_id),
            carrier_name,
            device_name: self.device_name.clone(),
            battery_percent: self.battery_percent,
        }
    }

    /// One-line diagnostic summary for verbose dumps.
    pub fn verbose_summary(&self) -> String {
        format!(
            "{} kind={:?} target={:?} candidates={:?} scans={} configs={} level={} speed={:?} state={:?}",
            self.key.ssid(),
            self.key.kind,
            self.target_security,
            self.target_candidates,
            self.target_scans.len(),
            self.configs_by_security.len(),
            self.level,
            self.speed,
            self.connected_state,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wifitrack_platform::{KeyManagement, NetworkCapabilities, NetworkId};

    fn scan(ssid: &str, bssid: &str, caps: &str, rssi: i32) -> Arc<ScanRecord> {
        Arc::new(ScanRecord {
            ssid: ssid.to_owned(),
            bssid: Bssid::new(bssid),
            capabilities: caps.to_owned(),
            rssi_dbm: rssi,
            frequency_mhz: 5180,
            timestamp: chrono::Utc::now(),
        })
    }

    fn psk_entry(ssid: &str) -> NetworkEntry {
        let key = EntryKey::standard(IdentityKey::new(ssid, [SecurityType::Psk]));
        NetworkEntry::standard(key, PlatformCompat::default())
    }

    fn connection(ssid: &str, km: KeyManagement, rssi: i32) -> ConnectionInfo {
        ConnectionInfo {
            ssid: ssid.to_owned(),
            bssid: Bssid::new("aa:bb:cc:dd:ee:ff"),
            network_id: NetworkId(7),
            key_mgmt: km,
            rssi_dbm: rssi,
            link_speed_mbps: 433,
            capabilities: NetworkCapabilities {
                validated: true,
                ..NetworkCapabilities::default()
            },
        }
    }

    #[test]
    fn wrong_ssid_scan_fails_fast() {
        let mut entry = psk_entry("Home");
        let err = entry
            .update_scans(vec![scan("Other", "aa:aa:aa:aa:aa:aa", "[WPA2-PSK-CCMP]", -60)])
            .unwrap_err();
        assert!(matches!(err, CoreError::SsidMismatch { .. }));
        // Fail fast means no partial mutation either.
        assert!(entry.target_scan_results().is_empty());
    }

    #[test]
    fn wrong_ssid_config_fails_fast() {
        let mut entry = psk_entry("Home");
        let err = entry
            .update_configs(vec![SavedConfig::new(NetworkId(1), "Other", KeyManagement::psk())])
            .unwrap_err();
        assert!(matches!(err, CoreError::SsidMismatch { .. }));
    }

    #[test]
    fn scan_maps_rebuilt_wholesale() {
        let mut entry = psk_entry("Home");
        entry
            .update_scans(vec![
                scan("Home", "aa:aa:aa:aa:aa:aa", "[WPA2-PSK-CCMP]", -60),
                scan("Home", "bb:bb:bb:bb:bb:bb", "[RSN-SAE-CCMP]", -70),
            ])
            .unwrap();
        assert_eq!(entry.target_scan_results().len(), 2);

        // Second delivery with one record: the other must be gone.
        entry
            .update_scans(vec![scan("Home", "aa:aa:aa:aa:aa:aa", "[WPA2-PSK-CCMP]", -60)])
            .unwrap();
        assert_eq!(entry.target_scan_results().len(), 1);
    }

    #[test]
    fn identical_updates_are_idempotent() {
        let mut entry = psk_entry("Home");
        let batch = vec![
            scan("Home", "aa:aa:aa:aa:aa:aa", "[WPA2-PSK+SAE-CCMP]", -58),
            scan("Home", "bb:bb:bb:bb:bb:bb", "[RSN-SAE-CCMP]", -72),
        ];

        entry.update_scans(batch.clone()).unwrap();
        let target = entry.target_security();
        let level = entry.level();

        entry.update_scans(batch).unwrap();
        assert_eq!(entry.target_security(), target);
        assert_eq!(entry.level(), level);
    }

    #[test]
    fn grouped_scan_lands_under_both_types() {
        let mut entry = psk_entry("Home");
        // A transition AP advertises PSK+SAE; the one scan backs both
        // candidates but the subset stays deduplicated.
        entry
            .update_scans(vec![scan("Home", "aa:aa:aa:aa:aa:aa", "[WPA2-PSK+SAE-CCMP]", -58)])
            .unwrap();
        assert_eq!(entry.target_security(), Some(SecurityType::Psk));
        assert_eq!(entry.target_scan_results().len(), 1);
    }

    #[test]
    fn connection_override_beats_scan_heuristics() {
        let mut entry = psk_entry("Home");
        entry
            .update_scans(vec![scan("Home", "aa:aa:aa:aa:aa:aa", "[WPA2-PSK-CCMP]", -60)])
            .unwrap();
        assert_eq!(entry.target_security(), Some(SecurityType::Psk));

        let info = connection("Home", KeyManagement::sae(), -50);
        entry.update_connection(Some((&info, ConnectedState::Connected)));
        assert_eq!(entry.target_security(), Some(SecurityType::Sae));
        assert_eq!(entry.connected_state(), ConnectedState::Connected);
    }

    #[test]
    fn connected_entry_ignores_scan_level_and_speed() {
        let mut entry = psk_entry("Home");
        let info = connection("Home", KeyManagement::psk(), -56);
        entry.update_connection(Some((&info, ConnectedState::Connected)));
        let connected_level = entry.level();
        let connected_speed = entry.speed();
        assert_eq!(connected_speed, Speed::VeryFast);

        // Weak scans arriving must not disturb live link estimates.
        entry
            .update_scans(vec![scan("Home", "aa:aa:aa:aa:aa:aa", "[WPA2-PSK-CCMP]", -89)])
            .unwrap();
        entry.update_speed(&ScoreBoard::new());
        assert_eq!(entry.level(), connected_level);
        assert_eq!(entry.speed(), connected_speed);
    }

    #[test]
    fn network_lost_resumes_scan_estimates() {
        // End-to-end scenario C: connected via EAP, then lost.
        let key = EntryKey::standard(IdentityKey::new("Corp", [SecurityType::Eap]));
        let mut entry = NetworkEntry::standard(key, PlatformCompat::default());
        entry
            .update_scans(vec![scan("Corp", "aa:aa:aa:aa:aa:aa", "[RSN-EAP-CCMP]", -65)])
            .unwrap();

        let info = connection("Corp", KeyManagement::eap(), -40);
        entry.update_connection(Some((&info, ConnectedState::Connected)));
        assert_eq!(entry.level(), signal_level(-40));

        entry.update_connection(None);
        assert_eq!(entry.connected_state(), ConnectedState::Disconnected);
        assert_eq!(entry.level(), signal_level(-65));
    }

    #[test]
    fn unreachable_without_scans_or_connection() {
        let entry = psk_entry("Home");
        assert_eq!(entry.level(), UNREACHABLE_LEVEL);
    }

    #[test]
    fn speed_averages_scores_across_target_subset() {
        let mut entry = psk_entry("Home");
        entry
            .update_scans(vec![
                scan("Home", "aa:aa:aa:aa:aa:aa", "[WPA2-PSK-CCMP]", -60),
                scan("Home", "bb:bb:bb:bb:bb:bb", "[WPA2-PSK-CCMP]", -70),
            ])
            .unwrap();

        let mut scores = ScoreBoard::new();
        scores.insert(("Home".to_owned(), Bssid::new("aa:aa:aa:aa:aa:aa")), 10);
        scores.insert(("Home".to_owned(), Bssid::new("bb:bb:bb:bb:bb:bb")), 30);
        entry.update_speed(&scores);

        // avg(10, 30) = 20 -> Fast
        assert_eq!(entry.speed(), Speed::Fast);
    }

    #[test]
    fn connection_matches_by_network_id() {
        let mut entry = psk_entry("Home");
        entry
            .update_configs(vec![SavedConfig::new(NetworkId(7), "Home", KeyManagement::psk())])
            .unwrap();

        // Connection reports a different security but the same network id.
        let info = connection("Home", KeyManagement::eap(), -50);
        entry.update_connection(Some((&info, ConnectedState::Connected)));
        assert_eq!(entry.connected_state(), ConnectedState::Connected);
    }

    #[test]
    fn foreign_connection_leaves_entry_disconnected() {
        let mut entry = psk_entry("Home");
        let info = connection("Elsewhere", KeyManagement::psk(), -50);
        entry.update_connection(Some((&info, ConnectedState::Connected)));
        assert_eq!(entry.connected_state(), ConnectedState::Disconnected);
    }

    #[test]
    fn known_entry_resolves_from_config_alone() {
        let config = SavedConfig::new(NetworkId(3), "Attic", KeyManagement::sae());
        let entry = NetworkEntry::known(&config, PlatformCompat::default());
        assert_eq!(entry.kind(), EntryKind::Known);
        assert_eq!(entry.target_security(), Some(SecurityType::Sae));
        assert!(entry.is_saved());
        assert_eq!(entry.level(), UNREACHABLE_LEVEL);
    }

    #[test]
    fn hotspot_entry_uses_provider_level_and_key() {
        let payload = HotspotPayload {
            device_id: uuid::Uuid::new_v4(),
            device_name: "Pixel".to_owned(),
            ssid: "Pixel hotspot".to_owned(),
            key_mgmt: KeyManagement::sae(),
            connection_level: 3,
            battery_percent: Some(55),
        };
        let mut entry = NetworkEntry::hotspot(&payload, PlatformCompat::default());
        assert_eq!(entry.kind(), EntryKind::Hotspot);
        assert_eq!(entry.level(), 3);

        // New payload with a different device id replaces the identity.
        let old_key = entry.key().clone();
        let mut changed = payload;
        changed.device_id = uuid::Uuid::new_v4();
        changed.connection_level = 1;
        entry.update_hotspot(&changed);
        assert_ne!(*entry.key(), old_key);
        assert_eq!(entry.level(), 1);
    }

    #[test]
    fn snapshot_reflects_entry_state() {
        struct OneSim;
        impl CarrierLookup for OneSim {
            fn has_active_sim(&self, carrier_id: i32) -> bool {
                carrier_id == 42
            }
            fn display_name(&self, _carrier_id: i32) -> Option<String> {
                Some("ExampleCell".to_owned())
            }
        }

        let mut config = SavedConfig::new(NetworkId(2), "Cafe", KeyManagement::psk());
        config.from_suggestion = true;
        config.creator = Some("com.example".to_owned());
        config.carrier_id = Some(42);

        let key = EntryKey::from_config(&config);
        let mut entry = NetworkEntry::standard(key, PlatformCompat::default());
        entry.update_configs(vec![config]).unwrap();

        let snap = entry.snapshot(Some(&OneSim));
        assert!(snap.suggested);
        assert!(!snap.saved);
        assert_eq!(snap.carrier_name.as_deref(), Some("ExampleCell"));
        assert_eq!(snap.token, entry.token());
        assert_eq!(snap.security_label, "WPA2-Personal");
    }
}
