// ── Worker state ──
//
// The single mutable home of all entries and caches. Exactly one worker
// task owns a WorkerState; everything here is therefore lock-free by
// confinement. Events are applied in submission order, entries are
// rebuilt from the full current inputs (never patched), and one
// publication per batch pushes immutable snapshots to the store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, error};
use uuid::Uuid;

use wifitrack_platform::{CarrierLookup, ConnectionInfo, SavedConfig, ScanRecord, WifiState};

use crate::config::TrackerConfig;
use crate::entry::{NetworkEntry, ScoreBoard};
use crate::model::{ConnectedState, EntryKey, EntrySnapshot, IdentityKey, SecurityType};
use crate::scan_cache::ScanResultCache;
use crate::store::EntryStore;

use super::events::{PlatformEvent, TrackerEvent};

pub(crate) struct WorkerState {
    config: TrackerConfig,
    cache: ScanResultCache,
    entries: HashMap<EntryKey, NetworkEntry>,
    hotspots: HashMap<Uuid, NetworkEntry>,
    configs: Vec<SavedConfig>,
    connection: Option<(ConnectionInfo, ConnectedState)>,
    scores: ScoreBoard,
    wifi_state: WifiState,
    visible: bool,
}

impl WorkerState {
    pub(crate) fn new(config: TrackerConfig) -> Self {
        let cache = ScanResultCache::new(config.max_scan_age);
        Self {
            config,
            cache,
            entries: HashMap::new(),
            hotspots: HashMap::new(),
            configs: Vec::new(),
            connection: None,
            scores: ScoreBoard::new(),
            wifi_state: WifiState::Disabled,
            visible: false,
        }
    }

    /// Periodic scans run only while the app is visible, Wi-Fi is on,
    /// and the tracker is started.
    pub(crate) fn eligible(&self) -> bool {
        self.visible && self.wifi_state.is_enabled()
    }

    pub(crate) fn wifi_state(&self) -> WifiState {
        self.wifi_state
    }

    /// Apply a coalesced batch of events, then rebuild all entries once.
    ///
    /// Returns the side notifications to broadcast alongside the final
    /// `EntriesChanged`.
    pub(crate) fn apply_batch(&mut self, batch: Vec<PlatformEvent>) -> Vec<TrackerEvent> {
        let mut notifications = Vec::new();
        for event in batch {
            self.apply_event(event, &mut notifications);
        }
        self.rebuild_entries();
        notifications
    }

    fn apply_event(&mut self, event: PlatformEvent, notifications: &mut Vec<TrackerEvent>) {
        match event {
            PlatformEvent::ScanResults {
                records,
                observed_at,
            } => {
                self.cache.update(records, observed_at);
            }
            PlatformEvent::ScanFailed { observed_at } => {
                // No new records, but the clock still advances so stale
                // entries age out of the window.
                self.cache.update(Vec::new(), observed_at);
            }
            PlatformEvent::ConfigsChanged { configs } => {
                self.configs = configs;
            }
            PlatformEvent::ConnectionChanged { info, state } => {
                self.connection = Some((info, state));
                notifications.push(TrackerEvent::ConnectionChanged(state));
            }
            PlatformEvent::NetworkLost { network_id } => {
                if self
                    .connection
                    .as_ref()
                    .is_some_and(|(info, _)| info.network_id == network_id)
                {
                    self.connection = None;
                    notifications.push(TrackerEvent::ConnectionChanged(
                        ConnectedState::Disconnected,
                    ));
                }
                notifications.push(TrackerEvent::NetworkLost(network_id));
            }
            PlatformEvent::ScoresChanged { scores } => {
                self.scores = scores
                    .into_iter()
                    .map(|s| ((s.ssid, s.bssid), s.badge))
                    .collect();
            }
            PlatformEvent::WifiStateChanged { state } => {
                self.wifi_state = state;
                if state == WifiState::Disabled {
                    // Radio off: cached scans and the connection are
                    // meaningless until it comes back.
                    self.cache = ScanResultCache::new(self.config.max_scan_age);
                    self.connection = None;
                }
                notifications.push(TrackerEvent::WifiStateChanged(state));
            }
            PlatformEvent::HotspotsChanged { payloads } => {
                let mut next = HashMap::new();
                for payload in payloads {
                    let entry = match self.hotspots.remove(&payload.device_id) {
                        Some(mut existing) => {
                            existing.update_hotspot(&payload);
                            existing
                        }
                        None => NetworkEntry::hotspot(&payload, self.config.compat),
                    };
                    next.insert(payload.device_id, entry);
                }
                self.hotspots = next;
            }
            PlatformEvent::VisibilityChanged { visible } => {
                self.visible = visible;
            }
        }
    }

    /// Rebuild the standard entry set from the full current inputs.
    ///
    /// Scans are grouped by grouped identity (suggestion and request
    /// entries share the identity's scans); configs split further by
    /// their full EntryKey. Entries whose key no longer appears in
    /// either input are dropped -- that is the entire removal policy.
    fn rebuild_entries(&mut self) {
        let mut scans_by_identity: HashMap<IdentityKey, Vec<Arc<ScanRecord>>> = HashMap::new();
        for scan in self.cache.scan_results() {
            let identity = IdentityKey::new(scan.ssid.clone(), SecurityType::of_scan(&scan));
            scans_by_identity.entry(identity).or_default().push(scan);
        }

        let mut configs_by_key: HashMap<EntryKey, Vec<SavedConfig>> = HashMap::new();
        for config in &self.configs {
            configs_by_key
                .entry(EntryKey::from_config(config))
                .or_default()
                .push(config.clone());
        }

        let mut keys: HashSet<EntryKey> = configs_by_key.keys().cloned().collect();
        keys.extend(
            scans_by_identity
                .keys()
                .map(|identity| EntryKey::standard(identity.clone())),
        );

        let mut old = std::mem::take(&mut self.entries);
        let connection = self
            .connection
            .as_ref()
            .map(|(info, state)| (info, *state));

        for key in keys {
            let mut entry = old
                .remove(&key)
                .unwrap_or_else(|| NetworkEntry::standard(key.clone(), self.config.compat));

            let scans = scans_by_identity
                .get(&key.identity)
                .cloned()
                .unwrap_or_default();
            if let Err(e) = entry.update_scans(scans) {
                // Aggregation bug: keys are derived from the very inputs
                // being delivered, so this must surface loudly.
                error!(error = %e, "entry rejected scan delivery");
            }

            let configs = configs_by_key.get(&key).cloned().unwrap_or_default();
            if let Err(e) = entry.update_configs(configs) {
                error!(error = %e, "entry rejected config delivery");
            }

            entry.update_connection(connection);
            entry.update_speed(&self.scores);
            self.entries.insert(key, entry);
        }

        // Hotspot entries match connections too (by SSID), so they get
        // the same connection and speed refresh as standard entries.
        for entry in self.hotspots.values_mut() {
            entry.update_connection(connection);
            entry.update_speed(&self.scores);
        }
    }

    /// Publish the current entry set as immutable snapshots.
    pub(crate) fn publish(&self, store: &EntryStore, carrier: Option<&dyn CarrierLookup>) {
        let mut snapshots: Vec<Arc<EntrySnapshot>> = self
            .entries
            .values()
            .chain(self.hotspots.values())
            .map(|e| Arc::new(e.snapshot(carrier)))
            .collect();
        // Deterministic output order regardless of map iteration.
        snapshots.sort_by(|a, b| a.ssid.cmp(&b.ssid).then_with(|| a.token.cmp(&b.token)));

        if self.config.verbose {
            for entry in self.entries.values().chain(self.hotspots.values()) {
                debug!(summary = %entry.verbose_summary(), "entry state");
            }
        }

        store.publish(snapshots);
    }

    /// Diagnostic dump of every tracked entry.
    pub(crate) fn verbose_summary(&self) -> String {
        let mut lines: Vec<String> = self
            .entries
            .values()
            .chain(self.hotspots.values())
            .map(NetworkEntry::verbose_summary)
            .collect();
        lines.sort();
        lines.join("\n")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use wifitrack_platform::{Bssid, KeyManagement, NetworkCapabilities, NetworkId, ScoredNetwork};

    use crate::model::{EntryKind, Speed};

    fn scan(ssid: &str, bssid: &str, caps: &str, rssi: i32) -> ScanRecord {
        ScanRecord {
            ssid: ssid.to_owned(),
            bssid: Bssid::new(bssid),
            capabilities: caps.to_owned(),
            rssi_dbm: rssi,
            frequency_mhz: 5180,
            timestamp: Utc::now(),
        }
    }

    fn state() -> WorkerState {
        WorkerState::new(TrackerConfig::default())
    }

    fn published(state: &WorkerState) -> Vec<Arc<EntrySnapshot>> {
        let store = EntryStore::new();
        state.publish(&store, None);
        store.entries_snapshot().as_ref().clone()
    }

    #[test]
    fn scan_batch_creates_entries() {
        let mut ws = state();
        ws.apply_batch(vec![PlatformEvent::ScanResults {
            records: vec![
                scan("Home", "aa:aa:aa:aa:aa:aa", "[WPA2-PSK-CCMP][ESS]", -60),
                scan("Cafe", "bb:bb:bb:bb:bb:bb", "[ESS]", -70),
            ],
            observed_at: Utc::now(),
        }]);

        let snaps = published(&ws);
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].ssid, "Cafe");
        assert_eq!(snaps[1].ssid, "Home");
    }

    #[test]
    fn scenario_a_psk_sae_scan_without_config() {
        let mut ws = state();
        ws.apply_batch(vec![PlatformEvent::ScanResults {
            records: vec![scan("Home", "aa:aa:aa:aa:aa:aa", "[WPA2-PSK+SAE-CCMP][ESS]", -58)],
            observed_at: Utc::now(),
        }]);

        let snaps = published(&ws);
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].security_label, "WPA2/WPA3-Personal");
        // Lowest rank in {PSK, SAE} wins for the connect target.
        let entry = ws.entries.values().next().unwrap();
        assert_eq!(entry.target_security(), Some(SecurityType::Psk));
    }

    #[test]
    fn scenario_b_owe_transition_with_saved_owe_config() {
        let mut ws = state();
        let mut config = SavedConfig::new(NetworkId(5), "Guest", KeyManagement::owe());
        config.passphrase = None;
        ws.apply_batch(vec![
            PlatformEvent::ConfigsChanged {
                configs: vec![config],
            },
            PlatformEvent::ScanResults {
                records: vec![scan(
                    "Guest",
                    "aa:aa:aa:aa:aa:aa",
                    "[RSN-OWE_TRANSITION-CCMP][ESS]",
                    -62,
                )],
                observed_at: Utc::now(),
            },
        ]);

        assert_eq!(ws.entries.len(), 1);
        let entry = ws.entries.values().next().unwrap();
        assert_eq!(entry.target_security(), Some(SecurityType::Owe));
    }

    #[test]
    fn scan_and_config_merge_into_one_entry_across_partners() {
        let mut ws = state();
        ws.apply_batch(vec![
            PlatformEvent::ConfigsChanged {
                configs: vec![SavedConfig::new(NetworkId(1), "Home", KeyManagement::sae())],
            },
            PlatformEvent::ScanResults {
                records: vec![scan("Home", "aa:aa:aa:aa:aa:aa", "[WPA2-PSK-CCMP][ESS]", -60)],
                observed_at: Utc::now(),
            },
        ]);

        // PSK scan and SAE config group to the same identity.
        assert_eq!(ws.entries.len(), 1);
        let snaps = published(&ws);
        assert!(snaps[0].saved);
        assert_eq!(snaps[0].network_id, Some(NetworkId(1)));
    }

    #[test]
    fn suggestion_config_yields_separate_entry_fed_by_same_scans() {
        let mut ws = state();
        let mut suggested = SavedConfig::new(NetworkId(2), "Cafe", KeyManagement::psk());
        suggested.from_suggestion = true;
        suggested.creator = Some("com.example.app".to_owned());

        ws.apply_batch(vec![
            PlatformEvent::ConfigsChanged {
                configs: vec![suggested],
            },
            PlatformEvent::ScanResults {
                records: vec![scan("Cafe", "aa:aa:aa:aa:aa:aa", "[WPA2-PSK-CCMP][ESS]", -61)],
                observed_at: Utc::now(),
            },
        ]);

        // One scan-derived standard entry, one suggestion entry; both in
        // range because scans are matched by identity.
        assert_eq!(ws.entries.len(), 2);
        for entry in ws.entries.values() {
            assert!(entry.level() > crate::model::UNREACHABLE_LEVEL);
        }
    }

    #[test]
    fn entry_removed_when_scans_age_out_and_no_config() {
        let mut ws = state();
        let t0 = Utc::now();
        ws.apply_batch(vec![PlatformEvent::ScanResults {
            records: vec![scan("Gone", "aa:aa:aa:aa:aa:aa", "[ESS]", -60)],
            observed_at: t0,
        }]);
        assert_eq!(ws.entries.len(), 1);

        // A later failed scan cycle advances the clock past max age.
        let later = t0 + chrono::TimeDelta::seconds(16 * 60);
        ws.apply_batch(vec![PlatformEvent::ScanFailed { observed_at: later }]);
        assert!(ws.entries.is_empty());
    }

    #[test]
    fn saved_entry_survives_scan_age_out() {
        let mut ws = state();
        let t0 = Utc::now();
        ws.apply_batch(vec![
            PlatformEvent::ConfigsChanged {
                configs: vec![SavedConfig::new(NetworkId(1), "Home", KeyManagement::psk())],
            },
            PlatformEvent::ScanResults {
                records: vec![scan("Home", "aa:aa:aa:aa:aa:aa", "[WPA2-PSK-CCMP][ESS]", -60)],
                observed_at: t0,
            },
        ]);

        let later = t0 + chrono::TimeDelta::seconds(16 * 60);
        ws.apply_batch(vec![PlatformEvent::ScanFailed { observed_at: later }]);

        assert_eq!(ws.entries.len(), 1);
        let snaps = published(&ws);
        assert_eq!(snaps[0].level, crate::model::UNREACHABLE_LEVEL);
    }

    #[test]
    fn connection_events_drive_entry_state() {
        let mut ws = state();
        ws.apply_batch(vec![PlatformEvent::ScanResults {
            records: vec![scan("Home", "aa:aa:aa:aa:aa:aa", "[WPA2-PSK-CCMP][ESS]", -60)],
            observed_at: Utc::now(),
        }]);

        let info = ConnectionInfo {
            ssid: "Home".to_owned(),
            bssid: Bssid::new("aa:aa:aa:aa:aa:aa"),
            network_id: NetworkId(9),
            key_mgmt: KeyManagement::psk(),
            rssi_dbm: -45,
            link_speed_mbps: 600,
            capabilities: NetworkCapabilities::default(),
        };
        let notes = ws.apply_batch(vec![PlatformEvent::ConnectionChanged {
            info,
            state: ConnectedState::Connected,
        }]);
        assert!(notes.contains(&TrackerEvent::ConnectionChanged(ConnectedState::Connected)));

        let snaps = published(&ws);
        assert_eq!(snaps[0].connected_state, ConnectedState::Connected);

        // Scenario C: the loss callback flips the entry back and scan
        // estimates resume.
        let notes = ws.apply_batch(vec![PlatformEvent::NetworkLost {
            network_id: NetworkId(9),
        }]);
        assert!(notes.contains(&TrackerEvent::NetworkLost(NetworkId(9))));

        let snaps = published(&ws);
        assert_eq!(snaps[0].connected_state, ConnectedState::Disconnected);
        assert_eq!(snaps[0].level, crate::model::signal_level(-60));
    }

    #[test]
    fn scores_feed_speed_estimates() {
        let mut ws = state();
        ws.apply_batch(vec![
            PlatformEvent::ScanResults {
                records: vec![scan("Home", "aa:aa:aa:aa:aa:aa", "[WPA2-PSK-CCMP][ESS]", -60)],
                observed_at: Utc::now(),
            },
            PlatformEvent::ScoresChanged {
                scores: vec![ScoredNetwork {
                    ssid: "Home".to_owned(),
                    bssid: Bssid::new("aa:aa:aa:aa:aa:aa"),
                    badge: 30,
                }],
            },
        ]);

        let snaps = published(&ws);
        assert_eq!(snaps[0].speed, Speed::VeryFast);
    }

    #[test]
    fn wifi_disable_clears_scans_and_connection() {
        let mut ws = state();
        ws.apply_batch(vec![
            PlatformEvent::VisibilityChanged { visible: true },
            PlatformEvent::WifiStateChanged {
                state: WifiState::Enabled,
            },
            PlatformEvent::ScanResults {
                records: vec![scan("Home", "aa:aa:aa:aa:aa:aa", "[WPA2-PSK-CCMP][ESS]", -60)],
                observed_at: Utc::now(),
            },
        ]);
        assert!(ws.eligible());
        assert_eq!(ws.entries.len(), 1);

        ws.apply_batch(vec![PlatformEvent::WifiStateChanged {
            state: WifiState::Disabled,
        }]);
        assert!(!ws.eligible());
        assert!(ws.entries.is_empty());
    }

    #[test]
    fn hotspot_payloads_publish_alongside_standard_entries() {
        let mut ws = state();
        let device_id = Uuid::new_v4();
        ws.apply_batch(vec![PlatformEvent::HotspotsChanged {
            payloads: vec![wifitrack_platform::HotspotPayload {
                device_id,
                device_name: "Pixel".to_owned(),
                ssid: "Pixel hotspot".to_owned(),
                key_mgmt: KeyManagement::sae(),
                connection_level: 2,
                battery_percent: Some(40),
            }],
        }]);

        let snaps = published(&ws);
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].kind, EntryKind::Hotspot);
        assert_eq!(snaps[0].level, 2);
        assert_eq!(snaps[0].device_name.as_deref(), Some("Pixel"));

        // Empty payload list removes the hotspot entry.
        ws.apply_batch(vec![PlatformEvent::HotspotsChanged {
            payloads: Vec::new(),
        }]);
        assert!(published(&ws).is_empty());
    }

    #[test]
    fn connected_hotspot_tracks_connection_state() {
        let mut ws = state();
        let device_id = Uuid::new_v4();
        ws.apply_batch(vec![PlatformEvent::HotspotsChanged {
            payloads: vec![wifitrack_platform::HotspotPayload {
                device_id,
                device_name: "Pixel".to_owned(),
                ssid: "Pixel hotspot".to_owned(),
                key_mgmt: KeyManagement::sae(),
                connection_level: 2,
                battery_percent: Some(70),
            }],
        }]);

        let info = ConnectionInfo {
            ssid: "Pixel hotspot".to_owned(),
            bssid: Bssid::new("aa:bb:cc:dd:ee:ff"),
            network_id: NetworkId(11),
            key_mgmt: KeyManagement::sae(),
            rssi_dbm: -48,
            link_speed_mbps: 200,
            capabilities: NetworkCapabilities::default(),
        };
        ws.apply_batch(vec![PlatformEvent::ConnectionChanged {
            info,
            state: ConnectedState::Connected,
        }]);

        let snaps = published(&ws);
        assert_eq!(snaps[0].connected_state, ConnectedState::Connected);
        // Live link stats override the provider-reported level.
        assert_eq!(snaps[0].level, crate::model::signal_level(-48));

        // Losing the network flips the entry back to the provider level.
        ws.apply_batch(vec![PlatformEvent::NetworkLost {
            network_id: NetworkId(11),
        }]);
        let snaps = published(&ws);
        assert_eq!(snaps[0].connected_state, ConnectedState::Disconnected);
        assert_eq!(snaps[0].level, 2);
    }

    #[test]
    fn verbose_summary_lists_entries() {
        let mut ws = state();
        ws.apply_batch(vec![PlatformEvent::ScanResults {
            records: vec![scan("Home", "aa:aa:aa:aa:aa:aa", "[WPA2-PSK-CCMP][ESS]", -60)],
            observed_at: Utc::now(),
        }]);
        let summary = ws.verbose_summary();
        assert!(summary.contains("Home"));
        assert!(summary.contains("target=Some(Psk)"));
    }
}
