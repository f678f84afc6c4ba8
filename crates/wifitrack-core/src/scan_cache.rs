// ── Scan result cache ──
//
// De-duplicates repeated scan cycles keyed by (SSID, BSSID) and ages out
// records older than the eviction horizon. Worker-confined: always called
// from the worker task, so no internal locking.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use wifitrack_platform::{Bssid, ScanRecord};

pub struct ScanResultCache {
    max_age: chrono::Duration,
    by_key: HashMap<(String, Bssid), Arc<ScanRecord>>,
    latest_observation: Option<DateTime<Utc>>,
}

impl ScanResultCache {
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age: chrono::Duration::from_std(max_age)
                .unwrap_or_else(|_| chrono::Duration::seconds(15 * 60)),
            by_key: HashMap::new(),
            latest_observation: None,
        }
    }

    /// Merge a scan batch observed at the given time.
    ///
    /// A record replaces any previous record for the same (SSID, BSSID)
    /// only if its timestamp is newer; records older than `max_age`
    /// relative to the most recent observation are evicted.
    pub fn update(&mut self, records: Vec<ScanRecord>, observed_at: DateTime<Utc>) {
        for record in records {
            let key = (record.ssid.clone(), record.bssid.clone());
            match self.by_key.get(&key) {
                Some(existing) if existing.timestamp >= record.timestamp => {}
                _ => {
                    self.by_key.insert(key, Arc::new(record));
                }
            }
        }

        let latest = match self.latest_observation {
            Some(prev) => prev.max(observed_at),
            None => observed_at,
        };
        self.latest_observation = Some(latest);

        let horizon = latest - self.max_age;
        self.by_key.retain(|_, record| record.timestamp > horizon);
    }

    /// All live (non-evicted) records. No ordering guarantee.
    pub fn scan_results(&self) -> Vec<Arc<ScanRecord>> {
        self.by_key.values().cloned().collect()
    }

    /// Live records for one SSID.
    pub fn scan_results_for(&self, ssid: &str) -> Vec<Arc<ScanRecord>> {
        self.by_key
            .values()
            .filter(|r| r.ssid == ssid)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn record(ssid: &str, bssid: &str, rssi: i32, at: DateTime<Utc>) -> ScanRecord {
        ScanRecord {
            ssid: ssid.to_owned(),
            bssid: Bssid::new(bssid),
            capabilities: "[WPA2-PSK-CCMP][ESS]".to_owned(),
            rssi_dbm: rssi,
            frequency_mhz: 2437,
            timestamp: at,
        }
    }

    #[test]
    fn newer_record_replaces_same_key() {
        let mut cache = ScanResultCache::new(Duration::from_secs(900));
        let t0 = Utc::now();
        let t1 = t0 + TimeDelta::seconds(10);

        cache.update(vec![record("Home", "aa:aa:aa:aa:aa:aa", -70, t0)], t0);
        cache.update(vec![record("Home", "aa:aa:aa:aa:aa:aa", -50, t1)], t1);

        let results = cache.scan_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].rssi_dbm, -50);
    }

    #[test]
    fn stale_record_does_not_replace_newer() {
        let mut cache = ScanResultCache::new(Duration::from_secs(900));
        let t0 = Utc::now();
        let t1 = t0 + TimeDelta::seconds(10);

        cache.update(vec![record("Home", "aa:aa:aa:aa:aa:aa", -50, t1)], t1);
        cache.update(vec![record("Home", "aa:aa:aa:aa:aa:aa", -70, t0)], t1);

        assert_eq!(cache.scan_results()[0].rssi_dbm, -50);
    }

    #[test]
    fn distinct_bssids_kept_separately() {
        let mut cache = ScanResultCache::new(Duration::from_secs(900));
        let t0 = Utc::now();

        cache.update(
            vec![
                record("Home", "aa:aa:aa:aa:aa:aa", -70, t0),
                record("Home", "bb:bb:bb:bb:bb:bb", -60, t0),
            ],
            t0,
        );

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.scan_results_for("Home").len(), 2);
        assert!(cache.scan_results_for("Other").is_empty());
    }

    #[test]
    fn old_records_age_out() {
        let mut cache = ScanResultCache::new(Duration::from_secs(60));
        let t0 = Utc::now();
        let t1 = t0 + TimeDelta::seconds(120);

        cache.update(vec![record("Old", "aa:aa:aa:aa:aa:aa", -70, t0)], t0);
        cache.update(vec![record("New", "bb:bb:bb:bb:bb:bb", -60, t1)], t1);

        let results = cache.scan_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].ssid, "New");
    }

    #[test]
    fn repeated_identical_update_is_idempotent() {
        let mut cache = ScanResultCache::new(Duration::from_secs(900));
        let t0 = Utc::now();
        let batch = vec![record("Home", "aa:aa:aa:aa:aa:aa", -70, t0)];

        cache.update(batch.clone(), t0);
        let first = cache.scan_results();
        cache.update(batch, t0);
        let second = cache.scan_results();

        assert_eq!(first.len(), second.len());
        assert_eq!(first[0], second[0]);
    }
}
