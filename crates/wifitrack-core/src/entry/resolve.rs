// ── Target resolution ──
//
// Deterministic cascade picking the single security type an entry
// resolves to for display and connection. Connection truth overrides
// heuristics; after that, types backed by both scans and configs beat
// scans-only beat configs-only beat the raw key set. Results never
// depend on map iteration order (BTree collections throughout).

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use wifitrack_platform::{Bssid, SavedConfig, ScanRecord};

use crate::config::PlatformCompat;
use crate::model::SecurityType;

/// Compute the candidate security-type set (cascade steps 1-5).
pub(crate) fn candidate_types(
    key_types: &BTreeSet<SecurityType>,
    scans: &BTreeMap<SecurityType, Vec<Arc<ScanRecord>>>,
    configs: &BTreeMap<SecurityType, SavedConfig>,
    connection: Option<SecurityType>,
    compat: &PlatformCompat,
) -> BTreeSet<SecurityType> {
    // 1. A live connection belonging to this entry wins outright.
    if let Some(t) = connection {
        if key_types.contains(&t) {
            return BTreeSet::from([t]);
        }
    }

    let scan_types: BTreeSet<SecurityType> = scans
        .keys()
        .copied()
        .filter(|t| compat.supports(*t))
        .collect();
    let config_types: BTreeSet<SecurityType> = configs
        .keys()
        .copied()
        .filter(|t| compat.supports(*t))
        .collect();

    // 2. Types present in both scans and configs.
    let both: BTreeSet<SecurityType> = scan_types.intersection(&config_types).copied().collect();
    if !both.is_empty() {
        return both;
    }
    // 3. Scans only.
    if !scan_types.is_empty() {
        return scan_types;
    }
    // 4. Configs only.
    if !config_types.is_empty() {
        return config_types;
    }
    // 5. The full key set, unfiltered.
    key_types.clone()
}

/// Tie-break within the candidate set: OWE beats plain Open when both
/// are present, otherwise the lowest-ranked type wins for broadest
/// compatibility.
pub(crate) fn choose_target(candidates: &BTreeSet<SecurityType>) -> Option<SecurityType> {
    if candidates.contains(&SecurityType::Owe) && candidates.contains(&SecurityType::Open) {
        return Some(SecurityType::Owe);
    }
    candidates.first().copied()
}

/// Union of scans matching any candidate type, without duplicates.
///
/// A single scan can sit under several security types after grouping
/// (e.g. a PSK/SAE transition AP); within one entry's SSID the cache
/// guarantees one record per BSSID, so BSSID is the dedup key.
pub(crate) fn target_scans(
    candidates: &BTreeSet<SecurityType>,
    scans: &BTreeMap<SecurityType, Vec<Arc<ScanRecord>>>,
) -> Vec<Arc<ScanRecord>> {
    let mut seen: HashSet<Bssid> = HashSet::new();
    let mut out = Vec::new();
    for t in candidates {
        if let Some(records) = scans.get(t) {
            for record in records {
                if seen.insert(record.bssid.clone()) {
                    out.push(Arc::clone(record));
                }
            }
        }
    }
    out
}
