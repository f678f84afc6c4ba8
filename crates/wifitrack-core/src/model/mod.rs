// ── Domain model ──
//
// Canonical identity and classification types derived from raw platform
// payloads. Everything here is pure data + pure functions; the stateful
// pieces live in `entry`, `scan_cache`, and `tracker`.

pub mod key;
pub mod security;
pub mod snapshot;

pub use key::{EntryKey, EntryKind, IdentityKey, SuggestionProfile};
pub use security::{SecurityType, advertised_label, grouped_types};
pub use snapshot::{ConnectedState, EntrySnapshot, Speed, UNREACHABLE_LEVEL, signal_level};
