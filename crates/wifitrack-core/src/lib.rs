//! Reactive network-entry tracking layer between `wifitrack-platform`
//! and UI consumers.
//!
//! This crate owns the business logic, domain model, and reactive data
//! infrastructure for the Wi-Fi tracking workspace:
//!
//! - **[`Tracker`]** — Central facade managing the full lifecycle:
//!   [`start()`](Tracker::start) loads the saved configurations, then
//!   spawns background tasks for event aggregation, command processing,
//!   and periodic scanning. All platform signals enter through the
//!   cloneable [`PlatformHandle`]; all writes go through
//!   [`execute()`](Tracker::execute).
//!
//! - **[`EntryStore`]** — Lock-free reactive storage (`DashMap` +
//!   `tokio::sync::watch` channels) holding the published immutable
//!   [`EntrySnapshot`] list. Only the tracker's worker task writes it.
//!
//! - **[`SnapshotStream`]** — Subscription handle vended by the store.
//!   Exposes `current()` / `latest()` / `changed()` for reactive
//!   rendering.
//!
//! - **[`Command`]** — Typed mutation requests routed through an `mpsc`
//!   channel to the tracker's command processor. Reads bypass the
//!   channel via direct store snapshots.
//!
//! - **Domain model** ([`model`]) — Security classification
//!   ([`SecurityType`]), grouped identity keys ([`EntryKey`]), and the
//!   published snapshot shape ([`EntrySnapshot`]).

pub mod command;
pub mod config;
pub mod entry;
pub mod error;
pub mod model;
pub mod scan_cache;
pub mod store;
pub mod stream;
pub mod tracker;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult};
pub use config::{PlatformCompat, TrackerConfig};
pub use entry::{NetworkEntry, ScoreBoard};
pub use error::CoreError;
pub use scan_cache::ScanResultCache;
pub use store::EntryStore;
pub use stream::SnapshotStream;
pub use tracker::{PlatformEvent, PlatformHandle, Tracker, TrackerEvent};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    ConnectedState, EntryKey, EntryKind, EntrySnapshot, IdentityKey, SecurityType, Speed,
    SuggestionProfile, UNREACHABLE_LEVEL, signal_level,
};
