// ── Core error types ──
//
// Three failure families, handled differently by design:
//   * caller-contract violations (SsidMismatch) fail fast -- they mean an
//     aggregation bug upstream, not a runtime condition;
//   * parse tolerance (malformed entry-key tokens) never produces an error
//     at all, only a logged default (see model::key);
//   * platform operation failures surface asynchronously through the
//     command result channel, never as a panic or a sync throw.

use thiserror::Error;

use wifitrack_platform::PlatformError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Caller-contract violations ───────────────────────────────────
    #[error("SSID mismatch: entry tracks {expected:?} but was given input for {got:?}")]
    SsidMismatch { expected: String, got: String },

    // ── Entry lookup ─────────────────────────────────────────────────
    #[error("No entry for key token: {token}")]
    EntryNotFound { token: String },

    #[error("Entry {token} has no usable configuration to connect with")]
    NotConnectable { token: String },

    // ── Orchestrator state ───────────────────────────────────────────
    #[error("Tracker is not running")]
    TrackerStopped,

    // ── Platform operation outcomes ──────────────────────────────────
    #[error("Operation {operation} timed out after {timeout_secs}s")]
    OperationTimedOut { operation: String, timeout_secs: u64 },

    #[error("Operation {operation} failed: {message}")]
    OperationFailed { operation: String, message: String },

    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },
}

impl CoreError {
    /// Translate a platform failure into the core taxonomy, tagged with
    /// the operation that triggered it.
    pub(crate) fn from_platform(operation: &str, err: PlatformError) -> Self {
        match err {
            PlatformError::Unsupported { operation } => Self::Unsupported { operation },
            other => Self::OperationFailed {
                operation: operation.to_owned(),
                message: other.to_string(),
            },
        }
    }
}
