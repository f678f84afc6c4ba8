// ── Platform-side error type ──
//
// Errors raised by the host OS collaborators. wifitrack-core translates
// these into its own error type at the crate seam -- consumers never see
// platform internals directly.

use thiserror::Error;

/// Failures reported by the platform collaborators.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The Wi-Fi subsystem is off or the service is not reachable.
    #[error("Wi-Fi subsystem unavailable")]
    Unavailable,

    /// The platform refused the operation (e.g. connect to an unknown
    /// network id, forget a network owned by another app).
    #[error("Operation rejected by platform: {message}")]
    Rejected { message: String },

    /// A scan request was dropped because one is already in flight or
    /// scan throttling is active.
    #[error("Scan request throttled")]
    ScanThrottled,

    /// The platform does not implement this operation.
    #[error("Operation not supported by platform: {operation}")]
    Unsupported { operation: String },

    /// Anything else the platform surfaced as an opaque failure.
    #[error("Platform failure: {0}")]
    Other(String),
}
