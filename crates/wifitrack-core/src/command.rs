// ── Command API ──
//
// All write operations flow through a unified `Command` enum. The
// tracker routes each variant to the platform config store; results --
// including failures -- come back exclusively through the oneshot
// channel, never as a sync throw from the triggering call.

use wifitrack_platform::{NetworkId, SavedConfig};

use crate::error::CoreError;

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// All write operations against the platform, keyed by entry token.
#[derive(Debug, Clone)]
pub enum Command {
    /// Connect to the entry's target configuration.
    Connect { token: String },
    /// Disconnect from the current network. Completes only once the
    /// network loss is acknowledged, or times out.
    Disconnect { token: String },
    /// Forget the entry's saved configuration.
    Forget { token: String },
    /// Persist a new configuration.
    Save { config: SavedConfig },
}

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Ok,
    Saved { network_id: NetworkId },
}
