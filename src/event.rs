//! Events emitted by a running game session.

use std::sync::Arc;

use crate::close_codes::CloseCode;
use crate::resolver::GameView;

/// Events delivered on the channel returned by
/// [`GameSession::start`](crate::client::GameSession::start).
///
/// The last event on the channel is always one of [`Dead`](Self::Dead),
/// [`ReloadRequired`](Self::ReloadRequired), [`Fatal`](Self::Fatal) or
/// [`Closed`](Self::Closed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A connection opened. Any server-time baseline should be resynced.
    Connected,
    /// The server pushed a new snapshot.
    StateUpdated(Arc<GameView>),
    /// The connection closed without the owner asking.
    Disconnected {
        code: Option<CloseCode>,
        reason: Option<String>,
    },
    /// A reconnect attempt is about to start.
    Reconnecting { attempt: u32 },
    /// Reconnect attempts are exhausted; hand control back to the caller.
    Dead { attempts: u32 },
    /// The server rejected this client build; reload to pick up a new one.
    ReloadRequired,
    /// An unrecoverable protocol error ended the session.
    Fatal { error: String },
    /// The owner shut the session down.
    Closed,
}

impl SessionEvent {
    /// Returns `true` for events after which no further events follow.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Dead { .. } | Self::ReloadRequired | Self::Fatal { .. } | Self::Closed
        )
    }
}
