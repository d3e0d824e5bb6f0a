//! Error types for the game session client.

use thiserror::Error;

use crate::protocol::PlayerId;

/// Errors that can occur while running a game session.
///
/// [`Serialization`](SessionError::Serialization), [`Decode`](SessionError::Decode),
/// [`UnhandledMethod`](SessionError::UnhandledMethod) and
/// [`PlayerNotFound`](SessionError::PlayerNotFound) are unrecoverable: they
/// indicate a client/server version skew or a bug on either side, and end the
/// session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Failed to send a message through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a message from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The transport connection was closed unexpectedly.
    #[error("transport connection closed")]
    TransportClosed,

    /// Could not establish a connection to the game server.
    #[error("connect error: {0}")]
    Connect(String),

    /// Failed to serialize an outbound message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An inbound payload was malformed or violated the message schema.
    #[error("malformed server message: {source}")]
    Decode {
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// A well-formed server message carried a method this client does not know.
    #[error("unhandled server message method: {method:?}")]
    UnhandledMethod {
        /// The unrecognized `method` tag.
        method: String,
    },

    /// The server sent a room state that does not contain the local player.
    #[error("player {player_id} not found in any team")]
    PlayerNotFound {
        /// Identifier the server assigned to this client.
        player_id: PlayerId,
    },

    /// Reconnection attempts were exhausted.
    #[error("session dead after {attempts} consecutive connection failures")]
    SessionDead {
        /// Number of consecutive unplanned closes observed.
        attempts: u32,
    },

    /// The server rejected this client build as outdated.
    #[error("client build is outdated, reload required")]
    OutdatedBuild,

    /// An operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// The connection parameters could not be encoded as a query string.
    #[error("query encoding error: {0}")]
    QueryEncoding(#[from] serde_urlencoded::ser::Error),
}

impl SessionError {
    /// Returns `true` for errors that must terminate the session rather than
    /// trigger a reconnect.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Serialization(_)
                | Self::Decode { .. }
                | Self::UnhandledMethod { .. }
                | Self::PlayerNotFound { .. }
        )
    }
}

/// A specialized [`Result`] type for game session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
