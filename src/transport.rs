//! Transport abstraction for the game session.
//!
//! Two traits split the concerns:
//!
//! - [`Transport`] is one open, bidirectional text-message connection.
//! - [`Connector`] opens a new [`Transport`] for a given set of
//!   [`ConnectParams`]. The session calls it once at start and again for
//!   every reconnect, always with the same parameters.
//!
//! # Implementing a Custom Transport
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use wordgame_session::error::SessionError;
//! use wordgame_session::transport::Transport;
//!
//! struct MyTransport { /* ... */ }
//!
//! #[async_trait]
//! impl Transport for MyTransport {
//!     async fn send(&mut self, message: String) -> Result<(), SessionError> {
//!         // Send the JSON text message over your transport
//!         Ok(())
//!     }
//!
//!     async fn recv(&mut self) -> Option<Result<String, SessionError>> {
//!         // Receive the next JSON text message
//!         // Return None when the connection is closed
//!         None
//!     }
//!
//!     async fn close(&mut self) -> Result<(), SessionError> {
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::Serialize;

use crate::close_codes::CloseCode;
use crate::error::SessionError;

/// Identity of a session's connection.
///
/// Fixed when the session starts. Reconnects reuse it verbatim, so a player
/// who renames mid-session still reconnects under the nickname they joined
/// with. Serializes to the connection's query parameters, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectParams {
    #[serde(rename = "roomID")]
    pub room_id: String,
    pub nickname: String,
    /// Exact client build identifier, checked by the server.
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
}

impl ConnectParams {
    pub fn new(
        room_id: impl Into<String>,
        nickname: impl Into<String>,
        protocol_version: impl Into<String>,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            nickname: nickname.into(),
            protocol_version: protocol_version.into(),
        }
    }

    /// Form-encoded query string, without the leading `?`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::QueryEncoding`] if the parameters cannot be
    /// encoded.
    pub fn query_string(&self) -> Result<String, SessionError> {
        Ok(serde_urlencoded::to_string(self)?)
    }

    /// Append the query string to `base_url`, keeping any query it already has.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::QueryEncoding`] if the parameters cannot be
    /// encoded.
    pub fn apply_to(&self, base_url: &str) -> Result<String, SessionError> {
        let separator = if base_url.contains('?') { '&' } else { '?' };
        Ok(format!("{base_url}{separator}{}", self.query_string()?))
    }
}

/// A bidirectional text message transport to the game server.
///
/// Each call to [`send`](Transport::send) transmits one complete JSON message.
/// Each call to [`recv`](Transport::recv) returns one complete JSON message.
///
/// # Cancel Safety
///
/// The [`recv`](Transport::recv) method **MUST** be cancel-safe because it is used
/// inside `tokio::select!`. If `recv` is cancelled before completion, calling it
/// again must not lose data.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Send a JSON text message to the server.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::TransportSend`] if the message could not be sent.
    async fn send(&mut self, message: String) -> Result<(), SessionError>;

    /// Receive the next JSON text message from the server.
    ///
    /// Returns:
    /// - `Some(Ok(text))`: a complete message was received
    /// - `Some(Err(e))`: a transport error occurred
    /// - `None`: the connection was closed; see [`close_code`](Transport::close_code)
    async fn recv(&mut self) -> Option<Result<String, SessionError>>;

    /// Close the transport connection gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error if the graceful shutdown fails. Implementations should
    /// still release resources even if the close handshake fails.
    async fn close(&mut self) -> Result<(), SessionError>;

    /// Close code the server sent, once [`recv`](Transport::recv) has
    /// reported the connection closed. `None` if the connection dropped
    /// without a close frame or the transport has no notion of codes.
    fn close_code(&self) -> Option<CloseCode> {
        None
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&mut self, message: String) -> Result<(), SessionError> {
        (**self).send(message).await
    }

    async fn recv(&mut self) -> Option<Result<String, SessionError>> {
        (**self).recv().await
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        (**self).close().await
    }

    fn close_code(&self) -> Option<CloseCode> {
        (**self).close_code()
    }
}

/// Opens connections to the game server.
#[async_trait]
pub trait Connector: Send + 'static {
    /// The transport produced by a successful connect.
    type Transport: Transport;

    /// Open a new connection identified by `params`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established. The session
    /// counts this the same as an unplanned close.
    async fn connect(&mut self, params: &ConnectParams) -> Result<Self::Transport, SessionError>;
}
