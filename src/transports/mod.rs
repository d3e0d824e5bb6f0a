//! Transport implementations for the game session.
//!
//! This module provides concrete [`Transport`](crate::Transport) and
//! [`Connector`](crate::Connector) implementations behind feature gates.
//!
//! | Feature                | Transport              | Connector              |
//! |------------------------|------------------------|------------------------|
//! | `transport-websocket`  | [`WebSocketTransport`] | [`WebSocketConnector`] |
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), wordgame_session::SessionError> {
//! use wordgame_session::{ConnectParams, Connector, Transport, WebSocketConnector};
//!
//! let mut connector = WebSocketConnector::new("ws://localhost:5000/api/ws");
//! let params = ConnectParams::new("R1", "Ann", "1.0.0");
//! let mut ws = connector.connect(&params).await?;
//!
//! if let Some(Ok(msg)) = ws.recv().await {
//!     println!("server said: {msg}");
//! }
//!
//! ws.close().await?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "transport-websocket")]
pub mod websocket;

#[cfg(feature = "transport-websocket")]
pub use websocket::{WebSocketConnector, WebSocketTransport};
