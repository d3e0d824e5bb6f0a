//! # Word Game Session
//!
//! Client-side session core for a real-time, team-based multiplayer word
//! game.
//!
//! This crate keeps one live connection to the game server, turns player
//! intents into versioned messages, and folds the server's state pushes into
//! a single resolved view for presentation code.
//!
//! ## Features
//!
//! - **Server-authoritative**: the client never edits room state; intents
//!   are stamped with the version they were issued against and the server's
//!   next snapshot shows their effect
//! - **Bounded reconnection**: a retry ceiling reset by every received
//!   message, teardown suppression, and reload on outdated builds
//! - **Transport-agnostic**: implement [`Transport`] and [`Connector`] for
//!   any backend
//! - **WebSocket built-in**: default `transport-websocket` feature provides
//!   `WebSocketConnector`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # #[cfg(feature = "transport-websocket")]
//! # async fn example() {
//! use wordgame_session::{GameSession, SessionConfig, SessionEvent, WebSocketConnector};
//!
//! let connector = WebSocketConnector::new("ws://localhost:5000/api/ws");
//! let (session, mut events) = GameSession::start(connector, SessionConfig::new("R1", "Ann"));
//!
//! while let Some(event) = events.recv().await {
//!     if let SessionEvent::StateUpdated(view) = event {
//!         println!("on team {} at version {}", view.team, view.room().version);
//!         session.sender().change_team(1);
//!     }
//! }
//! # }
//! ```

pub mod close_codes;
pub mod codec;
pub mod error;
pub mod event;
pub mod protocol;
pub mod reconciler;
pub mod reconnect;
pub mod resolver;
pub mod sender;
pub mod transport;
pub mod transports;

#[cfg(feature = "tokio-runtime")]
pub mod client;

// Re-export primary types for ergonomic imports.
#[cfg(feature = "tokio-runtime")]
pub use client::{GameSession, SessionConfig, SessionOutcome};
pub use close_codes::CloseCode;
pub use error::SessionError;
pub use event::SessionEvent;
pub use protocol::{ClientNote, ClientState, Intent, RoomState, ServerNote, StatePlayer};
pub use reconciler::StateReconciler;
pub use resolver::{resolve_player, GameView};
pub use sender::Sender;
pub use transport::{ConnectParams, Connector, Transport};
#[cfg(feature = "transport-websocket")]
pub use transports::{WebSocketConnector, WebSocketTransport};
