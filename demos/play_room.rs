//! # Play Room Example
//!
//! Joins a room on a running game server and follows it:
//!
//! 1. Connect over WebSocket with room id, nickname and build version
//! 2. Print every state update (team, turn, words left)
//! 3. Ask to join team 1 once the first snapshot arrives
//! 4. Shut down on Ctrl+C, or stop when the session dies or needs a reload
//!
//! ## Running
//!
//! ```sh
//! # Start a game server on localhost:5000, then:
//! cargo run --example play_room
//!
//! # Override the server, room or nickname:
//! GAME_URL=ws://my-server:5000/api/ws GAME_ROOM=lobby GAME_NICK=Bo \
//!     cargo run --example play_room
//! ```

use std::time::Duration;

use wordgame_session::{GameSession, SessionConfig, SessionEvent, WebSocketConnector};

/// Default server URL when `GAME_URL` is not set.
const DEFAULT_URL: &str = "ws://localhost:5000/api/ws";

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Set `RUST_LOG=wordgame_session=debug` for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let url = env_or("GAME_URL", DEFAULT_URL);
    let room = env_or("GAME_ROOM", "demo");
    let nickname = env_or("GAME_NICK", "Ann");
    tracing::info!("Joining room {room} as {nickname} via {url}");

    let connector = WebSocketConnector::new(url).with_connect_timeout(Duration::from_secs(10));
    let config = SessionConfig::new(room, nickname)
        .with_reconnect_interval(Duration::from_secs(2))
        .on_dead(|| tracing::warn!("lost the server, returning to the lobby"))
        .on_reload(|| tracing::warn!("this build is outdated, please update"));

    let (mut session, mut events) = GameSession::start(connector, config);
    let mut joined = false;

    // ── Event loop ──────────────────────────────────────────────────
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    SessionEvent::StateUpdated(view) => {
                        let room = view.room();
                        tracing::info!(
                            version = room.version,
                            team = view.team,
                            turn = room.turn,
                            words_left = ?room.words_left,
                            "state"
                        );
                        if !joined && view.team != 1 {
                            session.sender().change_team(1);
                            joined = true;
                        }
                    }
                    SessionEvent::Reconnecting { attempt } => {
                        tracing::info!("reconnecting (attempt {attempt})");
                    }
                    other if other.is_terminal() => {
                        tracing::info!("session ended: {other:?}");
                        break;
                    }
                    other => tracing::info!("event: {other:?}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, leaving the room");
                break;
            }
        }
    }

    // ── Clean shutdown ──────────────────────────────────────────────
    if let Some(outcome) = session.shutdown().await {
        tracing::info!("outcome: {outcome:?}");
    }
    Ok(())
}
