//! # Loopback Session Example
//!
//! Shows how to plug a custom backend into the session by implementing
//! [`Transport`] and [`Connector`] over in-process channels. A small fake
//! server answers the connection with a room snapshot, then applies a team
//! change and pushes the next version.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example loopback_session --no-default-features --features tokio-runtime
//! ```

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;
use wordgame_session::{
    ConnectParams, Connector, GameSession, SessionConfig, SessionError, SessionEvent, Transport,
};

const ME: &str = "6f1c5a8e-2b6d-4a59-9c0e-3f7e2d9a1b01";

// ─────────────────────────────────────────────────────────────────────
// Step 1: A channel-based transport
// ─────────────────────────────────────────────────────────────────────

/// Client half of the loopback.
pub struct LoopbackTransport {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

/// Server half of the loopback.
pub struct LoopbackServer {
    pub rx: mpsc::UnboundedReceiver<String>,
    pub tx: mpsc::UnboundedSender<String>,
}

fn loopback_pair() -> (LoopbackTransport, LoopbackServer) {
    let (client_tx, server_rx) = mpsc::unbounded_channel();
    let (server_tx, client_rx) = mpsc::unbounded_channel();
    (
        LoopbackTransport {
            tx: client_tx,
            rx: client_rx,
        },
        LoopbackServer {
            rx: server_rx,
            tx: server_tx,
        },
    )
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&mut self, message: String) -> Result<(), SessionError> {
        self.tx
            .send(message)
            .map_err(|e| SessionError::TransportSend(e.to_string()))
    }

    /// `None` once the server half is dropped.
    async fn recv(&mut self) -> Option<Result<String, SessionError>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 2: A connector that hands out one loopback connection
// ─────────────────────────────────────────────────────────────────────

struct LoopbackConnector {
    server_tx: Option<mpsc::UnboundedSender<(ConnectParams, LoopbackServer)>>,
}

#[async_trait]
impl Connector for LoopbackConnector {
    type Transport = LoopbackTransport;

    async fn connect(&mut self, params: &ConnectParams) -> Result<LoopbackTransport, SessionError> {
        let server_tx = self
            .server_tx
            .take()
            .ok_or_else(|| SessionError::Connect("loopback already used".into()))?;
        let (transport, server) = loopback_pair();
        server_tx
            .send((params.clone(), server))
            .map_err(|e| SessionError::Connect(e.to_string()))?;
        Ok(transport)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 3: A fake server
// ─────────────────────────────────────────────────────────────────────

fn snapshot(version: u64, my_team: usize) -> String {
    let me = json!({"playerID": ME, "nickname": "Ann", "spymaster": false});
    let mut teams = vec![json!([]), json!([])];
    if let Some(slot) = teams.get_mut(my_team) {
        *slot = json!([me]);
    }
    json!({
        "method": "state",
        "params": {
            "playerID": ME,
            "roomState": {"version": version, "teams": teams, "turn": 0}
        }
    })
    .to_string()
}

async fn fake_server(mut incoming: mpsc::UnboundedReceiver<(ConnectParams, LoopbackServer)>) {
    let Some((params, mut server)) = incoming.recv().await else {
        return;
    };
    tracing::info!(
        room_id = %params.room_id,
        nickname = %params.nickname,
        "server: join request"
    );

    let _ = server.tx.send(snapshot(1, 0));

    while let Some(raw) = server.rx.recv().await {
        tracing::info!("server: received {raw}");
        let Ok(note) = serde_json::from_str::<serde_json::Value>(&raw) else {
            continue;
        };
        if note["method"] == "changeTeam" {
            let team = note["params"]["team"].as_u64().unwrap_or(0);
            let version = note["version"].as_u64().unwrap_or(0) + 1;
            let _ = server.tx.send(snapshot(version, usize::try_from(team).unwrap_or(0)));
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 4: Wire the session to the fake server
// ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (server_tx, server_rx) = mpsc::unbounded_channel();
    tokio::spawn(fake_server(server_rx));

    let connector = LoopbackConnector {
        server_tx: Some(server_tx),
    };
    let (mut session, mut events) = GameSession::start(connector, SessionConfig::new("R1", "Ann"));

    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::StateUpdated(view) if view.room().version == 1 => {
                tracing::info!("on team {}, asking for team 1", view.team);
                session.sender().change_team(1);
            }
            SessionEvent::StateUpdated(view) => {
                tracing::info!("now on team {} at version {}", view.team, view.room().version);
                break;
            }
            other if other.is_terminal() => {
                tracing::warn!("session ended early: {other:?}");
                break;
            }
            other => tracing::info!("event: {other:?}"),
        }
    }

    session.shutdown().await;
    tracing::info!("Done. Custom connector works!");
    Ok(())
}
