#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for game session integration tests.
//!
//! Provides a channel-based [`MockConnector`] whose transports are driven from
//! the test through [`MockServer`] handles, plus helpers for building room
//! state JSON.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use wordgame_session::protocol::{ClientState, RoomState, ServerNote, StatePlayer};
use wordgame_session::{CloseCode, ConnectParams, Connector, SessionError, SessionEvent, Transport};

// ── MockTransport ───────────────────────────────────────────────────

/// What the scripted server does next on a connection.
#[derive(Debug)]
pub enum Frame {
    Text(String),
    Close(Option<CloseCode>),
    Error(String),
}

/// Client half of an in-process connection.
pub struct MockTransport {
    rx: mpsc::UnboundedReceiver<Frame>,
    sent: mpsc::UnboundedSender<String>,
    close_code: Option<CloseCode>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, message: String) -> Result<(), SessionError> {
        self.sent
            .send(message)
            .map_err(|e| SessionError::TransportSend(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, SessionError>> {
        match self.rx.recv().await {
            Some(Frame::Text(text)) => Some(Ok(text)),
            Some(Frame::Close(code)) => {
                self.close_code = code;
                None
            }
            Some(Frame::Error(reason)) => Some(Err(SessionError::TransportReceive(reason))),
            // The test dropped the server handle; hang so the session loop
            // stays alive until shutdown.
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        Ok(())
    }

    fn close_code(&self) -> Option<CloseCode> {
        self.close_code
    }
}

/// Server half of an in-process connection.
pub struct MockServer {
    tx: mpsc::UnboundedSender<Frame>,
    sent_rx: mpsc::UnboundedReceiver<String>,
}

impl MockServer {
    pub fn push(&self, frame: Frame) {
        self.tx.send(frame).expect("transport dropped");
    }

    pub fn send_text(&self, text: impl Into<String>) {
        self.push(Frame::Text(text.into()));
    }

    pub fn close(&self, code: Option<CloseCode>) {
        self.push(Frame::Close(code));
    }

    /// Next message the client sent, waiting up to one second.
    pub async fn next_sent(&mut self) -> Option<String> {
        tokio::time::timeout(Duration::from_secs(1), self.sent_rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Every message the client has sent so far, without waiting.
    pub fn drain_sent(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(text) = self.sent_rx.try_recv() {
            out.push(text);
        }
        out
    }
}

fn mock_pair() -> (MockTransport, MockServer) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (sent_tx, sent_rx) = mpsc::unbounded_channel();
    (
        MockTransport {
            rx,
            sent: sent_tx,
            close_code: None,
        },
        MockServer { tx, sent_rx },
    )
}

// ── MockConnector ───────────────────────────────────────────────────

/// Hands out the prepared transports in order; fails once they run out.
pub struct MockConnector {
    transports: VecDeque<MockTransport>,
    pub params_seen: Arc<StdMutex<Vec<ConnectParams>>>,
    pub connects: Arc<AtomicUsize>,
}

/// Observation handles shared with a [`MockConnector`].
#[derive(Clone)]
pub struct ConnectLog {
    pub params_seen: Arc<StdMutex<Vec<ConnectParams>>>,
    pub connects: Arc<AtomicUsize>,
}

impl ConnectLog {
    pub fn count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn params(&self) -> Vec<ConnectParams> {
        self.params_seen.lock().unwrap().clone()
    }
}

impl MockConnector {
    /// Prepare `n` connections. Returns the connector, one server handle
    /// per connection (in connect order), and the connect log.
    pub fn with_connections(n: usize) -> (Self, Vec<MockServer>, ConnectLog) {
        let mut transports = VecDeque::new();
        let mut servers = Vec::new();
        for _ in 0..n {
            let (transport, server) = mock_pair();
            transports.push_back(transport);
            servers.push(server);
        }
        let log = ConnectLog {
            params_seen: Arc::new(StdMutex::new(Vec::new())),
            connects: Arc::new(AtomicUsize::new(0)),
        };
        let connector = Self {
            transports,
            params_seen: Arc::clone(&log.params_seen),
            connects: Arc::clone(&log.connects),
        };
        (connector, servers, log)
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Transport = MockTransport;

    async fn connect(&mut self, params: &ConnectParams) -> Result<MockTransport, SessionError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.params_seen.lock().unwrap().push(params.clone());
        self.transports
            .pop_front()
            .ok_or_else(|| SessionError::Connect("connection refused".into()))
    }
}

// ── State helpers ───────────────────────────────────────────────────

pub fn pid(n: u128) -> uuid::Uuid {
    uuid::Uuid::from_u128(n)
}

pub fn player(n: u128, nickname: &str) -> StatePlayer {
    StatePlayer {
        player_id: pid(n),
        nickname: nickname.into(),
        spymaster: false,
    }
}

pub fn room(version: u64, teams: Vec<Vec<StatePlayer>>) -> RoomState {
    RoomState {
        version,
        teams,
        turn: 0,
        grow_shrink: false,
        winner: None,
        board: vec![],
        words_left: vec![],
        lists: vec![],
        word_count: 0,
        timer: None,
        hide_bomb: false,
    }
}

/// JSON for a `state` server note addressed to player `me`.
pub fn state_json(me: u128, version: u64, teams: Vec<Vec<StatePlayer>>) -> String {
    serde_json::to_string(&ServerNote::State(ClientState {
        player_id: pid(me),
        room_state: room(version, teams),
    }))
    .expect("state_json serialization")
}

// ── Event helpers ───────────────────────────────────────────────────

/// Next event, failing the test if none arrives within one second.
pub async fn next_event(rx: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Skip events until one matches `pred`, returning it.
pub async fn wait_for(
    rx: &mut mpsc::Receiver<SessionEvent>,
    pred: impl Fn(&SessionEvent) -> bool,
) -> SessionEvent {
    loop {
        let event = next_event(rx).await;
        if pred(&event) {
            return event;
        }
    }
}

/// Collect every remaining event until the channel closes.
pub async fn collect_all(rx: &mut mpsc::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut out = Vec::new();
    while let Ok(Some(event)) = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await {
        out.push(event);
    }
    out
}
