//! Async game session for one room.
//!
//! [`GameSession`] is a thin handle around a background session loop task.
//! The loop owns the connection, the [`ReconnectPolicy`] and the
//! [`StateReconciler`]; the handle hands out a [`Sender`] for intents and a
//! `watch` receiver for the latest [`GameView`]. Lifecycle events are emitted
//! on a bounded channel returned from [`GameSession::start`].
//!
//! # Example
//!
//! ```rust,ignore
//! let connector = WebSocketConnector::new("wss://example.com/api/ws");
//! let config = SessionConfig::new("R1", "Ann");
//! let (session, mut events) = GameSession::start(connector, config);
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         SessionEvent::StateUpdated(view) => {
//!             if view.is_my_turn() {
//!                 session.sender().end_turn();
//!             }
//!         }
//!         SessionEvent::Dead { .. } => break, // back to the lobby
//!         _ => {}
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::close_codes::CloseCode;
use crate::codec;
use crate::error::{Result, SessionError};
use crate::event::SessionEvent;
use crate::protocol::Intent;
use crate::reconciler::StateReconciler;
use crate::reconnect::{CloseDecision, ReconnectPolicy, TeardownFlag, DEFAULT_RECONNECT_CEILING};
use crate::resolver::GameView;
use crate::sender::Sender;
use crate::transport::{ConnectParams, Connector, Transport};

/// Default capacity of the bounded event channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default timeout for the graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Default pause between an unplanned close and the next connect attempt.
const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

/// Caller-supplied callback invoked from the session loop.
pub type Hook = Arc<dyn Fn() + Send + Sync>;

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`GameSession`].
///
/// `room_id` and `nickname` are required; all others have sensible defaults.
/// The `(room_id, nickname, protocol_version)` triple identifies the
/// connection and is fixed for the lifetime of the session.
///
/// # Example
///
/// ```
/// use wordgame_session::client::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::new("R1", "Ann")
///     .with_reconnect_ceiling(3)
///     .with_reconnect_interval(Duration::from_secs(2))
///     .on_dead(|| println!("back to the lobby"));
/// assert_eq!(config.room_id, "R1");
/// assert_eq!(config.reconnect_ceiling, 3);
/// ```
#[derive(Clone)]
pub struct SessionConfig {
    /// Room to join.
    pub room_id: String,
    /// Nickname supplied when joining. Reused verbatim on every reconnect.
    pub nickname: String,
    /// Exact client build identifier the server checks.
    /// Defaults to the crate version at compile time.
    pub protocol_version: String,
    /// Consecutive unplanned closes, with no message received in between,
    /// after which the session is declared dead.
    ///
    /// Defaults to **2**. Values below 1 are clamped to 1.
    pub reconnect_ceiling: u32,
    /// Pause before each reconnect attempt. Defaults to **5 seconds**.
    pub reconnect_interval: Duration,
    /// Capacity of the bounded event channel.
    ///
    /// When the consumer cannot keep up, non-terminal events are dropped
    /// (with a warning logged). The latest view is always available through
    /// [`GameSession::view`], and the terminal event is always delivered.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    pub event_channel_capacity: usize,
    /// Timeout for the graceful shutdown. Defaults to **1 second**.
    pub shutdown_timeout: Duration,
    /// Called once when reconnect attempts are exhausted.
    pub on_dead: Option<Hook>,
    /// Called on every successful open, to resync server time.
    pub on_resync: Option<Hook>,
    /// Called once when the server reports this build as outdated.
    pub on_reload: Option<Hook>,
}

impl SessionConfig {
    /// Create a new configuration for `room_id` and `nickname` with default values.
    pub fn new(room_id: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            nickname: nickname.into(),
            protocol_version: env!("CARGO_PKG_VERSION").to_string(),
            reconnect_ceiling: DEFAULT_RECONNECT_CEILING,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            on_dead: None,
            on_resync: None,
            on_reload: None,
        }
    }

    /// Override the client build identifier sent to the server.
    #[must_use]
    pub fn with_protocol_version(mut self, protocol_version: impl Into<String>) -> Self {
        self.protocol_version = protocol_version.into();
        self
    }

    /// Set the reconnect ceiling. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_reconnect_ceiling(mut self, ceiling: u32) -> Self {
        self.reconnect_ceiling = ceiling.max(1);
        self
    }

    /// Set the pause before each reconnect attempt.
    #[must_use]
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Set the capacity of the bounded event channel. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Set the timeout for the graceful shutdown. A zero timeout aborts the
    /// session loop immediately.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    #[must_use]
    pub fn on_dead(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_dead = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn on_resync(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_resync = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn on_reload(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_reload = Some(Arc::new(hook));
        self
    }

    /// The connection identity derived from this configuration.
    pub fn connect_params(&self) -> ConnectParams {
        ConnectParams::new(&self.room_id, &self.nickname, &self.protocol_version)
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("room_id", &self.room_id)
            .field("nickname", &self.nickname)
            .field("protocol_version", &self.protocol_version)
            .field("reconnect_ceiling", &self.reconnect_ceiling)
            .field("reconnect_interval", &self.reconnect_interval)
            .field("event_channel_capacity", &self.event_channel_capacity)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("on_dead", &self.on_dead.is_some())
            .field("on_resync", &self.on_resync.is_some())
            .field("on_reload", &self.on_reload.is_some())
            .finish()
    }
}

// ── Outcome ─────────────────────────────────────────────────────────

/// How a session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// The owner shut the session down.
    Closed,
    /// Reconnect attempts were exhausted.
    Dead { attempts: u32 },
    /// The server rejected this client build.
    ReloadRequired,
    /// An unrecoverable protocol error.
    Fatal(SessionError),
}

impl SessionOutcome {
    /// `Ok(())` for an owner-requested close, otherwise the matching error.
    ///
    /// # Errors
    ///
    /// [`SessionError::SessionDead`], [`SessionError::OutdatedBuild`], or the
    /// fatal error that ended the session.
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Closed => Ok(()),
            Self::Dead { attempts } => Err(SessionError::SessionDead { attempts }),
            Self::ReloadRequired => Err(SessionError::OutdatedBuild),
            Self::Fatal(err) => Err(err),
        }
    }
}

// ── Session handle ──────────────────────────────────────────────────

/// Handle to a running game session.
///
/// Created via [`GameSession::start`], which spawns the background session
/// loop and returns this handle together with an event receiver.
pub struct GameSession {
    /// Intent dispatcher bound to the session loop.
    sender: Sender,
    /// Latest resolved view, published by the session loop.
    view_rx: watch::Receiver<Option<Arc<GameView>>>,
    /// Set when the owner tears the session down.
    teardown: TeardownFlag,
    /// Handle to the background session loop task.
    task: Option<tokio::task::JoinHandle<SessionOutcome>>,
    /// Oneshot sender to signal the session loop to shut down gracefully.
    shutdown_tx: Option<oneshot::Sender<()>>,
    /// Timeout for the graceful shutdown.
    shutdown_timeout: Duration,
}

impl GameSession {
    /// Start the session loop and return a handle plus event receiver.
    ///
    /// The loop connects immediately through `connector`, and reconnects
    /// through it according to the configured policy.
    #[must_use = "the event receiver must be used to receive events"]
    pub fn start<C: Connector>(
        connector: C,
        config: SessionConfig,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<Intent>();
        // Clamp capacity to at least 1 (tokio panics on 0).
        let capacity = config.event_channel_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (view_tx, view_rx) = watch::channel::<Option<Arc<GameView>>>(None);

        let teardown = TeardownFlag::new();
        let shutdown_timeout = config.shutdown_timeout;

        let session_loop = SessionLoop {
            connector,
            params: config.connect_params(),
            policy: ReconnectPolicy::new(config.reconnect_ceiling, teardown.clone()),
            reconciler: StateReconciler::new(),
            config,
            cmd_rx,
            event_tx,
            view_tx,
            shutdown_rx,
        };
        let task = tokio::spawn(session_loop.run());

        let session = Self {
            sender: Sender::new(cmd_tx),
            view_rx,
            teardown,
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout,
        };

        (session, event_rx)
    }

    /// Intent dispatcher for this session.
    pub fn sender(&self) -> Sender {
        self.sender.clone()
    }

    /// Latest resolved view, `None` until the first snapshot arrives.
    pub fn view(&self) -> Option<Arc<GameView>> {
        self.view_rx.borrow().clone()
    }

    /// A receiver that is notified whenever the view changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<GameView>>> {
        self.view_rx.clone()
    }

    /// Returns `true` while the session loop is running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Tear the session down, closing the connection and stopping the loop.
    ///
    /// No reconnect is attempted after this call, even if a close arrives
    /// concurrently. Returns how the session ended, or `None` if it was
    /// already joined or had to be aborted.
    pub async fn shutdown(&mut self) -> Option<SessionOutcome> {
        debug!("GameSession: shutdown requested");
        self.teardown.tear_down();

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        // Await the loop with a timeout. If it doesn't exit in time, abort it
        // so the task cannot detach and run indefinitely.
        let mut task = self.task.take()?;
        match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
            Ok(Ok(outcome)) => Some(outcome),
            Ok(Err(join_err)) => {
                warn!("session loop terminated with join error: {join_err}");
                None
            }
            Err(_) => {
                warn!("session loop did not exit within timeout; aborting task");
                task.abort();
                if let Err(join_err) = task.await {
                    debug!("session loop aborted: {join_err}");
                }
                None
            }
        }
    }

    /// Wait for the session to end on its own (dead, reload, or fatal error).
    pub async fn join(mut self) -> Option<SessionOutcome> {
        let task = self.task.take()?;
        match task.await {
            Ok(outcome) => Some(outcome),
            Err(join_err) => {
                warn!("session loop terminated with join error: {join_err}");
                None
            }
        }
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("running", &self.is_running())
            .field("torn_down", &self.teardown.is_torn_down())
            .field("synced", &self.view_rx.borrow().is_some())
            .finish()
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        // `Drop` is synchronous, so the loop is aborted rather than closed
        // gracefully. The teardown flag is set first so a close racing the
        // abort cannot schedule a reconnect.
        self.teardown.tear_down();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Session loop ────────────────────────────────────────────────────

/// Result of trying to open a connection.
enum Opened<T> {
    Transport(T),
    Failed(SessionError),
    Shutdown,
}

/// Why a connection stopped being driven.
enum ConnectionEnd {
    Shutdown,
    Closed {
        code: Option<CloseCode>,
        reason: Option<String>,
    },
    Fatal(SessionError),
}

/// State owned by the background task. Every inbound message and every
/// intent is handled to completion before the next is looked at.
struct SessionLoop<C: Connector> {
    connector: C,
    params: ConnectParams,
    policy: ReconnectPolicy,
    reconciler: StateReconciler,
    config: SessionConfig,
    cmd_rx: mpsc::UnboundedReceiver<Intent>,
    event_tx: mpsc::Sender<SessionEvent>,
    view_tx: watch::Sender<Option<Arc<GameView>>>,
    shutdown_rx: oneshot::Receiver<()>,
}

impl<C: Connector> SessionLoop<C> {
    async fn run(mut self) -> SessionOutcome {
        debug!(room_id = %self.params.room_id, "session loop started");

        let outcome = loop {
            let end = match self.open().await {
                Opened::Transport(transport) => {
                    self.on_open();
                    self.drive(transport).await
                }
                Opened::Failed(err) => {
                    warn!("connect failed: {err}");
                    ConnectionEnd::Closed {
                        code: None,
                        reason: Some(err.to_string()),
                    }
                }
                Opened::Shutdown => ConnectionEnd::Shutdown,
            };

            match end {
                ConnectionEnd::Shutdown => break SessionOutcome::Closed,
                ConnectionEnd::Fatal(err) => break SessionOutcome::Fatal(err),
                ConnectionEnd::Closed { code, reason } => {
                    emit_event(&self.event_tx, SessionEvent::Disconnected { code, reason });
                    match self.policy.on_close(code) {
                        CloseDecision::Suppressed => break SessionOutcome::Closed,
                        CloseDecision::Reload => break SessionOutcome::ReloadRequired,
                        CloseDecision::Dead { attempts } => {
                            break SessionOutcome::Dead { attempts }
                        }
                        CloseDecision::Reconnect { attempt } => {
                            debug!(attempt, "scheduling reconnect");
                            emit_event(&self.event_tx, SessionEvent::Reconnecting { attempt });
                            if !self.wait_before_reconnect().await {
                                break SessionOutcome::Closed;
                            }
                        }
                    }
                }
            }
        };

        self.finish(&outcome).await;
        debug!("session loop exited");
        outcome
    }

    /// Connect, while discarding intents and watching for shutdown.
    async fn open(&mut self) -> Opened<C::Transport> {
        let connect = self.connector.connect(&self.params);
        tokio::pin!(connect);

        loop {
            tokio::select! {
                result = &mut connect => {
                    return match result {
                        Ok(transport) => Opened::Transport(transport),
                        Err(err) => Opened::Failed(err),
                    };
                }
                _ = &mut self.shutdown_rx => return Opened::Shutdown,
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(intent) => discard_offline(&intent),
                    None => return Opened::Shutdown,
                },
            }
        }
    }

    fn on_open(&mut self) {
        info!(room_id = %self.params.room_id, "connected to game server");
        emit_event(&self.event_tx, SessionEvent::Connected);
        if let Some(hook) = &self.config.on_resync {
            hook();
        }
    }

    /// Multiplex intents, shutdown and inbound messages on one connection.
    async fn drive(&mut self, mut transport: C::Transport) -> ConnectionEnd {
        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(intent) => {
                        if let Err(err) = self.transmit(&mut transport, intent).await {
                            let end = send_failure(err, transport.close_code());
                            if matches!(end, ConnectionEnd::Fatal(_)) {
                                let _ = transport.close().await;
                            }
                            return end;
                        }
                    }
                    // Every sender dropped, including the handle's.
                    None => {
                        debug!("command channel closed, shutting down session loop");
                        let _ = transport.close().await;
                        return ConnectionEnd::Shutdown;
                    }
                },

                _ = &mut self.shutdown_rx => {
                    debug!("shutdown signal received");
                    let _ = transport.close().await;
                    return ConnectionEnd::Shutdown;
                }

                incoming = transport.recv() => match incoming {
                    Some(Ok(text)) => {
                        self.policy.on_message();
                        if let Err(err) = self.handle_text(&text) {
                            error!(raw = %text, "fatal protocol error: {err}");
                            let _ = transport.close().await;
                            return ConnectionEnd::Fatal(err);
                        }
                    }
                    Some(Err(err)) => {
                        warn!("transport receive error: {err}");
                        return ConnectionEnd::Closed {
                            code: transport.close_code(),
                            reason: Some(err.to_string()),
                        };
                    }
                    None => {
                        let code = transport.close_code();
                        debug!(?code, "transport closed by server");
                        return ConnectionEnd::Closed { code, reason: None };
                    }
                },
            }
        }
    }

    /// Stamp and send one intent. Intents before the first snapshot are
    /// dropped by the reconciler.
    async fn transmit(&mut self, transport: &mut C::Transport, intent: Intent) -> Result<()> {
        let Some(note) = self.reconciler.apply_intent(intent) else {
            return Ok(());
        };
        debug!(
            method = note.intent.method(),
            version = note.version,
            "sending client note"
        );
        let json = codec::encode_client_note(&note)?;
        transport.send(json).await
    }

    /// Decode, reconcile, resolve and publish one inbound message.
    fn handle_text(&mut self, text: &str) -> Result<()> {
        let note = codec::decode_server_note(text)?;
        self.reconciler.apply_server_note(note);

        if let Some(state) = self.reconciler.state() {
            let view = GameView::resolve(state.clone())?;
            self.view_tx.send_replace(Some(Arc::clone(&view)));
            emit_event(&self.event_tx, SessionEvent::StateUpdated(view));
        }
        Ok(())
    }

    /// Pause before reconnecting. Returns `false` if the session was shut
    /// down while waiting.
    async fn wait_before_reconnect(&mut self) -> bool {
        let sleep = tokio::time::sleep(self.config.reconnect_interval);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                _ = &mut self.shutdown_rx => return false,
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(intent) => discard_offline(&intent),
                    None => return false,
                },
            }
        }
    }

    /// Run the hooks for `outcome` and deliver the terminal event.
    async fn finish(&mut self, outcome: &SessionOutcome) {
        let event = match outcome {
            SessionOutcome::Closed => SessionEvent::Closed,
            SessionOutcome::Dead { attempts } => {
                warn!(attempts, "session dead, giving up");
                if let Some(hook) = &self.config.on_dead {
                    hook();
                }
                SessionEvent::Dead {
                    attempts: *attempts,
                }
            }
            SessionOutcome::ReloadRequired => {
                warn!("client build outdated, reload required");
                if let Some(hook) = &self.config.on_reload {
                    hook();
                }
                SessionEvent::ReloadRequired
            }
            SessionOutcome::Fatal(err) => SessionEvent::Fatal {
                error: err.to_string(),
            },
        };

        // Uses `send().await` instead of `try_send` because the terminal
        // event must never be silently dropped.
        if self.event_tx.send(event).await.is_err() {
            debug!("event channel closed, receiver dropped");
        }
    }
}

/// Classify a failed [`SessionLoop::transmit`]. An intent that cannot be
/// encoded ends the session; a failed send is an unplanned close.
fn send_failure(err: SessionError, code: Option<CloseCode>) -> ConnectionEnd {
    if err.is_fatal() {
        error!("failed to encode client note: {err}");
        ConnectionEnd::Fatal(err)
    } else {
        error!("transport send error: {err}");
        ConnectionEnd::Closed {
            code,
            reason: Some(err.to_string()),
        }
    }
}

fn discard_offline(intent: &Intent) {
    warn!(method = intent.method(), "not connected, intent discarded");
}

/// Emit an event to the event channel. If the channel is full, log a warning
/// and drop the event to avoid blocking the session loop.
fn emit_event(event_tx: &mpsc::Sender<SessionEvent>, event: SessionEvent) {
    match event_tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!("event channel full, dropping event: {dropped:?}");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("event channel closed, receiver dropped");
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::protocol::{ClientState, RoomState, ServerNote, StatePlayer};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    // ── Mock transport ──────────────────────────────────────────────

    /// A transport that replays scripted frames and records what is sent.
    /// `None` entries close the connection with the given code.
    struct MockTransport {
        incoming: VecDeque<std::result::Result<String, Option<CloseCode>>>,
        sent: Arc<StdMutex<Vec<String>>>,
        close_code: Option<CloseCode>,
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&mut self, message: String) -> std::result::Result<(), SessionError> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }

        async fn recv(&mut self) -> Option<std::result::Result<String, SessionError>> {
            match self.incoming.pop_front() {
                Some(Ok(text)) => Some(Ok(text)),
                Some(Err(code)) => {
                    self.close_code = code;
                    None
                }
                // Hang so the loop stays alive until shutdown.
                None => std::future::pending().await,
            }
        }

        async fn close(&mut self) -> std::result::Result<(), SessionError> {
            Ok(())
        }

        fn close_code(&self) -> Option<CloseCode> {
            self.close_code
        }
    }

    /// Hands out one scripted transport per connect; fails once exhausted.
    struct MockConnector {
        scripts: VecDeque<Vec<std::result::Result<String, Option<CloseCode>>>>,
        sent: Arc<StdMutex<Vec<String>>>,
        connects: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Connector for MockConnector {
        type Transport = MockTransport;

        async fn connect(
            &mut self,
            _params: &ConnectParams,
        ) -> std::result::Result<MockTransport, SessionError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            let script = self
                .scripts
                .pop_front()
                .ok_or_else(|| SessionError::Connect("no more scripted connections".into()))?;
            Ok(MockTransport {
                incoming: VecDeque::from(script),
                sent: Arc::clone(&self.sent),
                close_code: None,
            })
        }
    }

    fn connector(
        scripts: Vec<Vec<std::result::Result<String, Option<CloseCode>>>>,
    ) -> (MockConnector, Arc<StdMutex<Vec<String>>>, Arc<AtomicUsize>) {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let connects = Arc::new(AtomicUsize::new(0));
        let c = MockConnector {
            scripts: VecDeque::from(scripts),
            sent: Arc::clone(&sent),
            connects: Arc::clone(&connects),
        };
        (c, sent, connects)
    }

    fn config() -> SessionConfig {
        SessionConfig::new("R1", "Ann").with_reconnect_interval(Duration::ZERO)
    }

    fn state_json(version: u64) -> String {
        let me = uuid::Uuid::from_u128(1);
        let note = ServerNote::State(ClientState {
            player_id: me,
            room_state: RoomState {
                version,
                teams: vec![vec![StatePlayer {
                    player_id: me,
                    nickname: "Ann".into(),
                    spymaster: false,
                }]],
                turn: 0,
                grow_shrink: false,
                winner: None,
                board: vec![],
                words_left: vec![],
                lists: vec![],
                word_count: 0,
                timer: None,
                hide_bomb: false,
            },
        });
        serde_json::to_string(&note).unwrap()
    }

    // ── Tests ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn connected_then_state_updated() {
        let (c, _sent, _connects) = connector(vec![vec![Ok(state_json(1))]]);
        let (mut session, mut events) = GameSession::start(c, config());

        assert_eq!(events.recv().await.unwrap(), SessionEvent::Connected);
        match events.recv().await.unwrap() {
            SessionEvent::StateUpdated(view) => {
                assert_eq!(view.room().version, 1);
                assert_eq!(view.team, 0);
            }
            other => panic!("expected StateUpdated, got {other:?}"),
        }
        assert_eq!(session.view().unwrap().player.nickname, "Ann");

        assert!(matches!(
            session.shutdown().await,
            Some(SessionOutcome::Closed)
        ));
    }

    #[tokio::test]
    async fn intent_is_sent_with_current_version() {
        let (c, sent, _connects) = connector(vec![vec![Ok(state_json(5))]]);
        let (mut session, mut events) = GameSession::start(c, config());

        let _ = events.recv().await; // Connected
        let _ = events.recv().await; // StateUpdated

        session.sender().end_turn();
        tokio::time::sleep(Duration::from_millis(50)).await;

        {
            let messages = sent.lock().unwrap();
            assert_eq!(messages.len(), 1);
            let value: serde_json::Value = serde_json::from_str(&messages[0]).unwrap();
            assert_eq!(
                value,
                serde_json::json!({"method": "endTurn", "params": {}, "version": 5})
            );
        }

        session.shutdown().await;
    }

    #[tokio::test]
    async fn dead_after_two_closes() {
        let (c, _sent, connects) = connector(vec![vec![Err(None)], vec![Err(None)]]);
        let (session, mut events) = GameSession::start(c, config());

        let mut seen = Vec::new();
        while let Some(event) = events.recv().await {
            seen.push(event);
        }
        assert_eq!(seen.last(), Some(&SessionEvent::Dead { attempts: 2 }));
        assert_eq!(connects.load(Ordering::SeqCst), 2);
        assert!(matches!(
            session.join().await,
            Some(SessionOutcome::Dead { attempts: 2 })
        ));
    }

    #[tokio::test]
    async fn config_defaults() {
        let config = SessionConfig::new("R1", "Ann");
        assert_eq!(config.room_id, "R1");
        assert_eq!(config.nickname, "Ann");
        assert_eq!(config.protocol_version, env!("CARGO_PKG_VERSION"));
        assert_eq!(config.reconnect_ceiling, 2);
        assert_eq!(config.reconnect_interval, Duration::from_secs(5));
        assert_eq!(config.event_channel_capacity, 256);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
        assert!(config.on_dead.is_none());
    }

    #[test]
    fn config_clamps_and_reports_hooks() {
        let config = SessionConfig::new("R1", "Ann")
            .with_reconnect_ceiling(0)
            .with_event_channel_capacity(0)
            .on_resync(|| {});
        assert_eq!(config.reconnect_ceiling, 1);
        assert_eq!(config.event_channel_capacity, 1);
        let debug = format!("{config:?}");
        assert!(debug.contains("on_resync: true"));
        assert!(debug.contains("on_dead: false"));
    }

    #[test]
    fn outcome_into_result() {
        assert!(SessionOutcome::Closed.into_result().is_ok());
        assert!(matches!(
            SessionOutcome::Dead { attempts: 2 }.into_result(),
            Err(SessionError::SessionDead { attempts: 2 })
        ));
        assert!(matches!(
            SessionOutcome::ReloadRequired.into_result(),
            Err(SessionError::OutdatedBuild)
        ));
    }

    #[test]
    fn unencodable_note_ends_the_session() {
        let source = serde_json::from_str::<serde_json::Value>("]").unwrap_err();
        let end = send_failure(SessionError::Serialization(source), None);
        assert!(matches!(
            end,
            ConnectionEnd::Fatal(SessionError::Serialization(_))
        ));
    }

    #[test]
    fn failed_send_is_an_unplanned_close() {
        let end = send_failure(
            SessionError::TransportSend("broken pipe".into()),
            Some(CloseCode::Abnormal),
        );
        match end {
            ConnectionEnd::Closed { code, reason } => {
                assert_eq!(code, Some(CloseCode::Abnormal));
                assert_eq!(reason.as_deref(), Some("transport send error: broken pipe"));
            }
            _ => panic!("expected an unplanned close"),
        }
    }
}
