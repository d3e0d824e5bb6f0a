//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! This module provides [`WebSocketTransport`], a [`Transport`]
//! implementation that communicates over a WebSocket connection, and
//! [`WebSocketConnector`], which opens one against a base URL with the
//! session's query parameters appended. Both `ws://` and `wss://` URLs are
//! supported: TLS is handled transparently via
//! [`MaybeTlsStream`](tokio_tungstenite::MaybeTlsStream).
//!
//! # Feature gate
//!
//! This module is only available when the `transport-websocket` feature is enabled
//! (it is enabled by default).

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::close_codes::CloseCode;
use crate::error::SessionError;
use crate::transport::{ConnectParams, Connector, Transport};

/// Type alias for the underlying WebSocket stream.
///
/// Made public so that callers can construct a [`WebSocketTransport`] from an
/// existing stream via [`WebSocketTransport::from_stream`].
pub type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// A [`Transport`] implementation backed by a WebSocket connection.
///
/// Remembers the code of the close frame the server sent, if any, so the
/// session can tell an outdated-build rejection apart from an ordinary drop.
///
/// # Cancel Safety
///
/// The [`recv`](Transport::recv) method is cancel-safe. Dropping the future
/// returned by `recv` before it completes will not consume or lose any messages,
/// making it safe to use inside `tokio::select!`.
#[derive(Debug)]
pub struct WebSocketTransport {
    stream: WsStream,
    closed: bool,
    close_code: Option<CloseCode>,
}

impl WebSocketTransport {
    /// Establish a new WebSocket connection to the given URL.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Connect`] if the URL is invalid, the
    /// connection cannot be established, or the server refuses the upgrade.
    pub async fn connect(url: &str) -> Result<Self, SessionError> {
        tracing::debug!(url = %url, "connecting to WebSocket server");

        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))?;

        tracing::info!(url = %url, "WebSocket connection established");

        Ok(Self::from_stream(stream))
    }

    /// Create a [`WebSocketTransport`] from an already-established WebSocket stream.
    pub fn from_stream(stream: WsStream) -> Self {
        Self {
            stream,
            closed: false,
            close_code: None,
        }
    }

    /// Establish a new WebSocket connection with a timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Timeout`] if the deadline elapses, or any
    /// error that [`connect`](Self::connect) may return.
    pub async fn connect_with_timeout(url: &str, timeout: Duration) -> Result<Self, SessionError> {
        tokio::time::timeout(timeout, Self::connect(url))
            .await
            .map_err(|_| SessionError::Timeout)?
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, message: String) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::TransportClosed);
        }
        self.stream
            .send(Message::Text(message.into()))
            .await
            .map_err(|e| SessionError::TransportSend(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, SessionError>> {
        loop {
            let msg = match self.stream.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => {
                    return Some(Err(SessionError::TransportReceive(e.to_string())));
                }
                None => return None,
            };

            match msg {
                Message::Text(text) => return Some(Ok(text.to_string())),
                Message::Close(frame) => {
                    tracing::debug!(?frame, "received WebSocket close frame");
                    self.close_code = frame.map(|f| CloseCode::from_u16(u16::from(f.code)));
                    return None;
                }
                Message::Ping(_) => {
                    tracing::debug!("received WebSocket ping (auto-pong handled by tungstenite)");
                }
                Message::Pong(_) => {
                    tracing::debug!("received WebSocket pong (ignored)");
                }
                Message::Binary(_) => {
                    tracing::warn!("received unexpected binary WebSocket frame, skipping");
                }
                Message::Frame(_) => {
                    tracing::debug!("received raw WebSocket frame, skipping");
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream
            .close(None)
            .await
            .map_err(|e| SessionError::TransportSend(e.to_string()))
    }

    fn close_code(&self) -> Option<CloseCode> {
        self.close_code
    }
}

/// Opens [`WebSocketTransport`]s against a fixed base URL.
///
/// The session's [`ConnectParams`] are appended as the `roomID`, `nickname`
/// and `protocolVersion` query parameters.
///
/// ```
/// use std::time::Duration;
/// use wordgame_session::WebSocketConnector;
///
/// let connector = WebSocketConnector::new("wss://example.com/api/ws")
///     .with_connect_timeout(Duration::from_secs(10));
/// assert_eq!(connector.base_url(), "wss://example.com/api/ws");
/// ```
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    base_url: String,
    connect_timeout: Option<Duration>,
}

impl WebSocketConnector {
    /// Create a connector for the given `ws://` or `wss://` endpoint.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout: None,
        }
    }

    /// Fail connection attempts that take longer than `timeout`.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    type Transport = WebSocketTransport;

    async fn connect(&mut self, params: &ConnectParams) -> Result<WebSocketTransport, SessionError> {
        let url = params.apply_to(&self.base_url)?;
        match self.connect_timeout {
            Some(timeout) => WebSocketTransport::connect_with_timeout(&url, timeout).await,
            None => WebSocketTransport::connect(&url).await,
        }
    }
}

#[cfg(test)]
#[cfg(feature = "transport-websocket")]
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
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
    use tokio_tungstenite::tungstenite::protocol::CloseFrame;

    #[test]
    fn websocket_transport_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<WebSocketTransport>();
        assert_send::<WebSocketConnector>();
    }

    #[tokio::test]
    async fn connect_fails_with_invalid_url() {
        let result = WebSocketTransport::connect("not-a-valid-url").await;
        assert!(matches!(result.unwrap_err(), SessionError::Connect(_)));
    }

    #[tokio::test]
    async fn connect_fails_with_unreachable_host() {
        let result = WebSocketTransport::connect("ws://127.0.0.1:1").await;
        assert!(matches!(result.unwrap_err(), SessionError::Connect(_)));
    }

    #[tokio::test]
    async fn connect_with_timeout_times_out() {
        // Non-routable address guarantees a timeout.
        let result =
            WebSocketTransport::connect_with_timeout("ws://192.0.2.1:1", Duration::from_millis(50))
                .await;
        assert!(matches!(result.unwrap_err(), SessionError::Timeout));
    }

    // ── Mock-stream helpers ──────────────────────────────────────────────

    /// Start a local WebSocket server that runs `handler` on the accepted
    /// connection and returns the address to connect to.
    async fn start_mock_server<F, Fut>(handler: F) -> String
    where
        F: FnOnce(tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> Fut
            + Send
            + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            handler(ws).await;
        });

        format!("ws://{addr}")
    }

    // ── Mock-stream tests ────────────────────────────────────────────────

    #[tokio::test]
    async fn recv_receives_text_messages() {
        let url = start_mock_server(|mut ws| async move {
            ws.send(Message::Text("hello".into())).await.unwrap();
            ws.send(Message::Text("world".into())).await.unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        assert_eq!(transport.recv().await.unwrap().unwrap(), "hello");
        assert_eq!(transport.recv().await.unwrap().unwrap(), "world");
    }

    #[tokio::test]
    async fn close_frame_code_is_recorded() {
        let url = start_mock_server(|mut ws| async move {
            ws.close(Some(CloseFrame {
                code: WsCloseCode::from(4418),
                reason: "outdated".into(),
            }))
            .await
            .unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        assert!(transport.recv().await.is_none());
        assert_eq!(transport.close_code(), Some(CloseCode::OutdatedBuild));
    }

    #[tokio::test]
    async fn close_without_frame_has_no_code() {
        let url = start_mock_server(|mut ws| async move {
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        assert!(transport.recv().await.is_none());
        assert_eq!(transport.close_code(), None);
    }

    #[tokio::test]
    async fn recv_skips_binary_frames() {
        let url = start_mock_server(|mut ws| async move {
            ws.send(Message::Binary(vec![0xDE, 0xAD].into()))
                .await
                .unwrap();
            ws.send(Message::Text("after_binary".into())).await.unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        assert_eq!(transport.recv().await.unwrap().unwrap(), "after_binary");
    }

    #[tokio::test]
    async fn send_after_close_returns_transport_closed() {
        let url = start_mock_server(|mut ws| async move {
            while let Some(Ok(_)) = ws.next().await {}
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        transport.close().await.unwrap();
        transport.close().await.unwrap();

        let err = transport.send("oops".to_string()).await.unwrap_err();
        assert!(matches!(err, SessionError::TransportClosed));
    }

    #[tokio::test]
    async fn connector_sends_session_query_parameters() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (uri_tx, uri_rx) = tokio::sync::oneshot::channel::<String>();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                let _ = uri_tx.send(req.uri().to_string());
                Ok(resp)
            };
            let mut ws = tokio_tungstenite::accept_hdr_async(tcp, callback)
                .await
                .unwrap();
            while let Some(Ok(_)) = ws.next().await {}
        });

        let mut connector = WebSocketConnector::new(format!("ws://{addr}/api/ws"))
            .with_connect_timeout(Duration::from_secs(5));
        let params = ConnectParams::new("R1", "Ann Lee", "0.1.0");
        let mut transport = connector.connect(&params).await.unwrap();

        let uri = uri_rx.await.unwrap();
        assert_eq!(
            uri,
            "/api/ws?roomID=R1&nickname=Ann+Lee&protocolVersion=0.1.0"
        );

        transport.close().await.unwrap();
    }
}
