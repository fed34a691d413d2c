//! WebSocket client - one reusable session with a single receive loop
//!
//! `WsSession` owns at most one connection and at most one receive task.
//! Callers see it through [`SessionEvent`]s and a [`SessionState`] watch.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream};

use crate::constants::{REQUEST_TIMEOUT, WS_PING_INTERVAL};
use crate::error::{Result, TransportError, ValidationError};
use crate::models::HeaderSet;

/// Opens WebSocket connections.
#[async_trait]
pub trait WsConnector: Send + Sync {
    async fn connect(
        &self,
        url: &str,
        headers: &HeaderSet,
        verify_tls: bool,
    ) -> std::result::Result<Box<dyn WsConnection>, TransportError>;
}

/// An open connection. Sending and receiving may happen concurrently.
#[async_trait]
pub trait WsConnection: Send + Sync {
    async fn send(&self, text: &str) -> std::result::Result<(), TransportError>;

    /// Next inbound message, `None` once the peer has closed.
    async fn recv(&self) -> std::result::Result<Option<String>, TransportError>;

    async fn ping(&self) -> std::result::Result<(), TransportError>;

    async fn close(&self) -> std::result::Result<(), TransportError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Open,
    Closing,
}

/// Output of a session for the log pane and status line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Log(String),
    Status(String),
    State(SessionState),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    NotConnected,
    Failed(String),
}

/// Where and how to connect
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectParams {
    pub url: String,
    pub headers: HeaderSet,
    pub verify_tls: bool,
}

struct ReceiveLoop {
    cancel_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

pub struct WsSession {
    connector: Arc<dyn WsConnector>,
    state: Arc<watch::Sender<SessionState>>,
    events: mpsc::UnboundedSender<SessionEvent>,
    connection: Option<Arc<dyn WsConnection>>,
    receiver: Option<ReceiveLoop>,
    ping_interval: Duration,
}

impl WsSession {
    pub fn new(connector: Arc<dyn WsConnector>, events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        WsSession {
            connector,
            state: Arc::new(state),
            events,
            connection: None,
            receiver: None,
            ping_interval: WS_PING_INTERVAL,
        }
    }

    pub fn with_ping_interval(mut self, period: Duration) -> Self {
        self.ping_interval = period;
        self
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some() && self.state() == SessionState::Open
    }

    pub fn receive_loop_active(&self) -> bool {
        self.receiver
            .as_ref()
            .map_or(false, |r| !r.handle.is_finished())
    }

    /// Open a connection, replacing any previous one.
    pub async fn connect(&mut self, params: &ConnectParams) -> Result<()> {
        if self.state() == SessionState::Connecting {
            tracing::debug!("Connect ignored, already connecting");
            return Ok(());
        }
        if let Err(e) = validate_ws_url(&params.url) {
            self.status(e.to_string());
            return Err(e.into());
        }

        self.disconnect().await;
        transition(&self.state, &self.events, SessionState::Connecting);
        self.status(format!("Connecting to {} ...", params.url));
        tracing::info!(url = %params.url, verify_tls = params.verify_tls, "Connecting WebSocket");

        match self
            .connector
            .connect(&params.url, &params.headers, params.verify_tls)
            .await
        {
            Ok(connection) => {
                let connection: Arc<dyn WsConnection> = Arc::from(connection);
                transition(&self.state, &self.events, SessionState::Open);
                self.log(format!("Connected to {}", params.url));
                self.receiver = Some(spawn_receive_loop(
                    connection.clone(),
                    self.state.clone(),
                    self.events.clone(),
                    self.ping_interval,
                ));
                self.connection = Some(connection);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(url = %params.url, error = %e, "WebSocket connect failed");
                transition(&self.state, &self.events, SessionState::Idle);
                self.log(format!("Connect failed: {}", e));
                self.status(format!("Connect failed: {}", e));
                Err(e.into())
            }
        }
    }

    /// Send a text frame, connecting first when needed.
    pub async fn send(&mut self, params: &ConnectParams, message: &str) -> SendOutcome {
        if !self.is_connected() && self.connect(params).await.is_err() {
            return SendOutcome::NotConnected;
        }
        let Some(connection) = self.connection.clone() else {
            return SendOutcome::NotConnected;
        };

        match connection.send(message).await {
            Ok(()) => {
                let trimmed = message.trim();
                let shown = if trimmed.is_empty() { "<empty>" } else { trimmed };
                self.log(format!("Sent: {}", shown));
                self.status("Message sent.");
                SendOutcome::Sent
            }
            Err(e) => {
                tracing::warn!(error = %e, "WebSocket send failed");
                self.log(format!("Send failed: {}", e));
                self.disconnect().await;
                self.status("Send failed.");
                SendOutcome::Failed(e.to_string())
            }
        }
    }

    /// Stop the receive loop and close the connection. Safe to call repeatedly.
    pub async fn disconnect(&mut self) {
        if self.state() == SessionState::Open {
            transition(&self.state, &self.events, SessionState::Closing);
        }
        if let Some(receiver) = self.receiver.take() {
            let _ = receiver.cancel_tx.send(());
            if let Err(e) = receiver.handle.await {
                tracing::debug!(error = %e, "Receive loop ended abnormally");
            }
        }
        if let Some(connection) = self.connection.take() {
            match connection.close().await {
                Ok(()) => self.log("Disconnected.".to_string()),
                Err(e) => tracing::debug!(error = %e, "Close failed"),
            }
        }
        transition(&self.state, &self.events, SessionState::Idle);
    }

    fn log(&self, line: String) {
        let _ = self.events.send(SessionEvent::Log(line));
    }

    fn status(&self, text: impl Into<String>) {
        let _ = self.events.send(SessionEvent::Status(text.into()));
    }
}

impl Drop for WsSession {
    fn drop(&mut self) {
        if let Some(receiver) = self.receiver.take() {
            let _ = receiver.cancel_tx.send(());
            receiver.handle.abort();
        }
    }
}

fn transition(
    state: &watch::Sender<SessionState>,
    events: &mpsc::UnboundedSender<SessionEvent>,
    next: SessionState,
) {
    let previous = state.send_replace(next);
    if previous != next {
        let _ = events.send(SessionEvent::State(next));
    }
}

fn is_open(state: &watch::Sender<SessionState>) -> bool {
    *state.borrow() == SessionState::Open
}

fn spawn_receive_loop(
    connection: Arc<dyn WsConnection>,
    state: Arc<watch::Sender<SessionState>>,
    events: mpsc::UnboundedSender<SessionEvent>,
    ping_interval: Duration,
) -> ReceiveLoop {
    let (cancel_tx, mut cancel_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + ping_interval, ping_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while is_open(&state) {
            tokio::select! {
                biased;

                _ = &mut cancel_rx => break,

                _ = ticker.tick() => {
                    if let Err(e) = connection.ping().await {
                        tracing::warn!(error = %e, "WebSocket ping failed");
                        let _ = events.send(SessionEvent::Log(format!("Ping failed: {}", e)));
                        transition(&state, &events, SessionState::Idle);
                        break;
                    }
                }

                msg = connection.recv() => match msg {
                    Ok(Some(text)) => {
                        let _ = events.send(SessionEvent::Log(format!("Received: {}", text)));
                    }
                    Ok(None) => {
                        let _ = events.send(SessionEvent::Log("Connection closed by server.".to_string()));
                        transition(&state, &events, SessionState::Idle);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "WebSocket receive failed");
                        let _ = events.send(SessionEvent::Log(format!("Receive failed: {}", e)));
                        transition(&state, &events, SessionState::Idle);
                        break;
                    }
                },
            }
        }
    });
    ReceiveLoop { cancel_tx, handle }
}

/// Accept only ws/wss URLs with a host.
pub fn validate_ws_url(raw: &str) -> std::result::Result<url::Url, ValidationError> {
    let parsed = match url::Url::parse(raw.trim()) {
        Ok(parsed) => parsed,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            return Err(ValidationError::UnsupportedScheme("missing".to_string()))
        }
        Err(url::ParseError::EmptyHost) => return Err(ValidationError::MissingHost),
        Err(e) => return Err(ValidationError::InvalidUrl(e.to_string())),
    };
    if !matches!(parsed.scheme(), "ws" | "wss") {
        return Err(ValidationError::UnsupportedScheme(parsed.scheme().to_string()));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::MissingHost);
    }
    Ok(parsed)
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connector backed by tokio-tungstenite.
#[derive(Clone, Copy, Debug, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl WsConnector for TungsteniteConnector {
    async fn connect(
        &self,
        url: &str,
        headers: &HeaderSet,
        verify_tls: bool,
    ) -> std::result::Result<Box<dyn WsConnection>, TransportError> {
        let mut request = url.into_client_request()?;
        for (name, value) in headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::Request(format!("Invalid header {}: {}", name, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::Request(format!("Invalid header {}: {}", name, e)))?;
            request.headers_mut().insert(header_name, header_value);
        }

        let connector = if verify_tls {
            None
        } else {
            Some(Connector::Rustls(insecure_tls_config()))
        };
        let (stream, _response) = tokio::time::timeout(
            REQUEST_TIMEOUT,
            connect_async_tls_with_config(request, None, false, connector),
        )
        .await
        .map_err(|_| TransportError::Timeout)??;

        let (write, read) = stream.split();
        Ok(Box::new(TungsteniteConnection {
            write: Mutex::new(write),
            read: Mutex::new(read),
        }))
    }
}

struct TungsteniteConnection {
    write: Mutex<SplitSink<WsStream, Message>>,
    read: Mutex<SplitStream<WsStream>>,
}

#[async_trait]
impl WsConnection for TungsteniteConnection {
    async fn send(&self, text: &str) -> std::result::Result<(), TransportError> {
        self.write
            .lock()
            .await
            .send(Message::Text(text.to_string()))
            .await?;
        Ok(())
    }

    async fn recv(&self) -> std::result::Result<Option<String>, TransportError> {
        let mut read = self.read.lock().await;
        loop {
            match read.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Binary(data))) => {
                    let hex = data
                        .iter()
                        .map(|b| format!("{:02x}", b))
                        .collect::<Vec<_>>()
                        .join(" ");
                    return Ok(Some(format!("[Binary: {} bytes]\n{}", data.len(), hex)));
                }
                // Pongs are queued by tungstenite and flushed on the next read.
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Ok(Message::Close(frame))) => {
                    if let Some(frame) = frame {
                        tracing::debug!(code = %frame.code, reason = %frame.reason, "WebSocket closed by peer");
                    }
                    return Ok(None);
                }
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(None),
            }
        }
    }

    async fn ping(&self) -> std::result::Result<(), TransportError> {
        self.write
            .lock()
            .await
            .send(Message::Ping(Vec::new()))
            .await?;
        Ok(())
    }

    async fn close(&self) -> std::result::Result<(), TransportError> {
        match self.write.lock().await.close().await {
            Ok(()) => Ok(()),
            Err(e) => match TransportError::from(e) {
                TransportError::Closed => Ok(()),
                other => Err(other),
            },
        }
    }
}

/// Verifier that accepts any server certificate.
#[derive(Debug)]
struct AcceptAnyCert;

impl rustls::client::danger::ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::RSA_PKCS1_SHA384,
            rustls::SignatureScheme::RSA_PKCS1_SHA512,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP384_SHA384,
            rustls::SignatureScheme::ECDSA_NISTP521_SHA512,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA512,
            rustls::SignatureScheme::ED25519,
        ]
    }
}

fn insecure_tls_config() -> Arc<rustls::ClientConfig> {
    let config = rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCert))
        .with_no_client_auth();
    Arc::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    type Inbound = std::result::Result<Option<String>, TransportError>;

    #[derive(Default)]
    struct Shared {
        sent: std::sync::Mutex<Vec<String>>,
        closed: AtomicUsize,
        pings: AtomicUsize,
        fail_send: AtomicBool,
        fail_ping: AtomicBool,
    }

    struct StubConnection {
        inbound: Mutex<mpsc::UnboundedReceiver<Inbound>>,
        shared: Arc<Shared>,
    }

    #[async_trait]
    impl WsConnection for StubConnection {
        async fn send(&self, text: &str) -> std::result::Result<(), TransportError> {
            if self.shared.fail_send.load(Ordering::SeqCst) {
                return Err(TransportError::Closed);
            }
            self.shared.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn recv(&self) -> Inbound {
            match self.inbound.lock().await.recv().await {
                Some(item) => item,
                None => std::future::pending().await,
            }
        }

        async fn ping(&self) -> std::result::Result<(), TransportError> {
            if self.shared.fail_ping.load(Ordering::SeqCst) {
                return Err(TransportError::Closed);
            }
            self.shared.pings.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn close(&self) -> std::result::Result<(), TransportError> {
            self.shared.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct StubConnector {
        urls: std::sync::Mutex<Vec<String>>,
        feeds: std::sync::Mutex<Vec<mpsc::UnboundedSender<Inbound>>>,
        shared: Arc<Shared>,
        refuse: bool,
    }

    impl StubConnector {
        fn calls(&self) -> usize {
            self.urls.lock().unwrap().len()
        }

        fn push(&self, item: Inbound) {
            let feeds = self.feeds.lock().unwrap();
            feeds.last().unwrap().send(item).unwrap();
        }
    }

    #[async_trait]
    impl WsConnector for StubConnector {
        async fn connect(
            &self,
            url: &str,
            _headers: &HeaderSet,
            _verify_tls: bool,
        ) -> std::result::Result<Box<dyn WsConnection>, TransportError> {
            self.urls.lock().unwrap().push(url.to_string());
            if self.refuse {
                return Err(TransportError::Connect("refused".into()));
            }
            let (tx, rx) = mpsc::unbounded_channel();
            self.feeds.lock().unwrap().push(tx);
            Ok(Box::new(StubConnection {
                inbound: Mutex::new(rx),
                shared: self.shared.clone(),
            }))
        }
    }

    fn params(url: &str) -> ConnectParams {
        ConnectParams {
            url: url.to_string(),
            headers: HeaderSet::new(),
            verify_tls: true,
        }
    }

    fn session(connector: &Arc<StubConnector>) -> (WsSession, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (WsSession::new(connector.clone(), tx), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    async fn wait_for_log(rx: &mut mpsc::UnboundedReceiver<SessionEvent>, needle: &str) -> String {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if let Some(SessionEvent::Log(line)) = rx.recv().await {
                    if line.contains(needle) {
                        return line;
                    }
                }
            }
        })
        .await
        .expect("log line not received")
    }

    async fn wait_until_idle(session: &WsSession) {
        let mut state = session.subscribe();
        tokio::time::timeout(Duration::from_secs(2), state.wait_for(|s| *s == SessionState::Idle))
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_scheme_never_connects() {
        let connector = Arc::new(StubConnector::default());
        let (mut session, mut rx) = session(&connector);

        assert!(session.connect(&params("invalid://example")).await.is_err());
        assert_eq!(connector.calls(), 0);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.receive_loop_active());
        let events = drain(&mut rx);
        assert!(events.iter().any(
            |e| matches!(e, SessionEvent::Status(s) if s.contains("Unsupported URL scheme"))
        ));
    }

    #[tokio::test]
    async fn test_missing_scheme_and_host() {
        let connector = Arc::new(StubConnector::default());
        let (mut session, mut rx) = session(&connector);

        assert!(session.connect(&params("echo.example")).await.is_err());
        assert!(session.connect(&params("ws://")).await.is_err());
        assert_eq!(connector.calls(), 0);
        let statuses: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::Status(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(
            statuses,
            vec!["Unsupported URL scheme: missing", "Missing host in URL."]
        );
    }

    #[tokio::test]
    async fn test_connect_starts_one_receive_loop() {
        let connector = Arc::new(StubConnector::default());
        let (mut session, mut rx) = session(&connector);

        session.connect(&params("ws://localhost:9000")).await.unwrap();
        assert_eq!(session.state(), SessionState::Open);
        assert!(session.is_connected());
        assert!(session.receive_loop_active());
        wait_for_log(&mut rx, "Connected to ws://localhost:9000").await;

        connector.push(Ok(Some("hello".into())));
        assert_eq!(wait_for_log(&mut rx, "Received").await, "Received: hello");

        session.disconnect().await;
        assert!(!session.receive_loop_active());
        assert!(!session.is_connected());
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(connector.shared.closed.load(Ordering::SeqCst), 1);
        wait_for_log(&mut rx, "Disconnected.").await;

        session.disconnect().await;
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(connector.shared.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reconnect_replaces_previous_connection() {
        let connector = Arc::new(StubConnector::default());
        let (mut session, _rx) = session(&connector);

        session.connect(&params("ws://a.test")).await.unwrap();
        session.connect(&params("ws://b.test")).await.unwrap();
        assert_eq!(connector.calls(), 2);
        assert_eq!(connector.shared.closed.load(Ordering::SeqCst), 1);
        assert!(session.receive_loop_active());
        assert_eq!(session.state(), SessionState::Open);
    }

    #[tokio::test]
    async fn test_connect_failure_returns_to_idle() {
        let connector = Arc::new(StubConnector {
            refuse: true,
            ..StubConnector::default()
        });
        let (mut session, mut rx) = session(&connector);

        let err = session.connect(&params("wss://down.test")).await.unwrap_err();
        assert!(err.to_string().contains("refused"));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.receive_loop_active());
        wait_for_log(&mut rx, "Connect failed").await;
    }

    #[tokio::test]
    async fn test_send_connects_implicitly() {
        let connector = Arc::new(StubConnector::default());
        let (mut session, mut rx) = session(&connector);

        let outcome = session.send(&params("ws://echo.test"), "ping").await;
        assert_eq!(outcome, SendOutcome::Sent);
        assert_eq!(connector.calls(), 1);
        assert_eq!(*connector.shared.sent.lock().unwrap(), vec!["ping".to_string()]);
        wait_for_log(&mut rx, "Sent: ping").await;

        let outcome = session.send(&params("ws://echo.test"), "").await;
        assert_eq!(outcome, SendOutcome::Sent);
        assert_eq!(connector.calls(), 1);
        wait_for_log(&mut rx, "Sent: <empty>").await;
    }

    #[tokio::test]
    async fn test_sent_log_is_trimmed_but_frame_is_verbatim() {
        let connector = Arc::new(StubConnector::default());
        let (mut session, mut rx) = session(&connector);

        session.send(&params("ws://echo.test"), "  hi there \n").await;
        assert_eq!(wait_for_log(&mut rx, "Sent:").await, "Sent: hi there");

        session.send(&params("ws://echo.test"), "   ").await;
        assert_eq!(wait_for_log(&mut rx, "Sent:").await, "Sent: <empty>");

        assert_eq!(
            *connector.shared.sent.lock().unwrap(),
            vec!["  hi there \n".to_string(), "   ".to_string()]
        );
    }

    #[tokio::test]
    async fn test_open_connection_is_pinged_periodically() {
        let connector = Arc::new(StubConnector::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session =
            WsSession::new(connector.clone(), tx).with_ping_interval(Duration::from_millis(20));
        session.connect(&params("ws://echo.test")).await.unwrap();
        assert_eq!(connector.shared.pings.load(Ordering::SeqCst), 0);

        tokio::time::timeout(Duration::from_secs(2), async {
            while connector.shared.pings.load(Ordering::SeqCst) < 2 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("no keepalive pings sent");

        session.disconnect().await;
        let after = connector.shared.pings.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(connector.shared.pings.load(Ordering::SeqCst), after);
    }

    #[tokio::test]
    async fn test_ping_failure_flips_to_idle() {
        let connector = Arc::new(StubConnector::default());
        connector.shared.fail_ping.store(true, Ordering::SeqCst);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session =
            WsSession::new(connector.clone(), tx).with_ping_interval(Duration::from_millis(20));
        session.connect(&params("ws://echo.test")).await.unwrap();

        wait_for_log(&mut rx, "Ping failed").await;
        wait_until_idle(&session).await;
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_send_without_connection_reports_not_connected() {
        let connector = Arc::new(StubConnector {
            refuse: true,
            ..StubConnector::default()
        });
        let (mut session, _rx) = session(&connector);

        let outcome = session.send(&params("ws://down.test"), "hi").await;
        assert_eq!(outcome, SendOutcome::NotConnected);
        assert!(connector.shared.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_tears_down() {
        let connector = Arc::new(StubConnector::default());
        let (mut session, mut rx) = session(&connector);
        session.connect(&params("ws://echo.test")).await.unwrap();
        connector.shared.fail_send.store(true, Ordering::SeqCst);

        let outcome = session.send(&params("ws://echo.test"), "hi").await;
        assert!(matches!(outcome, SendOutcome::Failed(_)));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.receive_loop_active());
        wait_for_log(&mut rx, "Send failed").await;
    }

    #[tokio::test]
    async fn test_receive_error_flips_to_idle() {
        let connector = Arc::new(StubConnector::default());
        let (mut session, mut rx) = session(&connector);
        session.connect(&params("ws://echo.test")).await.unwrap();

        connector.push(Err(TransportError::Closed));
        wait_for_log(&mut rx, "Receive failed").await;
        wait_until_idle(&session).await;
        assert!(!session.is_connected());

        // The next send reconnects.
        assert_eq!(session.send(&params("ws://echo.test"), "again").await, SendOutcome::Sent);
        assert_eq!(connector.calls(), 2);
    }

    #[tokio::test]
    async fn test_peer_close_ends_loop() {
        let connector = Arc::new(StubConnector::default());
        let (mut session, mut rx) = session(&connector);
        session.connect(&params("ws://echo.test")).await.unwrap();

        connector.push(Ok(None));
        wait_for_log(&mut rx, "closed by server").await;
        wait_until_idle(&session).await;
    }

    #[test]
    fn test_validate_ws_url() {
        assert!(validate_ws_url("wss://echo.websocket.events").is_ok());
        assert_eq!(
            validate_ws_url("https://x.test").unwrap_err(),
            ValidationError::UnsupportedScheme("https".into())
        );
    }

    #[test]
    fn test_insecure_config_builds() {
        let config = insecure_tls_config();
        assert!(config.alpn_protocols.is_empty());
    }
}
