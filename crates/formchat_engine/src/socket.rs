//! Live chat connection: state machine, transport seams and the socket task.
use std::sync::Arc;

use async_trait::async_trait;
use engine_logging::{engine_debug, engine_info, engine_trace, engine_warn};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::frame::{decode_inbound, encode_send_message};
use crate::{EngineEvent, EventSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    ConnectRequested,
    Opened,
    Failed,
    /// The server ended the stream.
    StreamEnded,
    CloseRequested,
}

/// Allowed transitions; `None` means the event does not apply in that state.
pub fn transition(state: ConnectionState, event: ConnectionEvent) -> Option<ConnectionState> {
    use ConnectionEvent as E;
    use ConnectionState as S;
    match (state, event) {
        (S::Disconnected | S::Closed, E::ConnectRequested) => Some(S::Connecting),
        (S::Connecting, E::Opened) => Some(S::Open),
        (S::Connecting | S::Open, E::Failed) => Some(S::Closed),
        (S::Open, E::StreamEnded) => Some(S::Closed),
        (S::Connecting | S::Open | S::Closed, E::CloseRequested) => Some(S::Disconnected),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SocketError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("send failed: {0}")]
    Send(String),
    #[error("receive failed: {0}")]
    Receive(String),
}

#[async_trait]
pub trait FrameSink: Send {
    async fn send_text(&mut self, text: String) -> Result<(), SocketError>;
    async fn close(&mut self) -> Result<(), SocketError>;
}

#[async_trait]
pub trait FrameSource: Send {
    /// Next text frame; `None` once the stream has ended.
    async fn next_text(&mut self) -> Option<Result<String, SocketError>>;
}

/// Both halves of an open connection.
pub struct Duplex {
    pub sink: Box<dyn FrameSink>,
    pub source: Box<dyn FrameSource>,
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Duplex, SocketError>;
}

/// WebSocket transport over tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<Duplex, SocketError> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|err| SocketError::Connect(err.to_string()))?;
        let (sink, source) = stream.split();
        Ok(Duplex {
            sink: Box::new(WsSink(sink)),
            source: Box::new(WsSource(source)),
        })
    }
}

struct WsSink(SplitSink<WsStream, WsMessage>);

#[async_trait]
impl FrameSink for WsSink {
    async fn send_text(&mut self, text: String) -> Result<(), SocketError> {
        self.0
            .send(WsMessage::text(text))
            .await
            .map_err(|err| SocketError::Send(err.to_string()))
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.0
            .close()
            .await
            .map_err(|err| SocketError::Send(err.to_string()))
    }
}

struct WsSource(SplitStream<WsStream>);

#[async_trait]
impl FrameSource for WsSource {
    async fn next_text(&mut self) -> Option<Result<String, SocketError>> {
        while let Some(message) = self.0.next().await {
            match message {
                Ok(WsMessage::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(WsMessage::Close(_)) => return None,
                Ok(other) => engine_trace!("ignoring non-text frame ({} bytes)", other.len()),
                Err(err) => return Some(Err(SocketError::Receive(err.to_string()))),
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// Not open; the message stays local only.
    Dropped,
    /// The transport failed and the connection was closed.
    Failed,
}

/// Owns at most one live connection and reports its lifecycle as [`EngineEvent`]s.
pub struct ConnectionManager {
    url: String,
    connector: Arc<dyn Connector>,
    events: Arc<dyn EventSink>,
    state: ConnectionState,
    sink: Option<Box<dyn FrameSink>>,
    source: Option<Box<dyn FrameSource>>,
}

impl ConnectionManager {
    pub fn new(url: impl Into<String>, connector: Arc<dyn Connector>, events: Arc<dyn EventSink>) -> Self {
        Self {
            url: url.into(),
            connector,
            events,
            state: ConnectionState::Disconnected,
            sink: None,
            source: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Opens the connection unless one is already open or opening.
    pub async fn connect(&mut self) {
        if !self.apply(ConnectionEvent::ConnectRequested) {
            return;
        }
        match self.connector.connect(&self.url).await {
            Ok(duplex) => {
                self.sink = Some(duplex.sink);
                self.source = Some(duplex.source);
                engine_info!("connected to {}", self.url);
                self.apply(ConnectionEvent::Opened);
            }
            Err(err) => self.fail(err),
        }
    }

    pub async fn send(&mut self, text: &str) -> SendOutcome {
        if self.state != ConnectionState::Open {
            engine_debug!("dropping outbound message while {:?}", self.state);
            return SendOutcome::Dropped;
        }
        let Some(sink) = self.sink.as_mut() else {
            return SendOutcome::Dropped;
        };
        match sink.send_text(encode_send_message(text)).await {
            Ok(()) => SendOutcome::Sent,
            Err(err) => {
                self.fail(err);
                SendOutcome::Failed
            }
        }
    }

    pub async fn close(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            if let Err(err) = sink.close().await {
                engine_debug!("close handshake failed: {}", err);
            }
        }
        self.source = None;
        self.apply(ConnectionEvent::CloseRequested);
    }

    /// Waits for the next inbound frame. Pends forever while there is no connection.
    pub async fn next_inbound(&mut self) -> Option<Result<String, SocketError>> {
        match self.source.as_mut() {
            Some(source) => source.next_text().await,
            None => std::future::pending().await,
        }
    }

    pub fn handle_inbound(&mut self, inbound: Option<Result<String, SocketError>>) {
        match inbound {
            Some(Ok(raw)) => {
                if let Some(text) = decode_inbound(&raw) {
                    self.events.emit(EngineEvent::RemoteMessage(text));
                }
            }
            Some(Err(err)) => self.fail(err),
            None => {
                engine_info!("server closed the connection");
                self.teardown();
                self.apply(ConnectionEvent::StreamEnded);
            }
        }
    }

    fn fail(&mut self, err: SocketError) {
        engine_warn!("connection error: {}", err);
        self.teardown();
        self.apply(ConnectionEvent::Failed);
        self.events.emit(EngineEvent::ConnectionFailed {
            reason: err.to_string(),
        });
    }

    fn teardown(&mut self) {
        self.sink = None;
        self.source = None;
    }

    fn apply(&mut self, event: ConnectionEvent) -> bool {
        let Some(next) = transition(self.state, event) else {
            engine_debug!("ignoring {:?} while {:?}", event, self.state);
            return false;
        };
        if next != self.state {
            self.state = next;
            self.events.emit(EngineEvent::ConnectionChanged(next));
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketCommand {
    Connect,
    Send(String),
    Close,
}

/// Runs commands serially against the manager while forwarding inbound frames.
pub async fn run_connection(
    mut manager: ConnectionManager,
    mut commands: UnboundedReceiver<SocketCommand>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            command = commands.recv() => match command {
                Some(SocketCommand::Connect) => manager.connect().await,
                Some(SocketCommand::Send(text)) => {
                    manager.send(&text).await;
                }
                Some(SocketCommand::Close) => manager.close().await,
                None => break,
            },
            inbound = manager.next_inbound() => manager.handle_inbound(inbound),
        }
    }
    manager.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionEvent as E;
    use ConnectionState as S;

    #[test]
    fn transition_table() {
        assert_eq!(transition(S::Disconnected, E::ConnectRequested), Some(S::Connecting));
        assert_eq!(transition(S::Closed, E::ConnectRequested), Some(S::Connecting));
        assert_eq!(transition(S::Open, E::ConnectRequested), None);
        assert_eq!(transition(S::Connecting, E::ConnectRequested), None);
        assert_eq!(transition(S::Connecting, E::Opened), Some(S::Open));
        assert_eq!(transition(S::Connecting, E::Failed), Some(S::Closed));
        assert_eq!(transition(S::Open, E::StreamEnded), Some(S::Closed));
        assert_eq!(transition(S::Open, E::CloseRequested), Some(S::Disconnected));
        assert_eq!(transition(S::Disconnected, E::CloseRequested), None);
    }
}
