//! Websocket transport abstraction.
//!
//! The session loop is written against the small traits in this module so
//! that tests can drive it with scripted in-memory connections. Production
//! code uses [`WsConnector`], which dials the gateway over
//! `tokio-tungstenite`.

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use swell_proto::close;

use crate::error::TransportError;

/// A message surfaced by the transport read half.
///
/// Close notifications are delivered as data rather than errors: a close
/// frame carries a code the session must classify, while a genuine
/// transport failure carries no verdict at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawMessage {
    /// A text payload.
    Text(String),
    /// The peer closed the connection.
    Closed {
        /// Close status code.
        code: u16,
        /// Human-readable close reason.
        reason: String,
    },
}

/// Dials the gateway and produces fresh connections.
#[allow(async_fn_in_trait)]
pub trait Connector: Send + Sync + 'static {
    /// Connection type produced on success.
    type Conn: Connection;

    /// Establish a new connection.
    fn connect(
        &self,
    ) -> impl std::future::Future<Output = Result<Self::Conn, TransportError>> + Send;
}

/// An established connection that can be split into halves.
pub trait Connection: Send + 'static {
    /// Write half.
    type Tx: ConnectionTx;
    /// Read half.
    type Rx: ConnectionRx;

    /// Split into independent write and read halves.
    fn split(self) -> (Self::Tx, Self::Rx);
}

/// Write half of a connection.
#[allow(async_fn_in_trait)]
pub trait ConnectionTx: Send + 'static {
    /// Send a text payload.
    fn send(
        &mut self,
        text: String,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}

/// Read half of a connection.
#[allow(async_fn_in_trait)]
pub trait ConnectionRx: Send + 'static {
    /// Receive the next message.
    fn recv(
        &mut self,
    ) -> impl std::future::Future<Output = Result<RawMessage, TransportError>> + Send;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connector backed by `tokio-tungstenite`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    /// Create a connector for the given websocket URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Connector for WsConnector {
    type Conn = WsConnection;

    async fn connect(&self) -> Result<WsConnection, TransportError> {
        let (stream, _response) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        Ok(WsConnection { stream })
    }
}

/// A live websocket connection.
pub struct WsConnection {
    stream: WsStream,
}

impl Connection for WsConnection {
    type Tx = WsTx;
    type Rx = WsRx;

    fn split(self) -> (WsTx, WsRx) {
        let (sink, stream) = self.stream.split();
        (WsTx { sink }, WsRx { stream })
    }
}

/// Write half of a websocket connection.
pub struct WsTx {
    sink: SplitSink<WsStream, Message>,
}

impl ConnectionTx for WsTx {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.sink
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::Stream(e.to_string()))
    }
}

/// Read half of a websocket connection.
pub struct WsRx {
    stream: SplitStream<WsStream>,
}

impl ConnectionRx for WsRx {
    async fn recv(&mut self) -> Result<RawMessage, TransportError> {
        loop {
            match self.stream.next().await {
                None => return Err(TransportError::AbruptEnd),
                Some(Err(e)) => return Err(TransportError::Stream(e.to_string())),
                Some(Ok(Message::Text(text))) => return Ok(RawMessage::Text(text)),
                Some(Ok(Message::Close(frame))) => return Ok(close_to_raw(frame)),
                // Ignore other message types (Ping, Pong, Binary)
                Some(Ok(_)) => {}
            }
        }
    }
}

/// Convert a websocket close frame into a [`RawMessage`].
///
/// A close without a status code is reported as 1005 per the websocket
/// protocol, so the session classifies it like any other code.
fn close_to_raw(frame: Option<CloseFrame<'_>>) -> RawMessage {
    match frame {
        Some(frame) => RawMessage::Closed {
            code: u16::from(frame.code),
            reason: frame.reason.into_owned(),
        },
        None => RawMessage::Closed {
            code: close::NO_STATUS,
            reason: String::new(),
        },
    }
}
