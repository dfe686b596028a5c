//! Live connection transport.
//!
//! # Responsibilities
//! - Define the seam between a results channel and the socket underneath
//! - Open WebSocket connections with a handshake deadline
//! - Surface inbound text frames; hide ping/pong and framing details
//!
//! # Design Decisions
//! - Channels are generic over [`Connector`] so the state machine runs
//!   unchanged against scripted connections in tests
//! - A clean close from the peer is `None`, a broken socket is an error;
//!   the channel treats both as "connection ended"

use std::future::Future;
use std::time::Duration;

use futures_util::StreamExt;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

/// Deadline for sending our close frame during teardown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Errors raised by a live transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Handshake failed (DNS, TCP, TLS or HTTP upgrade).
    #[error("connect failed: {0}")]
    Connect(String),

    /// Handshake did not finish in time.
    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    /// Established connection broke.
    #[error("transport error: {0}")]
    Protocol(String),
}

/// Opens live connections.
pub trait Connector: Send + Sync + 'static {
    type Connection: Connection;

    /// Establish a connection to `url`.
    fn connect(
        &self,
        url: &Url,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// An established live connection.
pub trait Connection: Send + 'static {
    /// Next inbound text frame, or `None` once the peer has closed.
    fn next_text(&mut self) -> impl Future<Output = Option<Result<String, TransportError>>> + Send;

    /// Close our side of the connection.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// WebSocket connector backed by `tokio-tungstenite`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    connect_timeout: Duration,
}

impl WsConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl Connector for WsConnector {
    type Connection = WsConnection;

    fn connect(
        &self,
        url: &Url,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send {
        let url = url.to_string();
        let deadline = self.connect_timeout;

        async move {
            match tokio::time::timeout(deadline, connect_async(url.as_str())).await {
                Ok(Ok((stream, response))) => {
                    tracing::debug!(url = %url, status = %response.status(), "WebSocket handshake complete");
                    Ok(WsConnection { stream })
                }
                Ok(Err(e)) => Err(TransportError::Connect(e.to_string())),
                Err(_) => Err(TransportError::Timeout(deadline)),
            }
        }
    }
}

/// A WebSocket connection delivering text frames.
pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Connection for WsConnection {
    fn next_text(&mut self) -> impl Future<Output = Option<Result<String, TransportError>>> + Send {
        async move {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Text(text))) => return Some(Ok(text.as_str().to_owned())),
                    Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                        Ok(text) => return Some(Ok(text)),
                        Err(_) => {
                            tracing::debug!(len = data.len(), "Ignoring non UTF-8 binary frame");
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        tracing::debug!(frame = ?frame, "Peer closed WebSocket");
                        return None;
                    }
                    // ping/pong are answered by tungstenite itself
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Some(Err(TransportError::Protocol(e.to_string()))),
                    None => return None,
                }
            }
        }
    }

    fn close(&mut self) -> impl Future<Output = ()> + Send {
        async move {
            match tokio::time::timeout(CLOSE_TIMEOUT, self.stream.close(None)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::debug!(error = %e, "Error while closing WebSocket"),
                Err(_) => tracing::debug!("Timed out sending close frame"),
            }
        }
    }
}
