//! WebSocket relay transport using tokio-tungstenite
//!
//! `wss://` endpoints use rustls with the bundled webpki roots. Control
//! frames are handled by tungstenite and never surface as relay frames.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;
use url::Url;

use crate::application::ports::{
    ConnectError, FrameSink, FrameStream, RelayConnection, RelayTransport, TransportError,
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens relay connections over WebSocket
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

fn connect_error(e: tungstenite::Error) -> ConnectError {
    match e {
        tungstenite::Error::Http(response) => {
            ConnectError::HandshakeRejected(format!("HTTP {}", response.status()))
        }
        tungstenite::Error::Url(e) => ConnectError::InvalidEndpoint(e.to_string()),
        tungstenite::Error::Tls(e) => ConnectError::HandshakeRejected(e.to_string()),
        tungstenite::Error::Io(e) => ConnectError::NetworkUnreachable(e.to_string()),
        other => ConnectError::NetworkUnreachable(other.to_string()),
    }
}

#[async_trait]
impl RelayTransport for WebSocketTransport {
    async fn open(&self, url: &Url) -> Result<RelayConnection, ConnectError> {
        let (socket, response) = connect_async(url.as_str()).await.map_err(connect_error)?;
        debug!(status = %response.status(), "WebSocket handshake complete");

        let (sink, stream) = socket.split();
        Ok(RelayConnection::new(
            WebSocketSink { sink, closed: false },
            WebSocketFrames { stream },
        ))
    }
}

struct WebSocketSink {
    sink: SplitSink<Socket, Message>,
    closed: bool,
}

#[async_trait]
impl FrameSink for WebSocketSink {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.sink.send(Message::Text(text)).await.map_err(|e| match e {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                TransportError::Closed
            }
            other => TransportError::SendFailed(other.to_string()),
        })
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.sink.close().await {
            Ok(())
            | Err(tungstenite::Error::ConnectionClosed)
            | Err(tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(TransportError::SendFailed(e.to_string())),
        }
    }
}

struct WebSocketFrames {
    stream: SplitStream<Socket>,
}

#[async_trait]
impl FrameStream for WebSocketFrames {
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(tungstenite::Error::ConnectionClosed) => return None,
                Err(e) => return Some(Err(TransportError::ReceiveFailed(e.to_string()))),
            };

            match message {
                Message::Text(text) => return Some(Ok(text)),
                // Invalid UTF-8 is passed on lossily so decoding reports it
                Message::Binary(bytes) => {
                    return Some(Ok(String::from_utf8_lossy(&bytes).into_owned()))
                }
                Message::Close(frame) => {
                    debug!(?frame, "Relay closed the connection");
                    return None;
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }
}
