//! Relay transport port interface
//!
//! A transport opens one bidirectional text-frame connection to the relay.
//! Framing, TLS and handshake details stay inside the adapter.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::domain::sync::InvalidStateTransition;

/// Errors from establishing a relay connection
#[derive(Debug, Clone, Error)]
pub enum ConnectError {
    #[error("Relay unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("Relay rejected the handshake: {0}")]
    HandshakeRejected(String),

    #[error("Connection attempt timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Invalid relay endpoint: {0}")]
    InvalidEndpoint(String),

    #[error(transparent)]
    InvalidState(#[from] InvalidStateTransition),
}

/// Errors on an established connection
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Not connected to relay")]
    NotConnected,

    #[error("Failed to send frame: {0}")]
    SendFailed(String),

    #[error("Failed to receive frame: {0}")]
    ReceiveFailed(String),

    #[error("Send timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Connection closed")]
    Closed,
}

/// Outbound half of a relay connection
#[async_trait]
pub trait FrameSink: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Close the connection; closing twice is not an error.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Inbound half of a relay connection
#[async_trait]
pub trait FrameStream: Send {
    /// Next text frame, or `None` once the peer has closed.
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>>;
}

/// An open relay connection split into its two halves
pub struct RelayConnection {
    pub sink: Box<dyn FrameSink>,
    pub stream: Box<dyn FrameStream>,
}

impl RelayConnection {
    pub fn new(sink: impl FrameSink + 'static, stream: impl FrameStream + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            stream: Box::new(stream),
        }
    }
}

/// Port for opening relay connections
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Open a connection to `url`, which already carries the auth query.
    async fn open(&self, url: &Url) -> Result<RelayConnection, ConnectError>;
}

/// Blanket implementation for boxed transports
#[async_trait]
impl RelayTransport for Box<dyn RelayTransport> {
    async fn open(&self, url: &Url) -> Result<RelayConnection, ConnectError> {
        self.as_ref().open(url).await
    }
}
