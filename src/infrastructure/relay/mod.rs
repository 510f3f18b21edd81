//! Relay transport adapters

mod websocket;

pub use websocket::WebSocketTransport;
