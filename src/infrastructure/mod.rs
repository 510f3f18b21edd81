//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces: OS clipboards,
//! the WebSocket relay transport, desktop notifications and config files.

pub mod clipboard;
pub mod config;
pub mod notification;
pub mod relay;

// Re-export adapters
pub use clipboard::{detect_backend, MemoryClipboard, NoopClipboard};
pub use config::XdgConfigStore;
pub use notification::{create_notifier, DesktopNotifier};
pub use relay::WebSocketTransport;
