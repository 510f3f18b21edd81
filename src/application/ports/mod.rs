//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod clipboard;
pub mod config;
pub mod notifier;
pub mod relay;

// Re-export common types
pub use clipboard::{ClipboardBackend, ClipboardError};
pub use config::ConfigStore;
pub use notifier::{NotificationError, NotificationIcon, Notifier};
pub use relay::{
    ConnectError, FrameSink, FrameStream, RelayConnection, RelayTransport, TransportError,
};
