//! Application layer - Use cases and port interfaces
//!
//! Contains the clipboard source, the relay link, the coordinator joining
//! them, and the trait definitions for external system interactions.

pub mod clipboard_source;
pub mod coordinator;
pub mod notifications;
pub mod ports;
pub mod session;
pub mod sync_link;

#[cfg(test)]
mod test_support;

// Re-export use cases
pub use clipboard_source::{ClipboardSource, WriteOrigin};
pub use coordinator::{RelayTarget, SyncCoordinator, SyncEvent};
pub use notifications::NotificationPolicy;
pub use session::{parse_endpoint, SessionConfig, SyncSession};
pub use sync_link::{DisconnectReason, LinkConfig, LinkEvent, SyncLink};
