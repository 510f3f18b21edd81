//! Domain layer - Core business logic
//!
//! Contains value objects, entities, the relay wire protocol and domain errors.
//! This layer has no dependencies on external systems.

pub mod clipboard;
pub mod config;
pub mod error;
pub mod history;
pub mod sync;

// Re-export common types
pub use clipboard::{ChangeDetector, ClipboardValue, Observation, PendingEcho};
pub use config::{AppConfig, NotificationPrefs};
pub use error::*;
pub use history::{ClipboardHistory, HistoryItem};
pub use sync::{ConnectionState, Interval, LinkStatus};
