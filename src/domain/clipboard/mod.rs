//! Clipboard value objects and change detection

pub mod detector;
pub mod value;

pub use detector::{ChangeDetector, Observation, PendingEcho};
pub use value::{preview, ClipboardValue, PREVIEW_CHARS};
