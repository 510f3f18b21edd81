//! Clipboard port interface

use async_trait::async_trait;
use thiserror::Error;

/// Clipboard errors
#[derive(Debug, Clone, Error)]
pub enum ClipboardError {
    #[error("{0} not found")]
    ToolNotFound(String),

    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read clipboard: {0}")]
    ReadFailed(String),

    #[error("Failed to write clipboard: {0}")]
    WriteFailed(String),

    #[error("Clipboard {operation} timed out after {millis}ms")]
    TimedOut { operation: &'static str, millis: u64 },
}

/// Port for text clipboard access
#[async_trait]
pub trait ClipboardBackend: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &'static str;

    /// Read the current clipboard text.
    /// An empty clipboard is `Ok(String::new())`.
    async fn get(&self) -> Result<String, ClipboardError>;

    /// Replace the clipboard text.
    async fn set(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Blanket implementation for boxed clipboard backends
#[async_trait]
impl ClipboardBackend for Box<dyn ClipboardBackend> {
    fn name(&self) -> &'static str {
        self.as_ref().name()
    }

    async fn get(&self) -> Result<String, ClipboardError> {
        self.as_ref().get().await
    }

    async fn set(&self, text: &str) -> Result<(), ClipboardError> {
        self.as_ref().set(text).await
    }
}
