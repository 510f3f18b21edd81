//! In-process clipboard
//!
//! Useful for headless runs and integration tests. Clones share one buffer.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::application::ports::{ClipboardBackend, ClipboardError};

#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    content: Arc<Mutex<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Arc::new(Mutex::new(content.into())),
        }
    }

    /// Current buffer contents
    pub fn content(&self) -> String {
        self.content.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Replace the buffer as if another program had copied `content`
    pub fn copy(&self, content: impl Into<String>) {
        *self.content.lock().unwrap_or_else(|e| e.into_inner()) = content.into();
    }
}

#[async_trait]
impl ClipboardBackend for MemoryClipboard {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self) -> Result<String, ClipboardError> {
        Ok(self.content())
    }

    async fn set(&self, text: &str) -> Result<(), ClipboardError> {
        self.copy(text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_the_buffer() {
        let clipboard = MemoryClipboard::with_content("a");
        let other = clipboard.clone();

        other.set("b").await.unwrap();
        assert_eq!(clipboard.get().await.unwrap(), "b");

        clipboard.copy("c");
        assert_eq!(other.content(), "c");
    }
}
