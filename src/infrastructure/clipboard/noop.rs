//! Fallback clipboard used when no real backend is reachable

use async_trait::async_trait;

use crate::application::ports::{ClipboardBackend, ClipboardError};

/// Always reads empty content and refuses writes
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopClipboard;

#[async_trait]
impl ClipboardBackend for NoopClipboard {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn get(&self) -> Result<String, ClipboardError> {
        Ok(String::new())
    }

    async fn set(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable(
            "no clipboard backend available".to_string(),
        ))
    }
}
