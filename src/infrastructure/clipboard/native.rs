//! Native clipboard adapter using arboard
//!
//! Works on Windows, macOS, and Linux (X11/Wayland). The `arboard::Clipboard`
//! handle lives on one dedicated thread for the life of the adapter. On Linux
//! the process only serves the selection while that handle exists, so it is
//! never recreated per call.

use std::sync::mpsc as std_mpsc;
use std::thread;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::debug;

use crate::application::ports::{ClipboardBackend, ClipboardError};

enum Request {
    Get(oneshot::Sender<Result<String, ClipboardError>>),
    Set(String, oneshot::Sender<Result<(), ClipboardError>>),
}

/// Clipboard backed by the platform's native API
pub struct ArboardClipboard {
    requests: std_mpsc::Sender<Request>,
}

impl ArboardClipboard {
    /// Open the native clipboard and verify it can be read.
    ///
    /// Fails when no clipboard is reachable, e.g. without a display server.
    pub async fn probe() -> Result<Self, ClipboardError> {
        let (requests, inbox) = std_mpsc::channel::<Request>();
        let (ready_tx, ready_rx) = oneshot::channel();

        thread::Builder::new()
            .name("corridor-clipboard".to_string())
            .spawn(move || serve(inbox, ready_tx))
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;

        ready_rx
            .await
            .map_err(|_| ClipboardError::Unavailable("clipboard thread exited".to_string()))??;

        let clipboard = Self { requests };
        clipboard.get().await?;
        Ok(clipboard)
    }

    fn submit(&self, request: Request) -> Result<(), ClipboardError> {
        self.requests
            .send(request)
            .map_err(|_| ClipboardError::Unavailable("clipboard thread exited".to_string()))
    }
}

fn serve(
    inbox: std_mpsc::Receiver<Request>,
    ready: oneshot::Sender<Result<(), ClipboardError>>,
) {
    let mut clipboard = match arboard::Clipboard::new() {
        Ok(clipboard) => {
            let _ = ready.send(Ok(()));
            clipboard
        }
        Err(e) => {
            let _ = ready.send(Err(ClipboardError::Unavailable(e.to_string())));
            return;
        }
    };

    // Runs until the adapter (and with it the sender) is dropped
    while let Ok(request) = inbox.recv() {
        match request {
            Request::Get(reply) => {
                let result = match clipboard.get_text() {
                    Ok(text) => Ok(text),
                    // Empty clipboard or non-text content
                    Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
                    Err(e) => Err(ClipboardError::ReadFailed(e.to_string())),
                };
                let _ = reply.send(result);
            }
            Request::Set(text, reply) => {
                let result = clipboard
                    .set_text(text)
                    .map_err(|e| ClipboardError::WriteFailed(e.to_string()));
                let _ = reply.send(result);
            }
        }
    }
    debug!("Native clipboard thread exiting");
}

#[async_trait]
impl ClipboardBackend for ArboardClipboard {
    fn name(&self) -> &'static str {
        "arboard"
    }

    async fn get(&self) -> Result<String, ClipboardError> {
        let (tx, rx) = oneshot::channel();
        self.submit(Request::Get(tx))?;
        rx.await
            .map_err(|_| ClipboardError::ReadFailed("clipboard thread dropped request".to_string()))?
    }

    async fn set(&self, text: &str) -> Result<(), ClipboardError> {
        let (tx, rx) = oneshot::channel();
        self.submit(Request::Set(text.to_owned(), tx))?;
        rx.await
            .map_err(|_| ClipboardError::WriteFailed("clipboard thread dropped request".to_string()))?
    }
}
