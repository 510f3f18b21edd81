//! Clipboard infrastructure module
//!
//! Provides the native arboard backend, command-line tool fallbacks, an
//! in-memory clipboard and a no-op fallback, plus the startup probe that
//! picks one of them.

mod command;
mod memory;
mod native;
mod noop;

pub use command::{ClipboardTool, CommandClipboard};
pub use memory::MemoryClipboard;
pub use native::ArboardClipboard;
pub use noop::NoopClipboard;

use std::future::Future;

use tracing::{debug, info, warn};

use crate::application::clipboard_source::MAX_BACKEND_TIMEOUT;
use crate::application::ports::{ClipboardBackend, ClipboardError};

/// A backend the probe may try
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    Native,
    Tool(ClipboardTool),
}

/// Candidates in preference order. wl-clipboard is only tried in a Wayland
/// session.
pub fn candidates(wayland_session: bool) -> Vec<Candidate> {
    let mut list = vec![Candidate::Native];
    if wayland_session {
        list.push(Candidate::Tool(ClipboardTool::WL_CLIPBOARD));
    }
    list.push(Candidate::Tool(ClipboardTool::XCLIP));
    list.push(Candidate::Tool(ClipboardTool::XSEL));
    list
}

fn is_wayland_session() -> bool {
    let display = std::env::var("WAYLAND_DISPLAY").ok();
    let session_type = std::env::var("XDG_SESSION_TYPE").ok();
    wayland_from_env(display.as_deref(), session_type.as_deref())
}

/// A Wayland session is signalled by a display socket or the session type
fn wayland_from_env(display: Option<&str>, session_type: Option<&str>) -> bool {
    display.is_some_and(|v| !v.is_empty())
        || session_type.is_some_and(|v| v.trim().eq_ignore_ascii_case("wayland"))
}

async fn probe(candidate: Candidate) -> Result<Box<dyn ClipboardBackend>, ClipboardError> {
    match candidate {
        Candidate::Native => Ok(Box::new(ArboardClipboard::probe().await?)),
        Candidate::Tool(tool) => Ok(Box::new(CommandClipboard::probe(tool).await?)),
    }
}

/// Pick the first working clipboard backend for this machine.
///
/// Never fails: when nothing answers, a [`NoopClipboard`] is returned and a
/// warning logged.
pub async fn detect_backend() -> Box<dyn ClipboardBackend> {
    first_available(candidates(is_wayland_session()), probe).await
}

async fn first_available<F, Fut>(candidates: Vec<Candidate>, probe: F) -> Box<dyn ClipboardBackend>
where
    F: Fn(Candidate) -> Fut,
    Fut: Future<Output = Result<Box<dyn ClipboardBackend>, ClipboardError>>,
{
    for candidate in candidates {
        match tokio::time::timeout(MAX_BACKEND_TIMEOUT, probe(candidate)).await {
            Ok(Ok(backend)) => {
                info!(backend = backend.name(), "Clipboard backend selected");
                return backend;
            }
            Ok(Err(e)) => debug!(?candidate, "Clipboard backend unavailable: {}", e),
            Err(_) => debug!(?candidate, "Clipboard backend probe timed out"),
        }
    }

    warn!("No clipboard backend available; local clipboard will not be synced");
    Box::new(NoopClipboard)
}
