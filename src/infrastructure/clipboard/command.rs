//! Clipboard adapters driving command-line tools
//!
//! Covers wl-clipboard (`wl-paste`/`wl-copy`), `xclip` and `xsel`.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::application::ports::{ClipboardBackend, ClipboardError};

/// Argument sets for one clipboard tool family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipboardTool {
    name: &'static str,
    read: (&'static str, &'static [&'static str]),
    write: (&'static str, &'static [&'static str]),
}

impl ClipboardTool {
    pub const WL_CLIPBOARD: Self = Self {
        name: "wl-clipboard",
        read: ("wl-paste", &["--no-newline", "--type", "text"]),
        write: ("wl-copy", &["--type", "text/plain"]),
    };

    pub const XCLIP: Self = Self {
        name: "xclip",
        read: ("xclip", &["-selection", "clipboard", "-o"]),
        write: ("xclip", &["-selection", "clipboard", "-i"]),
    };

    pub const XSEL: Self = Self {
        name: "xsel",
        read: ("xsel", &["--clipboard", "--output"]),
        write: ("xsel", &["--clipboard", "--input"]),
    };

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

/// Clipboard backed by an external tool
pub struct CommandClipboard {
    tool: ClipboardTool,
}

impl CommandClipboard {
    pub fn new(tool: ClipboardTool) -> Self {
        Self { tool }
    }

    /// Check that the tool is installed and can read the clipboard
    pub async fn probe(tool: ClipboardTool) -> Result<Self, ClipboardError> {
        let clipboard = Self::new(tool);
        clipboard.get().await?;
        Ok(clipboard)
    }

    fn spawn_error(&self, program: &str, e: std::io::Error) -> ClipboardError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ClipboardError::ToolNotFound(program.to_string())
        } else {
            ClipboardError::Unavailable(format!("{}: {}", program, e))
        }
    }
}

#[async_trait]
impl ClipboardBackend for CommandClipboard {
    fn name(&self) -> &'static str {
        self.tool.name
    }

    async fn get(&self) -> Result<String, ClipboardError> {
        let (program, args) = self.tool.read;
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(program, e))?;

        if !output.status.success() {
            // wl-paste exits non-zero when the clipboard is empty
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("No selection") || stderr.contains("Nothing is copied") {
                return Ok(String::new());
            }
            return Err(ClipboardError::ReadFailed(format!(
                "{} exited with status: {}",
                program, output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn set(&self, text: &str) -> Result<(), ClipboardError> {
        let (program, args) = self.tool.write;
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(program, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| ClipboardError::WriteFailed(e.to_string()))?;
            // Closing stdin lets the tool take ownership of the selection
        }

        let status = child
            .wait()
            .await
            .map_err(|e| ClipboardError::WriteFailed(e.to_string()))?;

        if !status.success() {
            return Err(ClipboardError::WriteFailed(format!(
                "{} exited with status: {}",
                program, status
            )));
        }

        Ok(())
    }
}
