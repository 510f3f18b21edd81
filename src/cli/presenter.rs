//! CLI presenter for output formatting

use colored::*;

use crate::application::SyncEvent;
use crate::domain::clipboard::preview;
use crate::domain::history::HistoryItem;

/// Presenter for CLI output formatting
#[derive(Debug, Default)]
pub struct Presenter;

impl Presenter {
    pub fn new() -> Self {
        Self
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Status line for a sync event, if it deserves one
    pub fn sync_event(&self, event: &SyncEvent) {
        match event {
            SyncEvent::Connected => self.success("Connected to relay"),
            SyncEvent::Disconnected { reason } => {
                self.warn(&format!("Disconnected ({})", reason.as_str()))
            }
            SyncEvent::LocalChangeForwarded { content } => {
                eprintln!("{} {}", "↑".cyan(), preview(content))
            }
            SyncEvent::RemoteChangeApplied { content } => {
                eprintln!("{} {}", "↓".magenta(), preview(content))
            }
            SyncEvent::HistoryReceived(items) => {
                self.info(&format!("Relay history: {} item(s)", items.len()));
                if let Some(latest) = items.first() {
                    eprintln!("  {}", format_history_item(latest).dimmed());
                }
            }
            SyncEvent::Error(message) => self.error(message),
        }
    }
}

fn format_history_item(item: &HistoryItem) -> String {
    let when = chrono::DateTime::from_timestamp_millis(item.timestamp)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown time".to_string());
    format!("{}  {}", when, preview(&item.content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_item_shows_time_and_preview() {
        let item = HistoryItem::new("1", "x".repeat(60), 0);
        let line = format_history_item(&item);
        assert!(line.starts_with("1970-01-01 00:00:00"));
        assert!(line.ends_with("..."));
    }
}
