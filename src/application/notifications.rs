//! Desktop notification policy
//!
//! Turns [`SyncEvent`]s into notifications, filtered by [`NotificationPrefs`].

use tracing::debug;

use crate::domain::clipboard::preview;
use crate::domain::config::NotificationPrefs;

use super::coordinator::SyncEvent;
use super::ports::{NotificationIcon, Notifier};

/// Title used for error notifications
pub const ERROR_TITLE: &str = "Corridor Error";

/// Decides which sync events reach the desktop
pub struct NotificationPolicy<N: Notifier> {
    notifier: N,
    prefs: NotificationPrefs,
}

impl<N: Notifier> NotificationPolicy<N> {
    pub fn new(notifier: N, prefs: NotificationPrefs) -> Self {
        Self { notifier, prefs }
    }

    pub fn prefs(&self) -> NotificationPrefs {
        self.prefs
    }

    /// Title, body and icon for an event, if it should be shown
    pub fn render(&self, event: &SyncEvent) -> Option<(String, String, NotificationIcon)> {
        let prefs = self.prefs;
        let rendered = match event {
            SyncEvent::Connected if prefs.remote_update => (
                "Connected".to_string(),
                "Clipboard sync is now active".to_string(),
                NotificationIcon::Success,
            ),
            SyncEvent::Disconnected { .. } if prefs.errors => (
                "Disconnected".to_string(),
                "Clipboard sync is offline".to_string(),
                NotificationIcon::Warning,
            ),
            SyncEvent::LocalChangeForwarded { content } if prefs.local_copy => (
                "Clipboard Copied".to_string(),
                format!("Syncing: {}", preview(content)),
                NotificationIcon::Sync,
            ),
            SyncEvent::RemoteChangeApplied { content } if prefs.remote_update => (
                "Clipboard Updated".to_string(),
                format!("From remote: {}", preview(content)),
                NotificationIcon::Info,
            ),
            SyncEvent::Error(message) if prefs.errors => (
                ERROR_TITLE.to_string(),
                message.clone(),
                NotificationIcon::Error,
            ),
            _ => return None,
        };
        Some(rendered)
    }

    /// Show the notification for `event`. Failures are logged and dropped.
    pub async fn dispatch(&self, event: &SyncEvent) {
        if let Some((title, message, icon)) = self.render(event) {
            if let Err(e) = self.notifier.notify(&title, &message, icon).await {
                debug!("Notification failed: {}", e);
            }
        }
    }
}
