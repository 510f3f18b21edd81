//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::history::DEFAULT_HISTORY_SIZE;
use crate::domain::sync::Interval;

/// Default relay endpoint
pub const DEFAULT_ENDPOINT: &str = "wss://corridor-worker.corridor-sync.workers.dev/ws";

/// Desktop notification toggles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub local_copy: Option<bool>,
    pub remote_update: Option<bool>,
    pub errors: Option<bool>,
}

/// Resolved notification toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationPrefs {
    pub local_copy: bool,
    pub remote_update: bool,
    pub errors: bool,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            local_copy: false,
            remote_update: true,
            errors: true,
        }
    }
}

impl NotificationPrefs {
    /// All categories off
    pub const fn silent() -> Self {
        Self {
            local_copy: false,
            remote_update: false,
            errors: false,
        }
    }
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub token: Option<String>,
    pub endpoint: Option<String>,
    pub poll_interval: Option<String>,
    pub reconnect_delay: Option<String>,
    pub history_size: Option<usize>,
    pub notifications: Option<NotificationConfig>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        let prefs = NotificationPrefs::default();
        Self {
            token: None,
            endpoint: Some(DEFAULT_ENDPOINT.to_string()),
            poll_interval: Some(Interval::default_poll().to_string()),
            reconnect_delay: Some(Interval::default_reconnect().to_string()),
            history_size: Some(DEFAULT_HISTORY_SIZE),
            notifications: Some(NotificationConfig {
                local_copy: Some(prefs.local_copy),
                remote_update: Some(prefs.remote_update),
                errors: Some(prefs.errors),
            }),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            token: other.token.or(self.token),
            endpoint: other.endpoint.or(self.endpoint),
            poll_interval: other.poll_interval.or(self.poll_interval),
            reconnect_delay: other.reconnect_delay.or(self.reconnect_delay),
            history_size: other.history_size.or(self.history_size),
            notifications: Self::merge_notifications(self.notifications, other.notifications),
        }
    }

    fn merge_notifications(
        base: Option<NotificationConfig>,
        other: Option<NotificationConfig>,
    ) -> Option<NotificationConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(NotificationConfig {
                local_copy: o.local_copy.or(b.local_copy),
                remote_update: o.remote_update.or(b.remote_update),
                errors: o.errors.or(b.errors),
            }),
        }
    }

    /// Get poll interval, or default if not set/invalid
    pub fn poll_interval_or_default(&self) -> Interval {
        self.poll_interval
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Interval::default_poll)
    }

    /// Get reconnect delay, or default if not set/invalid
    pub fn reconnect_delay_or_default(&self) -> Interval {
        self.reconnect_delay
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Interval::default_reconnect)
    }

    /// Get history size, or 100 if not set
    pub fn history_size_or_default(&self) -> usize {
        self.history_size.unwrap_or(DEFAULT_HISTORY_SIZE)
    }

    /// Get endpoint, or the hosted relay if not set
    pub fn endpoint_or_default(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    /// Resolve notification toggles, falling back per category
    pub fn notification_prefs(&self) -> NotificationPrefs {
        let defaults = NotificationPrefs::default();
        let section = self.notifications.as_ref();
        NotificationPrefs {
            local_copy: section
                .and_then(|n| n.local_copy)
                .unwrap_or(defaults.local_copy),
            remote_update: section
                .and_then(|n| n.remote_update)
                .unwrap_or(defaults.remote_update),
            errors: section.and_then(|n| n.errors).unwrap_or(defaults.errors),
        }
    }
}
