//! Application configuration

mod app_config;

pub use app_config::{AppConfig, NotificationConfig, NotificationPrefs, DEFAULT_ENDPOINT};
