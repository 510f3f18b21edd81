//! Config command handler

use crate::application::parse_endpoint;
use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, NotificationConfig};
use crate::domain::error::ConfigError;
use crate::domain::sync::Interval;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let mut config = store.load().await?;
    apply_value(&mut config, key, value)?;
    store.save(&config).await?;

    let shown = if key == "token" {
        mask_token(value)
    } else {
        value.to_string()
    };
    presenter.success(&format!("{} = {}", key, shown));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let config = store.load().await?;
    presenter.output(display_value(&config, key).as_deref().unwrap_or(NOT_SET));
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;
    for key in VALID_CONFIG_KEYS {
        presenter.key_value(key, display_value(&config, key).as_deref().unwrap_or(NOT_SET));
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        })
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Validate `value` for `key` and store it in `config`
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "token" => {
            let token = value.trim();
            if token.is_empty() {
                return Err(invalid(key, "Token must not be empty"));
            }
            config.token = Some(token.to_string());
        }
        "endpoint" => {
            parse_endpoint(value)?;
            config.endpoint = Some(value.trim().to_string());
        }
        "poll_interval" | "reconnect_delay" => {
            let interval = value
                .parse::<Interval>()
                .map_err(|e| invalid(key, e.to_string()))?;
            let normalized = Some(interval.to_string());
            if key == "poll_interval" {
                config.poll_interval = normalized;
            } else {
                config.reconnect_delay = normalized;
            }
        }
        "history_size" => {
            let size = value
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| invalid(key, "Value must be a positive integer"))?;
            config.history_size = Some(size);
        }
        "notifications.local_copy" | "notifications.remote_update" | "notifications.errors" => {
            let enabled =
                parse_bool(value).map_err(|_| invalid(key, "Value must be 'true' or 'false'"))?;
            let notifications = config
                .notifications
                .get_or_insert_with(NotificationConfig::default);
            match key {
                "notifications.local_copy" => notifications.local_copy = Some(enabled),
                "notifications.remote_update" => notifications.remote_update = Some(enabled),
                _ => notifications.errors = Some(enabled),
            }
        }
        _ => return Err(invalid(key, "Unknown key")),
    }
    Ok(())
}

/// Printable value for `key`; the token is masked
fn display_value(config: &AppConfig, key: &str) -> Option<String> {
    let notifications = config.notifications.as_ref();
    match key {
        "token" => config.token.as_deref().map(mask_token),
        "endpoint" => config.endpoint.clone(),
        "poll_interval" => config.poll_interval.clone(),
        "reconnect_delay" => config.reconnect_delay.clone(),
        "history_size" => config.history_size.map(|n| n.to_string()),
        "notifications.local_copy" => notifications.and_then(|n| n.local_copy).map(|b| b.to_string()),
        "notifications.remote_update" => {
            notifications.and_then(|n| n.remote_update).map(|b| b.to_string())
        }
        "notifications.errors" => notifications.and_then(|n| n.errors).map(|b| b.to_string()),
        _ => None,
    }
}

fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(()),
    }
}

/// Show only the first and last four characters
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}
