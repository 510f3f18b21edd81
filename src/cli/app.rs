//! Main app runner for sync mode

use std::process::ExitCode;

use crate::application::ports::ConfigStore;
use crate::application::{NotificationPolicy, SessionConfig, SyncEvent, SyncSession};
use crate::domain::config::{AppConfig, NotificationPrefs};
use crate::domain::error::ConfigError;
use crate::infrastructure::{create_notifier, detect_backend, WebSocketTransport, XdgConfigStore};

use super::args::Cli;
use super::presenter::Presenter;
use super::signals::shutdown_token;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Exit code for a failed config operation
pub fn config_exit_code(error: &ConfigError) -> u8 {
    match error {
        ConfigError::ReadError(_) | ConfigError::WriteError(_) => EXIT_ERROR,
        _ => EXIT_USAGE_ERROR,
    }
}

/// Overrides from the command line. Clap has already folded
/// `CORRIDOR_TOKEN` and `CORRIDOR_ENDPOINT` into these.
pub fn cli_overrides(cli: &Cli) -> AppConfig {
    AppConfig {
        token: cli.token.clone().filter(|s| !s.is_empty()),
        endpoint: cli.endpoint.clone().filter(|s| !s.is_empty()),
        poll_interval: cli.poll_interval.clone(),
        ..Default::default()
    }
}

/// Merge: defaults < file < env < cli
pub async fn load_merged_config<S: ConfigStore>(
    store: &S,
    cli_config: AppConfig,
) -> Result<AppConfig, ConfigError> {
    let file_config = store.load().await?;
    Ok(AppConfig::defaults().merge(file_config).merge(cli_config))
}

/// Run the sync session until SIGINT/SIGTERM
pub async fn run_sync(cli: &Cli) -> ExitCode {
    let presenter = Presenter::new();

    let store = XdgConfigStore::new();
    let config = match load_merged_config(&store, cli_overrides(cli)).await {
        Ok(config) => config,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(config_exit_code(&e));
        }
    };

    let session_config = match SessionConfig::from_app_config(&config) {
        Ok(session_config) => session_config,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let shutdown = match shutdown_token() {
        Ok(token) => token,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let prefs = if cli.silent {
        NotificationPrefs::silent()
    } else {
        config.notification_prefs()
    };
    let notifications = NotificationPolicy::new(create_notifier(), prefs);

    let backend = detect_backend().await;
    if backend.name() == "none" {
        presenter.warn("No clipboard backend found; only remote history will be received");
    } else {
        presenter.info(&format!("Clipboard backend: {}", backend.name()));
    }
    presenter.info(&format!("Relay: {}", session_config.endpoint));

    let (session, mut events) = SyncSession::start(session_config, backend, WebSocketTransport::new());

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            event = events.recv() => {
                let Some(event) = event else { break };
                presenter.sync_event(&event);
                notifications.dispatch(&event).await;

                if event == SyncEvent::Connected {
                    if let Err(e) = session.request_history().await {
                        presenter.warn(&format!("Could not request history: {}", e));
                    }
                }
            }
        }
    }

    presenter.info("Stopping...");
    session.shutdown().await;
    presenter.success("Clipboard sync stopped");
    ExitCode::from(EXIT_SUCCESS)
}
