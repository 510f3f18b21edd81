//! Sync session aggregate
//!
//! Owns one [`ClipboardSource`] and one [`SyncLink`] for the life of the
//! process and runs the [`SyncCoordinator`] between them on its own task.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::history::{ClipboardHistory, HistoryItem, DEFAULT_HISTORY_SIZE};
use crate::domain::sync::{ConnectionState, Interval};

use super::clipboard_source::ClipboardSource;
use super::coordinator::{RelayTarget, SyncCoordinator, SyncEvent};
use super::ports::{ClipboardBackend, RelayTransport, TransportError};
use super::sync_link::{LinkConfig, SyncLink};

/// Validated settings for a [`SyncSession`]
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub token: String,
    pub endpoint: Url,
    pub poll_interval: Duration,
    pub reconnect_delay: Duration,
    pub history_size: usize,
    pub link: LinkConfig,
}

impl SessionConfig {
    /// Validate token and endpoint; other settings take their defaults
    pub fn new(token: &str, endpoint: &str) -> Result<Self, ConfigError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ConfigError::MissingToken);
        }

        Ok(Self {
            token: token.to_string(),
            endpoint: parse_endpoint(endpoint)?,
            poll_interval: Interval::default_poll().as_std(),
            reconnect_delay: Interval::default_reconnect().as_std(),
            history_size: DEFAULT_HISTORY_SIZE,
            link: LinkConfig::default(),
        })
    }

    /// Build from a merged [`AppConfig`]
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let token = config.token.as_deref().ok_or(ConfigError::MissingToken)?;
        let endpoint = config.endpoint.as_deref().ok_or(ConfigError::MissingEndpoint)?;

        let poll_interval = parse_interval("poll_interval", config.poll_interval.as_deref())?
            .unwrap_or_else(Interval::default_poll);
        let reconnect_delay = parse_interval("reconnect_delay", config.reconnect_delay.as_deref())?
            .unwrap_or_else(Interval::default_reconnect);

        Ok(Self::new(token, endpoint)?
            .with_poll_interval(poll_interval.as_std())
            .with_reconnect_delay(reconnect_delay.as_std())
            .with_history_size(config.history_size_or_default()))
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_history_size(mut self, size: usize) -> Self {
        self.history_size = size;
        self
    }

    pub fn with_link_config(mut self, link: LinkConfig) -> Self {
        self.link = link;
        self
    }
}

/// Parse and check a relay endpoint; only `ws` and `wss` are accepted
pub fn parse_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(ConfigError::MissingEndpoint);
    }

    let url = Url::parse(endpoint).map_err(|e| ConfigError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(ConfigError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: format!("unsupported scheme '{}', expected ws or wss", other),
        }),
    }
}

fn parse_interval(key: &str, value: Option<&str>) -> Result<Option<Interval>, ConfigError> {
    value
        .map(|v| {
            v.parse::<Interval>()
                .map_err(|e| ConfigError::ValidationError {
                    key: key.to_string(),
                    message: e.to_string(),
                })
        })
        .transpose()
}

/// A running sync session
pub struct SyncSession<B: ClipboardBackend, T: RelayTransport> {
    source: Arc<ClipboardSource<B>>,
    link: Arc<SyncLink<T>>,
    history: Arc<StdMutex<ClipboardHistory>>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl<B, T> SyncSession<B, T>
where
    B: ClipboardBackend + 'static,
    T: RelayTransport + 'static,
{
    /// Build the components and start syncing in the background.
    /// Returns the session and the stream of [`SyncEvent`]s.
    pub fn start(
        config: SessionConfig,
        backend: B,
        transport: T,
    ) -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let source = Arc::new(ClipboardSource::new(backend, config.poll_interval));
        let (link, link_events) = SyncLink::new(transport, config.link);
        let link = Arc::new(link);
        let history = Arc::new(StdMutex::new(ClipboardHistory::new(config.history_size)));

        let target = RelayTarget {
            token: config.token,
            endpoint: config.endpoint,
            reconnect_delay: config.reconnect_delay,
        };
        let (coordinator, events) = SyncCoordinator::new(
            Arc::clone(&source),
            Arc::clone(&link),
            link_events,
            target,
            Arc::clone(&history),
        );

        let shutdown = CancellationToken::new();
        let task = tokio::spawn(coordinator.run(shutdown.clone()));
        info!(backend = source.backend_name(), "Sync session started");

        let session = Self {
            source,
            link,
            history,
            shutdown,
            task,
        };
        (session, events)
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.link.state()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.link.subscribe_state()
    }

    /// History from newest to oldest
    pub fn history(&self) -> Vec<HistoryItem> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .to_vec()
    }

    pub fn backend_name(&self) -> &'static str {
        self.source.backend_name()
    }

    pub async fn request_history(&self) -> Result<(), TransportError> {
        self.link.request_history().await
    }

    /// Clear the relay's history and the local view of it
    pub async fn clear_history(&self) -> Result<(), TransportError> {
        self.link.clear_history().await?;
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        Ok(())
    }

    /// Stop polling, disconnect, and wait until both are done
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            warn!("Sync task ended abnormally: {}", e);
        }
    }
}
