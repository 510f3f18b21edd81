//! Sync coordinator
//!
//! Joins the local clipboard and the relay link. Local changes are forwarded
//! while connected and dropped otherwise. Remote updates are written back with
//! [`WriteOrigin::Remote`] so their echo is never re-sent. After a lost
//! connection or a failed attempt the coordinator waits a fixed delay and
//! connects again until shutdown.

use std::pin::Pin;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, Instant, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::clipboard::ClipboardValue;
use crate::domain::history::{ClipboardHistory, HistoryItem, HistorySource};
use crate::domain::sync::RemoteClipboard;

use super::clipboard_source::{ClipboardSource, WriteOrigin};
use super::ports::{ClipboardBackend, RelayTransport};
use super::sync_link::{DisconnectReason, LinkEvent, SyncLink};

/// What the coordinator reports to the outside world
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Connected,
    Disconnected { reason: DisconnectReason },
    LocalChangeForwarded { content: String },
    RemoteChangeApplied { content: String },
    HistoryReceived(Vec<HistoryItem>),
    Error(String),
}

/// Where and how to connect
#[derive(Debug, Clone)]
pub struct RelayTarget {
    pub token: String,
    pub endpoint: Url,
    pub reconnect_delay: Duration,
}

/// Glue and policy between [`ClipboardSource`] and [`SyncLink`]
pub struct SyncCoordinator<B: ClipboardBackend, T: RelayTransport> {
    source: Arc<ClipboardSource<B>>,
    link: Arc<SyncLink<T>>,
    link_events: mpsc::UnboundedReceiver<LinkEvent>,
    target: RelayTarget,
    history: Arc<StdMutex<ClipboardHistory>>,
    events: mpsc::UnboundedSender<SyncEvent>,
    failed_attempts: u32,
}

impl<B, T> SyncCoordinator<B, T>
where
    B: ClipboardBackend + 'static,
    T: RelayTransport,
{
    pub fn new(
        source: Arc<ClipboardSource<B>>,
        link: Arc<SyncLink<T>>,
        link_events: mpsc::UnboundedReceiver<LinkEvent>,
        target: RelayTarget,
        history: Arc<StdMutex<ClipboardHistory>>,
    ) -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let coordinator = Self {
            source,
            link,
            link_events,
            target,
            history,
            events,
            failed_attempts: 0,
        };
        (coordinator, rx)
    }

    fn emit(&self, event: SyncEvent) {
        let _ = self.events.send(event);
    }

    fn record_history(&self, source: HistorySource, content: &str) {
        let timestamp = chrono::Utc::now().timestamp_millis();
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .record(source, content, timestamp);
    }

    /// Run until `shutdown` is cancelled, then tear down in order:
    /// polling first, then the link.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let (local_tx, mut local_rx) = mpsc::unbounded_channel();
        self.source.start_monitoring(local_tx).await;

        let mut retry = if self.try_connect().await {
            None
        } else {
            Some(self.retry_timer())
        };

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                Some(event) = self.link_events.recv() => {
                    if self.on_link_event(event).await {
                        retry = Some(self.retry_timer());
                    }
                }
                Some(value) = local_rx.recv() => self.on_local_change(value).await,
                _ = wait_retry(&mut retry) => {
                    retry = None;
                    if !self.try_connect().await {
                        retry = Some(self.retry_timer());
                    }
                }
            }
        }

        self.source.stop_monitoring().await;
        self.link.disconnect().await;
        info!("Sync session terminated");
    }

    fn retry_timer(&self) -> Pin<Box<Sleep>> {
        info!(
            "Reconnecting in {}s",
            self.target.reconnect_delay.as_secs_f32()
        );
        Box::pin(sleep(self.target.reconnect_delay))
    }

    /// One connection attempt; only the first failure in a row is reported
    async fn try_connect(&mut self) -> bool {
        match self
            .link
            .connect(&self.target.token, &self.target.endpoint)
            .await
        {
            Ok(()) => {
                self.failed_attempts = 0;
                true
            }
            Err(e) => {
                self.failed_attempts += 1;
                warn!(attempt = self.failed_attempts, "Connection attempt failed: {}", e);
                if self.failed_attempts == 1 {
                    self.emit(SyncEvent::Error(format!("Cannot reach relay: {}", e)));
                }
                false
            }
        }
    }

    async fn on_local_change(&self, value: ClipboardValue) {
        if value.is_empty() {
            debug!("Skipping empty clipboard content");
            return;
        }
        if !self.link.is_connected() {
            debug!("Offline, not forwarding local change: {}", value.preview());
            return;
        }

        match self.link.send_clipboard_update(value.content()).await {
            Ok(()) => {
                self.record_history(HistorySource::Local, value.content());
                self.emit(SyncEvent::LocalChangeForwarded {
                    content: value.into_content(),
                });
            }
            Err(e) => {
                self.emit(SyncEvent::Error(format!("Failed to send clipboard update: {}", e)));
            }
        }
    }

    /// Returns true when a reconnect should be scheduled
    async fn on_link_event(&mut self, event: LinkEvent) -> bool {
        match event {
            LinkEvent::Connected => {
                self.failed_attempts = 0;
                self.emit(SyncEvent::Connected);
                false
            }
            LinkEvent::Disconnected { reason } => {
                self.emit(SyncEvent::Disconnected { reason });
                reason != DisconnectReason::Requested
            }
            LinkEvent::RemoteUpdate(remote) => {
                self.apply_remote(remote).await;
                false
            }
            LinkEvent::History(items) => {
                self.history
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .replace(items.clone());
                self.emit(SyncEvent::HistoryReceived(items));
                false
            }
            LinkEvent::ServerError(message) => {
                self.emit(SyncEvent::Error(message));
                false
            }
            LinkEvent::ProtocolError(message) => {
                self.emit(SyncEvent::Error(format!("Malformed message from relay: {}", message)));
                false
            }
        }
    }

    async fn apply_remote(&self, remote: RemoteClipboard) {
        let started = Instant::now();
        match self.source.write(&remote.content, WriteOrigin::Remote).await {
            Ok(()) => {
                debug!("Applied remote update in {:?}", started.elapsed());
                self.record_history(HistorySource::Remote, &remote.content);
                self.emit(SyncEvent::RemoteChangeApplied {
                    content: remote.content,
                });
            }
            Err(e) => {
                warn!("Failed to apply remote clipboard: {}", e);
                self.emit(SyncEvent::Error(format!("Failed to apply remote clipboard: {}", e)));
            }
        }
    }
}

async fn wait_retry(retry: &mut Option<Pin<Box<Sleep>>>) {
    match retry {
        Some(timer) => timer.as_mut().await,
        None => std::future::pending().await,
    }
}
