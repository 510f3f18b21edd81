//! Clipboard source use case
//!
//! Polls a [`ClipboardBackend`] for text changes and performs guarded writes.
//! Remote-origin writes arm the change detector first so the poll that sees
//! them does not report the value as a local edit.

use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::clipboard::{preview, ChangeDetector, ClipboardValue, Observation};

use super::ports::{ClipboardBackend, ClipboardError};

/// Default bound on a single backend call
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Upper bound on any backend call
pub const MAX_BACKEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Who initiated a clipboard write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOrigin {
    Local,
    /// Value received from the relay; its echo must not be re-sent
    Remote,
}

struct MonitorHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Local clipboard access with change detection
pub struct ClipboardSource<B: ClipboardBackend> {
    backend: B,
    detector: StdMutex<ChangeDetector>,
    poll_interval: Duration,
    backend_timeout: Duration,
    monitor: Mutex<Option<MonitorHandle>>,
}

impl<B: ClipboardBackend> ClipboardSource<B> {
    /// Create a source polling every `poll_interval`.
    /// The echo marker lives for one poll interval after a write settles.
    pub fn new(backend: B, poll_interval: Duration) -> Self {
        Self {
            backend,
            detector: StdMutex::new(ChangeDetector::new(poll_interval)),
            poll_interval,
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
            monitor: Mutex::new(None),
        }
    }

    /// Override the per-call backend timeout (capped at 5s)
    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout.min(MAX_BACKEND_TIMEOUT);
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn detector(&self) -> std::sync::MutexGuard<'_, ChangeDetector> {
        self.detector.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn timed<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, ClipboardError>>,
    ) -> Result<T, ClipboardError> {
        match tokio::time::timeout(self.backend_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ClipboardError::TimedOut {
                operation,
                millis: self.backend_timeout.as_millis() as u64,
            }),
        }
    }

    /// Current clipboard text; empty when the backend fails
    pub async fn read(&self) -> ClipboardValue {
        let content = match self.timed("read", self.backend.get()).await {
            Ok(content) => content,
            Err(e) => {
                debug!(backend = self.backend.name(), "Clipboard read failed: {}", e);
                String::new()
            }
        };
        let observation = self.detector().observations();
        ClipboardValue::new(content, observation)
    }

    /// Write text to the clipboard.
    ///
    /// For [`WriteOrigin::Remote`] the echo marker is armed before the backend
    /// call and settled after it succeeds. A timed-out write may still land,
    /// so its marker is settled at the timeout; any other failure drops it.
    pub async fn write(&self, content: &str, origin: WriteOrigin) -> Result<(), ClipboardError> {
        if origin == WriteOrigin::Remote {
            self.detector().arm_echo(content);
        }

        match self.timed("write", self.backend.set(content)).await {
            Ok(()) => {
                if origin == WriteOrigin::Remote {
                    self.detector().settle_echo(Instant::now().into_std());
                }
                debug!(?origin, "Clipboard written: {}", preview(content));
                Ok(())
            }
            Err(e) => {
                if origin == WriteOrigin::Remote {
                    let mut detector = self.detector();
                    match e {
                        ClipboardError::TimedOut { .. } => {
                            detector.settle_echo(Instant::now().into_std())
                        }
                        _ => detector.disarm_echo(),
                    }
                }
                Err(e)
            }
        }
    }

    /// Read once and report a genuine local change, if any.
    /// Read failures count as no change.
    pub async fn poll_once(&self) -> Option<ClipboardValue> {
        let content = match self.timed("read", self.backend.get()).await {
            Ok(content) => content,
            Err(e) => {
                debug!(backend = self.backend.name(), "Clipboard poll failed: {}", e);
                return None;
            }
        };

        let observation = self.detector().observe(&content, Instant::now().into_std());
        match observation {
            Observation::Unchanged => None,
            Observation::Echo => {
                debug!("Ignoring echo of remote update: {}", preview(&content));
                None
            }
            Observation::Changed(value) => {
                debug!("Local clipboard changed: {}", value.preview());
                Some(value)
            }
        }
    }

    /// Take the current clipboard as the baseline so it is not reported
    async fn prime(&self) {
        match self.timed("read", self.backend.get()).await {
            Ok(content) => self.detector().reset_baseline(content),
            Err(e) => debug!("Could not read initial clipboard: {}", e),
        }
    }

    pub async fn is_monitoring(&self) -> bool {
        self.monitor.lock().await.is_some()
    }

    /// Stop the polling task and wait for it to exit
    pub async fn stop_monitoring(&self) {
        let handle = self.monitor.lock().await.take();
        if let Some(handle) = handle {
            handle.cancel.cancel();
            if let Err(e) = handle.task.await {
                warn!("Clipboard monitor task ended abnormally: {}", e);
            }
            info!("Clipboard monitoring stopped");
        }
    }
}

impl<B: ClipboardBackend + 'static> ClipboardSource<B> {
    /// Spawn the polling task, sending each local change to `sink`.
    /// Calling this while already monitoring does nothing.
    pub async fn start_monitoring(self: &Arc<Self>, sink: mpsc::UnboundedSender<ClipboardValue>) {
        let mut monitor = self.monitor.lock().await;
        if monitor.is_some() {
            debug!("Clipboard monitoring already running");
            return;
        }

        self.prime().await;

        let cancel = CancellationToken::new();
        let source = Arc::clone(self);
        let token = cancel.clone();
        let period = self.poll_interval;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Some(value) = source.poll_once().await {
                            if sink.send(value).is_err() {
                                debug!("Clipboard change receiver dropped");
                                break;
                            }
                        }
                    }
                }
            }
        });

        info!(
            backend = self.backend.name(),
            "Clipboard monitoring started ({}ms interval)",
            period.as_millis()
        );
        *monitor = Some(MonitorHandle { cancel, task });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{MockClipboard, WriteLanding};

    fn source(clipboard: &MockClipboard) -> ClipboardSource<MockClipboard> {
        ClipboardSource::new(clipboard.clone(), Duration::from_millis(500))
    }

    #[tokio::test]
    async fn read_returns_content() {
        let clipboard = MockClipboard::with_content("hello");
        let source = source(&clipboard);
        assert_eq!(source.read().await.content(), "hello");
    }

    #[tokio::test]
    async fn read_failure_returns_empty() {
        let clipboard = MockClipboard::with_content("hello");
        clipboard.fail_reads(true);
        let source = source(&clipboard);
        assert!(source.read().await.is_empty());
    }

    #[tokio::test]
    async fn poll_reports_local_change_once() {
        let clipboard = MockClipboard::with_content("a");
        let source = source(&clipboard);
        source.prime().await;

        assert!(source.poll_once().await.is_none());
        clipboard.set_external("b");
        assert_eq!(source.poll_once().await.unwrap().content(), "b");
        assert!(source.poll_once().await.is_none());
    }

    #[tokio::test]
    async fn read_failure_is_not_a_change() {
        let clipboard = MockClipboard::with_content("a");
        let source = source(&clipboard);
        source.prime().await;

        clipboard.fail_reads(true);
        assert!(source.poll_once().await.is_none());

        clipboard.fail_reads(false);
        assert!(source.poll_once().await.is_none());
    }

    #[tokio::test]
    async fn remote_write_is_not_reported() {
        let clipboard = MockClipboard::with_content("a");
        let source = source(&clipboard);
        source.prime().await;

        source.write("remote", WriteOrigin::Remote).await.unwrap();
        assert_eq!(clipboard.content(), "remote");
        assert!(source.poll_once().await.is_none());
    }

    #[tokio::test]
    async fn local_edit_after_remote_write_is_reported() {
        let clipboard = MockClipboard::with_content("a");
        let source = source(&clipboard);
        source.prime().await;

        source.write("remote", WriteOrigin::Remote).await.unwrap();
        clipboard.set_external("mine");
        assert_eq!(source.poll_once().await.unwrap().content(), "mine");
    }

    #[tokio::test]
    async fn local_write_is_reported() {
        let clipboard = MockClipboard::with_content("a");
        let source = source(&clipboard);
        source.prime().await;

        source.write("typed", WriteOrigin::Local).await.unwrap();
        assert_eq!(source.poll_once().await.unwrap().content(), "typed");
    }

    #[tokio::test]
    async fn failed_remote_write_disarms_marker() {
        let clipboard = MockClipboard::with_content("a");
        let source = source(&clipboard);
        source.prime().await;

        clipboard.fail_writes(true);
        assert!(source.write("remote", WriteOrigin::Remote).await.is_err());
        assert!(source.detector().pending_echo().is_none());

        // The same text copied locally is a real change
        clipboard.set_external("remote");
        assert!(source.poll_once().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_remote_write_still_absorbs_late_landing() {
        let clipboard = MockClipboard::with_content("a");
        clipboard.set_write_delay(Duration::from_millis(1200));
        clipboard.set_write_landing(WriteLanding::Detached);
        let source = source(&clipboard).with_backend_timeout(Duration::from_secs(1));
        source.prime().await;

        let err = source.write("from phone", WriteOrigin::Remote).await.unwrap_err();
        assert!(matches!(err, ClipboardError::TimedOut { operation: "write", .. }));
        assert!(source.detector().pending_echo().is_some_and(|p| p.is_settled()));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(clipboard.content(), "from phone");
        assert!(source.poll_once().await.is_none());
        assert!(source.poll_once().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn remote_write_during_in_flight_poll_is_not_reported() {
        let clipboard = MockClipboard::with_content("a");
        clipboard.set_read_delay(Duration::from_millis(100));
        let source = source(&clipboard);
        source.prime().await;

        let (polled, written) = tokio::join!(source.poll_once(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            source.write("remote", WriteOrigin::Remote).await
        });
        written.unwrap();
        assert!(polled.is_none());
        assert!(source.poll_once().await.is_none());
        assert_eq!(source.detector().last_content(), "remote");
    }

    #[tokio::test(start_paused = true)]
    async fn poll_seeing_remote_write_before_it_settles_is_not_reported() {
        let clipboard = MockClipboard::with_content("a");
        clipboard.set_write_delay(Duration::from_millis(100));
        clipboard.set_write_landing(WriteLanding::Immediately);
        let source = source(&clipboard);
        source.prime().await;

        let (written, polled) = tokio::join!(
            source.write("remote", WriteOrigin::Remote),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                source.poll_once().await
            }
        );
        written.unwrap();
        assert!(polled.is_none());
        assert!(source.poll_once().await.is_none());

        // The marker was consumed, so a later local copy is reported
        clipboard.set_external("mine");
        assert_eq!(source.poll_once().await.unwrap().content(), "mine");
    }

    #[tokio::test(start_paused = true)]
    async fn echo_marker_expires_after_one_interval() {
        let clipboard = MockClipboard::with_content("same");
        let source = source(&clipboard);
        source.prime().await;

        // Writing identical content produces no observable change
        source.write("same", WriteOrigin::Remote).await.unwrap();
        assert!(source.poll_once().await.is_none());
        assert!(source.detector().pending_echo().is_some());

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(source.poll_once().await.is_none());
        assert!(source.detector().pending_echo().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out() {
        let clipboard = MockClipboard::with_content("a");
        clipboard.set_delay(Duration::from_secs(10));
        let source = source(&clipboard).with_backend_timeout(Duration::from_secs(1));

        let err = source.write("b", WriteOrigin::Local).await.unwrap_err();
        assert!(matches!(err, ClipboardError::TimedOut { operation: "write", .. }));
        assert!(source.poll_once().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn monitoring_sends_changes_until_stopped() {
        let clipboard = MockClipboard::with_content("before start");
        let source = Arc::new(source(&clipboard));
        let (tx, mut rx) = mpsc::unbounded_channel();

        source.start_monitoring(tx.clone()).await;
        source.start_monitoring(tx).await;
        assert!(source.is_monitoring().await);

        clipboard.set_external("copied");
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(rx.recv().await.unwrap().content(), "copied");

        source.stop_monitoring().await;
        assert!(!source.is_monitoring().await);

        clipboard.set_external("after stop");
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
    }
}
