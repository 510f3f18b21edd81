//! Hand-written port doubles shared by the application tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

use super::ports::{
    ClipboardBackend, ClipboardError, ConnectError, FrameSink, FrameStream, NotificationError,
    NotificationIcon, Notifier, RelayConnection, RelayTransport, TransportError,
};

/// In-memory clipboard with switchable failures
#[derive(Clone, Default)]
pub struct MockClipboard {
    content: Arc<Mutex<String>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    read_delay: Arc<Mutex<Duration>>,
    write_delay: Arc<Mutex<Duration>>,
    writes: Arc<AtomicUsize>,
    landing: Arc<Mutex<WriteLanding>>,
}

/// When a delayed write becomes visible on the clipboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteLanding {
    /// After the delay, as part of the call
    #[default]
    AfterDelay,
    /// Before the delay; only the acknowledgement is slow
    Immediately,
    /// After the delay on a task that outlives a cancelled call
    Detached,
}

impl MockClipboard {
    pub fn with_content(content: &str) -> Self {
        let clipboard = Self::default();
        clipboard.set_external(content);
        clipboard
    }

    /// Simulate the user copying something
    pub fn set_external(&self, content: &str) {
        *self.content.lock().unwrap() = content.to_string();
    }

    pub fn content(&self) -> String {
        self.content.lock().unwrap().clone()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delay both reads and writes
    pub fn set_delay(&self, delay: Duration) {
        self.set_read_delay(delay);
        self.set_write_delay(delay);
    }

    pub fn set_read_delay(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = delay;
    }

    pub fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = delay;
    }

    pub fn set_write_landing(&self, landing: WriteLanding) {
        *self.landing.lock().unwrap() = landing;
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    async fn pause(delay: &Mutex<Duration>) {
        let delay = *delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn land(&self, text: &str) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.set_external(text);
    }
}

#[async_trait]
impl ClipboardBackend for MockClipboard {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn get(&self) -> Result<String, ClipboardError> {
        Self::pause(&self.read_delay).await;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ClipboardError::ReadFailed("mock read failure".to_string()));
        }
        Ok(self.content())
    }

    async fn set(&self, text: &str) -> Result<(), ClipboardError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Self::pause(&self.write_delay).await;
            return Err(ClipboardError::WriteFailed("mock write failure".to_string()));
        }

        let landing = *self.landing.lock().unwrap();
        match landing {
            WriteLanding::AfterDelay => {
                Self::pause(&self.write_delay).await;
                self.land(text);
            }
            WriteLanding::Immediately => {
                self.land(text);
                Self::pause(&self.write_delay).await;
            }
            WriteLanding::Detached => {
                let clipboard = self.clone();
                let text = text.to_string();
                tokio::spawn(async move {
                    Self::pause(&clipboard.write_delay).await;
                    clipboard.land(&text);
                })
                .await
                .map_err(|e| ClipboardError::WriteFailed(e.to_string()))?;
            }
        }
        Ok(())
    }
}

/// Server side of one connection opened through [`ChannelTransport`]
pub struct PeerEnd {
    pub url: Url,
    from_client: mpsc::UnboundedReceiver<String>,
    to_client: Option<mpsc::UnboundedSender<Result<String, TransportError>>>,
    client_closed: Arc<AtomicBool>,
}

impl PeerEnd {
    /// Deliver a text frame to the client
    pub fn send(&self, text: &str) {
        if let Some(tx) = &self.to_client {
            let _ = tx.send(Ok(text.to_string()));
        }
    }

    /// Deliver a receive error to the client
    pub fn fail(&self, reason: &str) {
        if let Some(tx) = &self.to_client {
            let _ = tx.send(Err(TransportError::ReceiveFailed(reason.to_string())));
        }
    }

    /// Close from the server side
    pub fn hang_up(&mut self) {
        self.to_client = None;
    }

    /// Next frame written by the client
    pub async fn recv(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    /// Frames already written by the client
    pub fn drain(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.from_client.try_recv() {
            frames.push(frame);
        }
        frames
    }

    pub fn client_closed(&self) -> bool {
        self.client_closed.load(Ordering::SeqCst)
    }
}

struct ChannelSink {
    tx: Option<mpsc::UnboundedSender<String>>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        match &self.tx {
            Some(tx) => tx.send(text).map_err(|_| TransportError::Closed),
            None => Err(TransportError::Closed),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.tx = None;
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct ChannelStream {
    rx: mpsc::UnboundedReceiver<Result<String, TransportError>>,
}

#[async_trait]
impl FrameStream for ChannelStream {
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>> {
        self.rx.recv().await
    }
}

/// Relay transport backed by in-process channels
#[derive(Clone)]
pub struct ChannelTransport {
    accepted: mpsc::UnboundedSender<PeerEnd>,
    failures: Arc<Mutex<VecDeque<ConnectError>>>,
    opens: Arc<AtomicUsize>,
}

impl ChannelTransport {
    /// Create the transport and the receiver of accepted connections
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PeerEnd>) {
        let (accepted, rx) = mpsc::unbounded_channel();
        let transport = Self {
            accepted,
            failures: Arc::new(Mutex::new(VecDeque::new())),
            opens: Arc::new(AtomicUsize::new(0)),
        };
        (transport, rx)
    }

    /// Make the next `open` fail with `error`
    pub fn fail_next(&self, error: ConnectError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelayTransport for ChannelTransport {
    async fn open(&self, url: &Url) -> Result<RelayConnection, ConnectError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        let (client_tx, from_client) = mpsc::unbounded_channel();
        let (to_client, client_rx) = mpsc::unbounded_channel();
        let client_closed = Arc::new(AtomicBool::new(false));

        let peer = PeerEnd {
            url: url.clone(),
            from_client,
            to_client: Some(to_client),
            client_closed: Arc::clone(&client_closed),
        };
        self.accepted
            .send(peer)
            .map_err(|_| ConnectError::NetworkUnreachable("test server gone".to_string()))?;

        Ok(RelayConnection::new(
            ChannelSink {
                tx: Some(client_tx),
                closed: client_closed,
            },
            ChannelStream { rx: client_rx },
        ))
    }
}

/// Notifier that records every notification
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String, NotificationIcon)>>>,
}

impl RecordingNotifier {
    pub fn titles(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(title, _, _)| title.clone())
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, message, _)| message.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        title: &str,
        message: &str,
        icon: NotificationIcon,
    ) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string(), icon));
        Ok(())
    }
}
