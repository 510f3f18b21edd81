//! Relay link use case
//!
//! [`SyncLink`] owns one logical connection to the relay. It authenticates with
//! the sync token, keeps the connection alive with application-level pings,
//! watches for pongs and turns inbound frames into [`LinkEvent`]s.
//!
//! Reconnection is not attempted here. A lost connection is reported once as
//! [`LinkEvent::Disconnected`] and the owner decides when to call
//! [`SyncLink::connect`] again.
//!
//! Every established connection gets a new generation number. Background
//! tasks carry the generation they were spawned for, and anything they try to
//! report after the generation moved on is dropped.

use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::clipboard::preview;
use crate::domain::history::HistoryItem;
use crate::domain::sync::protocol::{self, ClientMessage, RemoteClipboard, ServerMessage};
use crate::domain::sync::{ConnectionState, LinkStatus};

use super::ports::{ConnectError, FrameSink, FrameStream, RelayTransport, TransportError};

/// Interval between keepalive pings
pub const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Silence after which the relay is considered gone
pub const PONG_TIMEOUT: Duration = Duration::from_secs(60);

/// How often the liveness monitor looks at the last pong
pub const LIVENESS_CHECK_INTERVAL: Duration = Duration::from_secs(10);

/// Bound on the handshake and on each send
pub const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Timing parameters for a [`SyncLink`]
#[derive(Debug, Clone, Copy)]
pub struct LinkConfig {
    pub ping_interval: Duration,
    pub pong_timeout: Duration,
    pub liveness_check_interval: Duration,
    pub io_timeout: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            ping_interval: PING_INTERVAL,
            pong_timeout: PONG_TIMEOUT,
            liveness_check_interval: LIVENESS_CHECK_INTERVAL,
            io_timeout: IO_TIMEOUT,
        }
    }
}

/// Why a connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// `disconnect()` was called
    Requested,
    ClosedByPeer,
    TransportFailure,
    /// No pong within the pong timeout
    LivenessTimeout,
}

impl DisconnectReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "disconnect requested",
            Self::ClosedByPeer => "closed by relay",
            Self::TransportFailure => "transport failure",
            Self::LivenessTimeout => "no pong from relay",
        }
    }
}

/// Events delivered to the owner of a [`SyncLink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Connected,
    Disconnected { reason: DisconnectReason },
    RemoteUpdate(RemoteClipboard),
    /// Relay history in the order it was sent
    History(Vec<HistoryItem>),
    /// `error` frame from the relay; the connection stays open
    ServerError(String),
    /// Frame that could not be decoded; the connection stays open
    ProtocolError(String),
}

type SharedSink = Arc<Mutex<Box<dyn FrameSink>>>;

struct LinkState {
    status: LinkStatus,
    generation: u64,
    last_pong: Instant,
    sink: Option<SharedSink>,
}

struct Shared {
    state: StdMutex<LinkState>,
    state_tx: watch::Sender<ConnectionState>,
    events: mpsc::UnboundedSender<LinkEvent>,
    config: LinkConfig,
}

struct ActiveConnection {
    generation: u64,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl ActiveConnection {
    async fn reap(self) {
        self.cancel.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(generation = self.generation, "Link task ended abnormally: {}", e);
            }
        }
    }
}

/// Client side of the relay connection
pub struct SyncLink<T: RelayTransport> {
    transport: T,
    shared: Arc<Shared>,
    active: Mutex<Option<ActiveConnection>>,
}

impl<T: RelayTransport> SyncLink<T> {
    /// Create a disconnected link and the receiver for its events
    pub fn new(transport: T, config: LinkConfig) -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);

        let shared = Arc::new(Shared {
            state: StdMutex::new(LinkState {
                status: LinkStatus::new(),
                generation: 0,
                last_pong: Instant::now(),
                sink: None,
            }),
            state_tx,
            events,
            config,
        });

        let link = Self {
            transport,
            shared,
            active: Mutex::new(None),
        };
        (link, rx)
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.lock().status.state()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Watch connection state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state_tx.subscribe()
    }

    /// Open an authenticated connection to `endpoint`.
    ///
    /// Does nothing when already connected. Tasks left over from a connection
    /// that was lost are reaped first.
    pub async fn connect(&self, token: &str, endpoint: &Url) -> Result<(), ConnectError> {
        let mut active = self.active.lock().await;

        if self.is_connected() {
            debug!("Already connected to relay");
            return Ok(());
        }

        if let Some(stale) = active.take() {
            stale.reap().await;
        }

        {
            let mut state = self.shared.lock();
            let next = state.status.begin_connect()?;
            self.shared.publish(next);
        }

        info!("Connecting to relay at {}", endpoint);
        let url = authenticated_url(endpoint, token);
        let io_timeout = self.shared.config.io_timeout;

        let opened = match tokio::time::timeout(io_timeout, self.transport.open(&url)).await {
            Ok(result) => result,
            Err(_) => Err(ConnectError::Timeout(io_timeout)),
        };

        let connection = match opened {
            Ok(connection) => connection,
            Err(e) => {
                let mut state = self.shared.lock();
                if let Err(e) = state.status.connect_failed() {
                    debug!("Ignoring state transition after failed connect: {}", e);
                }
                self.shared.publish(state.status.state());
                warn!("Relay connection failed: {}", e);
                return Err(e);
            }
        };

        let sink: SharedSink = Arc::new(Mutex::new(connection.sink));
        let established = {
            let mut state = self.shared.lock();
            match state.status.established() {
                Ok(()) => {
                    state.generation += 1;
                    state.last_pong = Instant::now();
                    state.sink = Some(Arc::clone(&sink));
                    self.shared.publish(ConnectionState::Connected);
                    let _ = self.shared.events.send(LinkEvent::Connected);
                    Ok(state.generation)
                }
                Err(e) => Err(e),
            }
        };
        let generation = match established {
            Ok(generation) => generation,
            Err(e) => {
                close_sink(&sink, io_timeout).await;
                return Err(e.into());
            }
        };
        info!("Connected to relay");

        let cancel = CancellationToken::new();
        let tasks = vec![
            tokio::spawn(read_loop(
                Arc::clone(&self.shared),
                generation,
                connection.stream,
                cancel.clone(),
            )),
            tokio::spawn(keepalive_loop(
                Arc::clone(&self.shared),
                generation,
                cancel.clone(),
            )),
            tokio::spawn(liveness_loop(
                Arc::clone(&self.shared),
                generation,
                cancel.clone(),
            )),
        ];

        *active = Some(ActiveConnection {
            generation,
            cancel,
            tasks,
        });
        Ok(())
    }

    /// Stop all background activity and close the transport.
    ///
    /// Idempotent. A `Disconnected` event is emitted only when a connection
    /// was actually open.
    pub async fn disconnect(&self) {
        let mut active = self.active.lock().await;

        let sink = {
            let mut state = self.shared.lock();
            let previous = state.status.close();
            state.generation += 1;
            self.shared.publish(ConnectionState::Disconnected);
            if previous == ConnectionState::Connected {
                let _ = self.shared.events.send(LinkEvent::Disconnected {
                    reason: DisconnectReason::Requested,
                });
            }
            state.sink.take()
        };

        if let Some(connection) = active.take() {
            connection.reap().await;
        }

        if let Some(sink) = sink {
            close_sink(&sink, self.shared.config.io_timeout).await;
            info!("Disconnected from relay");
        }
    }

    /// Send a clipboard update stamped with the current time
    pub async fn send_clipboard_update(&self, content: &str) -> Result<(), TransportError> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let message = ClientMessage::clipboard_update(content, timestamp);

        match self.shared.send(None, &message).await {
            Ok(()) => {
                info!("Sent clipboard update: {}", preview(content));
                Ok(())
            }
            Err(e) => {
                warn!("Cannot send clipboard update: {}", e);
                Err(e)
            }
        }
    }

    /// Ask the relay to resend its history
    pub async fn request_history(&self) -> Result<(), TransportError> {
        self.shared.send(None, &ClientMessage::HistoryRequest).await
    }

    /// Ask the relay to clear its history
    pub async fn clear_history(&self) -> Result<(), TransportError> {
        self.shared.send(None, &ClientMessage::ClearHistory).await
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, LinkState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }

    /// Emit an event only while `generation` is the live connection
    fn emit(&self, generation: u64, event: LinkEvent) {
        let state = self.lock();
        if state.generation == generation && state.status.is_connected() {
            let _ = self.events.send(event);
        }
    }

    /// Send a frame on the current connection, or on `expected` only
    async fn send(
        &self,
        expected: Option<u64>,
        message: &ClientMessage,
    ) -> Result<(), TransportError> {
        let sink = {
            let state = self.lock();
            if !state.status.is_connected()
                || expected.is_some_and(|generation| generation != state.generation)
            {
                return Err(TransportError::NotConnected);
            }
            state.sink.clone().ok_or(TransportError::NotConnected)?
        };

        let text = message
            .encode()
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        let io_timeout = self.config.io_timeout;

        match tokio::time::timeout(io_timeout, async { sink.lock().await.send_text(text).await })
            .await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(io_timeout)),
        }
    }

    fn handle_frame(&self, generation: u64, text: &str) {
        match protocol::decode(text) {
            Ok(ServerMessage::Pong) => {
                let mut state = self.lock();
                if state.generation == generation {
                    state.last_pong = Instant::now();
                }
                debug!("Received pong");
            }
            Ok(ServerMessage::ClipboardUpdate(remote)) => {
                info!("Remote clipboard update: {}", preview(&remote.content));
                self.emit(generation, LinkEvent::RemoteUpdate(remote));
            }
            Ok(ServerMessage::History(items)) => {
                info!("Received clipboard history: {} items", items.len());
                self.emit(generation, LinkEvent::History(items));
            }
            Ok(ServerMessage::HistoryCleared) => {
                info!("Relay cleared clipboard history");
                self.emit(generation, LinkEvent::History(Vec::new()));
            }
            Ok(ServerMessage::Error(message)) => {
                warn!("Relay error: {}", message);
                self.emit(generation, LinkEvent::ServerError(message));
            }
            Ok(ServerMessage::Unknown(kind)) => {
                warn!("Ignoring unknown message type: {}", kind);
            }
            Err(e) => {
                warn!("Dropping malformed frame: {}", e);
                self.emit(generation, LinkEvent::ProtocolError(e.to_string()));
            }
        }
    }

    /// Tear down `generation` after a failure.
    /// Only the first caller for a generation has any effect.
    async fn connection_lost(
        &self,
        generation: u64,
        reason: DisconnectReason,
        cancel: &CancellationToken,
    ) {
        let sink = {
            let mut state = self.lock();
            if state.generation != generation || state.status.drop_connection().is_err() {
                return;
            }
            state.generation += 1;
            self.publish(ConnectionState::Disconnected);
            let _ = self.events.send(LinkEvent::Disconnected { reason });
            state.sink.take()
        };

        warn!("Relay connection lost: {}", reason.as_str());
        cancel.cancel();

        if let Some(sink) = sink {
            close_sink(&sink, self.config.io_timeout).await;
        }
    }
}

/// Endpoint with the sync token as the `token` query parameter
fn authenticated_url(endpoint: &Url, token: &str) -> Url {
    let mut url = endpoint.clone();
    let retained: Vec<(String, String)> = endpoint
        .query_pairs()
        .filter(|(key, _)| key != "token")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        query.extend_pairs(retained);
        query.append_pair("token", token);
    }
    url
}

async fn close_sink(sink: &SharedSink, io_timeout: Duration) {
    let closed = tokio::time::timeout(io_timeout, async { sink.lock().await.close().await }).await;
    match closed {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("Error closing relay connection: {}", e),
        Err(_) => debug!("Timed out closing relay connection"),
    }
}

async fn read_loop(
    shared: Arc<Shared>,
    generation: u64,
    mut stream: Box<dyn FrameStream>,
    cancel: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => return,
            frame = stream.next_frame() => frame,
        };

        match frame {
            Some(Ok(text)) => shared.handle_frame(generation, &text),
            Some(Err(e)) => {
                warn!("Relay read error: {}", e);
                shared
                    .connection_lost(generation, DisconnectReason::TransportFailure, &cancel)
                    .await;
                return;
            }
            None => {
                shared
                    .connection_lost(generation, DisconnectReason::ClosedByPeer, &cancel)
                    .await;
                return;
            }
        }
    }
}

async fn keepalive_loop(shared: Arc<Shared>, generation: u64, cancel: CancellationToken) {
    let period = shared.config.ping_interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {
                match shared.send(Some(generation), &ClientMessage::Ping).await {
                    Ok(()) => debug!("Sent ping"),
                    Err(TransportError::NotConnected) => return,
                    Err(e) => warn!("Ping failed: {}", e),
                }
            }
        }
    }
}

async fn liveness_loop(shared: Arc<Shared>, generation: u64, cancel: CancellationToken) {
    let period = shared.config.liveness_check_interval;
    let pong_timeout = shared.config.pong_timeout;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {
                let silent_for = {
                    let state = shared.lock();
                    if state.generation != generation {
                        return;
                    }
                    state.last_pong.elapsed()
                };

                if silent_for > pong_timeout {
                    warn!("No pong from relay for {}s", silent_for.as_secs());
                    shared
                        .connection_lost(generation, DisconnectReason::LivenessTimeout, &cancel)
                        .await;
                    return;
                }
            }
        }
    }
}
