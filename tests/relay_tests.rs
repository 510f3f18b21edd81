//! Relay link tests against a local WebSocket server

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};
use url::Url;

use corridor::application::{DisconnectReason, LinkConfig, LinkEvent, SyncLink};
use corridor::domain::history::HistoryItem;
use corridor::domain::sync::ConnectionState;
use corridor::infrastructure::WebSocketTransport;

const WAIT: Duration = Duration::from_secs(5);

/// One-connection relay stand-in. Returns the endpoint, the query string the
/// client used, and the accepted socket.
async fn relay() -> (
    Url,
    Arc<Mutex<Option<String>>>,
    mpsc::UnboundedReceiver<WebSocketStream<TcpStream>>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let query = Arc::new(Mutex::new(None));
    let (tx, rx) = mpsc::unbounded_channel();

    let seen = Arc::clone(&query);
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let seen = Arc::clone(&seen);
            let record_query =
                move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
                    *seen.lock().unwrap() = request.uri().query().map(str::to_string);
                    Ok(response)
                };
            let socket = accept_hdr_async(stream, record_query).await.unwrap();
            if tx.send(socket).is_err() {
                break;
            }
        }
    });

    let endpoint = Url::parse(&format!("ws://{}/ws", addr)).unwrap();
    (endpoint, query, rx)
}

async fn next_text(socket: &mut WebSocketStream<TcpStream>) -> String {
    loop {
        let message = tokio::time::timeout(WAIT, socket.next())
            .await
            .expect("timed out waiting for frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = message {
            return text;
        }
    }
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<LinkEvent>) -> LinkEvent {
    tokio::time::timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

#[tokio::test]
async fn token_travels_in_query_and_update_frame_is_exact() {
    let (endpoint, query, mut accepted) = relay().await;
    let (link, mut events) = SyncLink::new(WebSocketTransport::new(), LinkConfig::default());

    link.connect("s3cret token", &endpoint).await.unwrap();
    let mut socket = accepted.recv().await.unwrap();
    assert_eq!(next_event(&mut events).await, LinkEvent::Connected);
    assert_eq!(query.lock().unwrap().as_deref(), Some("token=s3cret+token"));

    link.send_clipboard_update("hello").await.unwrap();
    let frame = next_text(&mut socket).await;

    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value["type"], "clipboard_update");
    assert_eq!(value["data"]["content"], "hello");
    assert!(value["data"]["timestamp"].is_i64());
    assert_eq!(value.as_object().unwrap().len(), 2);
    assert_eq!(value["data"].as_object().unwrap().len(), 2);

    link.disconnect().await;
}

#[tokio::test]
async fn unknown_frames_are_ignored_and_history_delivered() {
    let (endpoint, _, mut accepted) = relay().await;
    let (link, mut events) = SyncLink::new(WebSocketTransport::new(), LinkConfig::default());

    link.connect("t", &endpoint).await.unwrap();
    let mut socket = accepted.recv().await.unwrap();
    assert_eq!(next_event(&mut events).await, LinkEvent::Connected);

    socket
        .send(Message::Text(r#"{"type":"frobnicate"}"#.to_string()))
        .await
        .unwrap();
    socket
        .send(Message::Text(
            r#"{"type":"clipboard_history","history":[{"id":"1","content":"a","timestamp":1000}]}"#
                .to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(
        next_event(&mut events).await,
        LinkEvent::History(vec![HistoryItem::new("1", "a", 1000)])
    );
    assert_eq!(link.state(), ConnectionState::Connected);

    link.request_history().await.unwrap();
    assert_eq!(next_text(&mut socket).await, r#"{"type":"clipboard_history"}"#);

    link.disconnect().await;
}

#[tokio::test]
async fn non_utf8_binary_frame_is_a_protocol_error() {
    let (endpoint, _, mut accepted) = relay().await;
    let (link, mut events) = SyncLink::new(WebSocketTransport::new(), LinkConfig::default());

    link.connect("t", &endpoint).await.unwrap();
    let mut socket = accepted.recv().await.unwrap();
    assert_eq!(next_event(&mut events).await, LinkEvent::Connected);

    socket
        .send(Message::Binary(vec![0xff, 0xfe, 0x00]))
        .await
        .unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        LinkEvent::ProtocolError(_)
    ));

    // The connection survives and later frames still arrive
    socket
        .send(Message::Text(
            r#"{"type":"clipboard_update","data":{"content":"after","timestamp":1}}"#.to_string(),
        ))
        .await
        .unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        LinkEvent::RemoteUpdate(ref update) if update.content == "after"
    ));
    assert_eq!(link.state(), ConnectionState::Connected);

    link.disconnect().await;
}

#[tokio::test]
async fn server_close_is_reported() {
    let (endpoint, _, mut accepted) = relay().await;
    let (link, mut events) = SyncLink::new(WebSocketTransport::new(), LinkConfig::default());

    link.connect("t", &endpoint).await.unwrap();
    let mut socket = accepted.recv().await.unwrap();
    assert_eq!(next_event(&mut events).await, LinkEvent::Connected);

    socket.close(None).await.unwrap();
    assert_eq!(
        next_event(&mut events).await,
        LinkEvent::Disconnected {
            reason: DisconnectReason::ClosedByPeer
        }
    );
    assert_eq!(link.state(), ConnectionState::Disconnected);

    // A fresh connection works after the loss
    link.connect("t", &endpoint).await.unwrap();
    assert_eq!(next_event(&mut events).await, LinkEvent::Connected);
    link.disconnect().await;
}

#[tokio::test]
async fn unreachable_relay_fails_to_connect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (link, _events) = SyncLink::new(WebSocketTransport::new(), LinkConfig::default());
    let endpoint = Url::parse(&format!("ws://{}/ws", addr)).unwrap();

    assert!(link.connect("t", &endpoint).await.is_err());
    assert_eq!(link.state(), ConnectionState::Disconnected);
}
