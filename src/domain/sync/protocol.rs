//! Relay wire protocol
//!
//! Every frame is a JSON object carrying a `type` discriminator. Outbound frames
//! are produced by serializing [`ClientMessage`]; inbound text goes through
//! [`decode`], which separates malformed frames from well-formed ones of an
//! unknown type.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::history::HistoryItem;

/// Fallback message for `error` frames without an `error` field
pub const UNKNOWN_SERVER_ERROR: &str = "Unknown error";

/// Frames sent from the client to the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    ClipboardUpdate { data: ClipboardPayload },
    Ping,
    /// Ask the relay to resend its history
    #[serde(rename = "clipboard_history")]
    HistoryRequest,
    ClearHistory,
}

impl ClientMessage {
    pub fn clipboard_update(content: impl Into<String>, timestamp: i64) -> Self {
        Self::ClipboardUpdate {
            data: ClipboardPayload {
                content: content.into(),
                timestamp,
            },
        }
    }

    /// Serialize to the text frame sent over the wire
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Frame name used in logs
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ClipboardUpdate { .. } => "clipboard_update",
            Self::Ping => "ping",
            Self::HistoryRequest => "clipboard_history",
            Self::ClearHistory => "clear_history",
        }
    }
}

/// Payload of an outbound clipboard update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClipboardPayload {
    pub content: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// A clipboard value broadcast by the relay
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteClipboard {
    pub content: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Frames received from the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    ClipboardUpdate(RemoteClipboard),
    /// Items in the order the relay sent them
    History(Vec<HistoryItem>),
    HistoryCleared,
    Pong,
    Error(String),
    /// Well-formed frame with a type this client does not handle
    Unknown(String),
}

/// Error when an inbound frame cannot be interpreted
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    #[error("Frame is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Frame has no string \"type\" field")]
    MissingType,

    #[error("Malformed {kind} frame: {reason}")]
    InvalidPayload { kind: String, reason: String },
}

#[derive(Deserialize)]
struct UpdateFrame {
    data: RemoteClipboard,
}

#[derive(Deserialize)]
struct HistoryFrame {
    #[serde(default)]
    history: Vec<HistoryItem>,
}

/// Decode one inbound text frame
pub fn decode(text: &str) -> Result<ServerMessage, DecodeError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingType)?
        .to_string();

    let invalid = |e: serde_json::Error| DecodeError::InvalidPayload {
        kind: kind.clone(),
        reason: e.to_string(),
    };

    match kind.as_str() {
        "clipboard_update" => {
            let frame: UpdateFrame = serde_json::from_value(value).map_err(invalid)?;
            Ok(ServerMessage::ClipboardUpdate(frame.data))
        }
        "clipboard_history" => {
            let frame: HistoryFrame = serde_json::from_value(value).map_err(invalid)?;
            Ok(ServerMessage::History(frame.history))
        }
        "clear_history" => Ok(ServerMessage::HistoryCleared),
        "pong" => Ok(ServerMessage::Pong),
        "error" => {
            let message = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN_SERVER_ERROR);
            Ok(ServerMessage::Error(message.to_string()))
        }
        _ => Ok(ServerMessage::Unknown(kind.clone())),
    }
}
