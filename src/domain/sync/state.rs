//! Relay connection state machine

use std::fmt;
use thiserror::Error;

/// Connectivity of the relay link as seen by the rest of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
        }
    }

    /// Connecting or Reconnecting
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Connecting | Self::Reconnecting)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: ConnectionState,
    pub action: String,
}

/// Link status entity.
/// Owns the connection state and enforces legal transitions.
///
/// State machine:
///   DISCONNECTED -> CONNECTING (begin_connect, first attempt)
///   DISCONNECTED -> RECONNECTING (begin_connect, after a prior connection)
///   CONNECTING | RECONNECTING -> CONNECTED (established)
///   CONNECTING | RECONNECTING -> DISCONNECTED (connect_failed)
///   CONNECTED -> DISCONNECTED (drop_connection)
///   ANY -> DISCONNECTED (close)
#[derive(Debug, Default)]
pub struct LinkStatus {
    state: ConnectionState,
    ever_connected: bool,
}

impl LinkStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Whether a connection was established at least once
    pub fn ever_connected(&self) -> bool {
        self.ever_connected
    }

    /// Transition from DISCONNECTED to CONNECTING or RECONNECTING
    pub fn begin_connect(&mut self) -> Result<ConnectionState, InvalidStateTransition> {
        if self.state != ConnectionState::Disconnected {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "begin connecting".to_string(),
            });
        }
        self.state = if self.ever_connected {
            ConnectionState::Reconnecting
        } else {
            ConnectionState::Connecting
        };
        Ok(self.state)
    }

    /// Transition from CONNECTING/RECONNECTING to CONNECTED
    pub fn established(&mut self) -> Result<(), InvalidStateTransition> {
        if !self.state.is_pending() {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "complete the handshake".to_string(),
            });
        }
        self.state = ConnectionState::Connected;
        self.ever_connected = true;
        Ok(())
    }

    /// Transition from CONNECTING/RECONNECTING back to DISCONNECTED
    pub fn connect_failed(&mut self) -> Result<(), InvalidStateTransition> {
        if !self.state.is_pending() {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "fail a connection attempt".to_string(),
            });
        }
        self.state = ConnectionState::Disconnected;
        Ok(())
    }

    /// Transition from CONNECTED to DISCONNECTED after the connection was lost
    pub fn drop_connection(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != ConnectionState::Connected {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "drop the connection".to_string(),
            });
        }
        self.state = ConnectionState::Disconnected;
        Ok(())
    }

    /// Force DISCONNECTED from any state.
    /// Returns the state that was left.
    pub fn close(&mut self) -> ConnectionState {
        std::mem::replace(&mut self.state, ConnectionState::Disconnected)
    }
}
