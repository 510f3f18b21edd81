//! Relay synchronization domain: connection state, wire protocol and timing

pub mod interval;
pub mod protocol;
pub mod state;

pub use interval::Interval;
pub use protocol::{ClientMessage, DecodeError, RemoteClipboard, ServerMessage};
pub use state::{ConnectionState, InvalidStateTransition, LinkStatus};
