//! Corridor - real-time clipboard sync client
//!
//! Watches the local clipboard, forwards genuine local changes to a relay over
//! an authenticated WebSocket, and applies updates from other devices without
//! echoing them back.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Value objects, the change detector, link state, the relay
//!   wire protocol, history, configuration and errors
//! - **Application**: Port traits, the clipboard source, the relay link, the
//!   coordinator between them and the session that owns everything
//! - **Infrastructure**: Adapter implementations (arboard and clipboard tools,
//!   WebSocket relay, desktop notifications, XDG config)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
