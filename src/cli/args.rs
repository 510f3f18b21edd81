//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};

/// Corridor - real-time clipboard sync through a relay
#[derive(Parser, Debug)]
#[command(name = "corridor")]
#[command(version)]
#[command(about = "Real-time clipboard sync between devices through a relay")]
#[command(long_about = None)]
pub struct Cli {
    /// Sync token shared by your devices
    #[arg(short = 't', long, env = "CORRIDOR_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Relay WebSocket endpoint (ws:// or wss://)
    #[arg(short = 'e', long, value_name = "URL", env = "CORRIDOR_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Clipboard poll interval (e.g., 500ms, 1s)
    #[arg(short = 'p', long, value_name = "TIME")]
    pub poll_interval: Option<String>,

    /// Disable desktop notifications
    #[arg(short = 's', long)]
    pub silent: bool,

    /// Verbose logging
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "token",
    "endpoint",
    "poll_interval",
    "reconnect_delay",
    "history_size",
    "notifications.local_copy",
    "notifications.remote_update",
    "notifications.errors",
];

pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
