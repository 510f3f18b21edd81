//! Shutdown signal handling
//!
//! SIGINT and SIGTERM (Ctrl+C elsewhere) cancel a shared token that the
//! sync loop watches.

use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Install signal handlers and return the token they cancel
pub fn shutdown_token() -> Result<CancellationToken, std::io::Error> {
    let token = CancellationToken::new();
    listen(token.clone())?;
    Ok(token)
}

#[cfg(unix)]
fn listen(token: CancellationToken) -> Result<(), std::io::Error> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        };
        eprintln!("{} Received {} (shutdown)", "↓".cyan(), name);
        debug!(signal = name, "Shutdown requested");
        token.cancel();
    });

    Ok(())
}

#[cfg(not(unix))]
fn listen(token: CancellationToken) -> Result<(), std::io::Error> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{} Received Ctrl+C (shutdown)", "↓".cyan());
            token.cancel();
        }
    });
    Ok(())
}
