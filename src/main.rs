//! Corridor CLI entry point

use std::process::ExitCode;

use clap::Parser;

use corridor::cli::{
    app::{config_exit_code, run_sync},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use corridor::infrastructure::XdgConfigStore;

fn init_logging(debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = if debug {
        "warn,corridor=debug"
    } else {
        "warn,corridor=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match cli.command {
        Some(Commands::Config { action }) => {
            let presenter = Presenter::new();
            let store = XdgConfigStore::new();
            match handle_config_command(action, &store, &presenter).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(config_exit_code(&e))
                }
            }
        }
        None => run_sync(&cli).await,
    }
}
