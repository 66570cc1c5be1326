//! vtmux
//!
//! A terminal multiplexer built on a from-scratch VT100 interpreter.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vtmux::app::{App, CliArgs, Config};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    if let Err(e) = init_logging(args.log_file.as_deref()) {
        eprintln!("Cannot open log file: {}", e);
        return ExitCode::FAILURE;
    }

    // Load configuration with precedence: CLI > env > file > defaults
    let config = match Config::load_with_args(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = App::new(&config).and_then(App::run);
    match result {
        Ok(()) => {
            tracing::info!("vtmux exited");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Fatal error: {}", e);
            eprintln!("vtmux: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to `path`, filtered by `RUST_LOG` (default `warn`).
///
/// The terminal belongs to the buffers, so without a file nothing is logged.
fn init_logging(path: Option<&Path>) -> io::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}
