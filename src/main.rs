//! mission-control entry point.
//!
//! Initializes logging and delegates to the CLI module.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first to get log_level
    let cli = mission_control::cli::parse_cli();

    // Priority: RUST_LOG env var > --log-level CLI arg > default "info"
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| cli.log_level.clone());

    // The terminal belongs to the interface, so logs go to a file.
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cli.log_file)
        .with_context(|| format!("Failed to open log file {}", cli.log_file.display()))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(log_file)).with_ansi(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)))
        .init();

    mission_control::cli::run_with_cli(cli).await
}
