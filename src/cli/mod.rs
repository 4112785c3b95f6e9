//! Command-line interface for mission-control.
//!
//! Parses flags, merges them with the configuration file and starts the
//! terminal interface.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, DEFAULT_LOG_FILE};
