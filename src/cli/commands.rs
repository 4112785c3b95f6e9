//! Command-line definition and startup wiring for mission-control.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use crate::config::{LaunchMode, MissionConfig};
use crate::controller::Controller;
use crate::database::HttpDatabase;
use crate::launcher::{LaunchOptions, ProcessLauncher};
use crate::shell;
use crate::state::AppState;
use crate::survey::SurveyCatalog;

/// Default log file, written next to where the tool is started.
pub const DEFAULT_LOG_FILE: &str = "mission_control.log";

/// Terminal front-end for browsing survey pointings and launching jobs.
#[derive(Parser, Debug)]
#[command(name = "mission-control")]
#[command(about = "Browse survey pointings and launch processing jobs")]
#[command(version)]
#[command(
    long_about = "mission-control queries the survey database for pointings, shows their processing status, and hands a selection to the pipeline launcher.\n\nExample usage:\n  mission-control --db-host tpp-db.example.org --db-port 8080 --dry-run"
)]
pub struct Cli {
    /// YAML configuration file (defaults to ./mission_control.yaml if present).
    #[arg(short, long, env = "MISSION_CONTROL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// File the log is written to. The terminal is taken by the interface.
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Survey database host.
    #[arg(long, env = "TPP_DB_HOST")]
    pub db_host: Option<String>,

    /// Survey database port.
    #[arg(long, env = "TPP_DB_PORT")]
    pub db_port: Option<u16>,

    /// Bearer token for the survey database.
    #[arg(long, env = "TPP_DB_TOKEN", hide_env_values = true)]
    pub db_token: Option<String>,

    /// Launcher program.
    #[arg(long, env = "MISSION_CONTROL_LAUNCHER")]
    pub launcher: Option<String>,

    /// Launcher mode: per_record or batch.
    #[arg(long)]
    pub launch_mode: Option<LaunchMode>,

    /// Log launch commands instead of running them.
    #[arg(long)]
    pub dry_run: bool,

    /// Extra argument passed to every launcher invocation (repeatable).
    #[arg(long = "extra-arg", allow_hyphen_values = true)]
    pub extra_args: Vec<String>,

    /// Start with the sky map toggle off.
    #[arg(long)]
    pub no_skymap: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration.
    pub fn apply_overrides(&self, config: &mut MissionConfig) {
        if let Some(host) = &self.db_host {
            config.database.host = host.clone();
        }
        if let Some(port) = self.db_port {
            config.database.port = port;
        }
        if let Some(token) = &self.db_token {
            config.database.token = Some(token.clone());
        }
        if let Some(program) = &self.launcher {
            config.launcher.program = program.clone();
        }
        if let Some(mode) = self.launch_mode {
            config.launcher.mode = mode;
        }
        if self.no_skymap {
            config.ui.show_skymap = false;
        }
    }

    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions::default()
            .with_dry_run(self.dry_run)
            .with_extra_args(self.extra_args.clone())
    }
}

/// Parse CLI arguments and return the Cli struct.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parse arguments and run the interface.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run mission-control with already parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let mut config =
        MissionConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    let database = HttpDatabase::new(&config.database)?;
    let launcher = ProcessLauncher::from_config(&config.launcher);
    info!(
        database = %database.base_url(),
        launcher = %config.launcher.program,
        mode = ?config.launcher.mode,
        dry_run = cli.dry_run,
        "Starting mission-control"
    );

    let controller = Controller::new(Arc::new(database), Arc::new(launcher));
    let mut state = AppState::new(
        SurveyCatalog::default(),
        config.ui.show_skymap,
        cli.launch_options(),
    );

    match controller.load_catalog(&mut state).await {
        Ok(parents) => info!(parents, "Survey catalog loaded"),
        Err(e) => {
            warn!("Could not load survey catalog: {}", e);
            state.error(format!("{}\n\nPress Ctrl-R on the query form to retry.", e));
        }
    }

    shell::run(controller, state, config.ui.tick_rate()).await
}
