//! Configuration for mission-control.
//!
//! Settings come from a YAML file, with a handful of command-line and
//! environment overrides applied on top by the CLI layer:
//!
//! ```yaml
//! database:
//!   host: tpp-db.example.org
//!   port: 8080
//!   token: "..."
//! launcher:
//!   program: /opt/tpp/launcher.py
//!   args: ["-d", "{id}"]
//!   mode: per_record
//! ui:
//!   show_skymap: true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "mission_control.yaml";

/// Placeholder replaced by the record identifier in launcher arguments.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    pub database: DatabaseConfig,
    pub launcher: LauncherConfig,
    pub ui: UiConfig,
}

/// Connection settings for the survey database REST service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    pub timeout_secs: u64,
    /// Endpoint searched for the job entry of a pointing.
    pub status_endpoint: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            token: None,
            timeout_secs: 60,
            status_endpoint: "survey/search_data".to_string(),
        }
    }
}

impl DatabaseConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// How the launcher program receives identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchMode {
    /// One process per record, `{id}` substituted in the arguments.
    #[default]
    PerRecord,
    /// One process for the whole request, identifiers appended.
    Batch,
}

impl std::str::FromStr for LaunchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per_record" | "per-record" | "record" => Ok(LaunchMode::PerRecord),
            "batch" => Ok(LaunchMode::Batch),
            other => Err(format!("Unknown launch mode: {}", other)),
        }
    }
}

/// External launcher program.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub program: String,
    pub args: Vec<String>,
    pub mode: LaunchMode,
    pub working_dir: Option<PathBuf>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            program: "launcher.py".to_string(),
            args: vec!["-d".to_string(), ID_PLACEHOLDER.to_string()],
            mode: LaunchMode::PerRecord,
            working_dir: None,
        }
    }
}

/// Terminal front-end settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Input poll interval.
    pub tick_rate_ms: u64,
    /// Initial state of the sky map toggle on the query form.
    pub show_skymap: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 200,
            show_skymap: true,
        }
    }
}

impl UiConfig {
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}

impl MissionConfig {
    /// Parses and validates a configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: MissionConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    ///
    /// When `path` is `None` the default file is used if present, otherwise
    /// built-in defaults. An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_yaml(&content)?;
        tracing::info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.host.trim().is_empty() {
            return Err(invalid("database.host", "cannot be empty"));
        }
        if self.database.port == 0 {
            return Err(invalid("database.port", "must be greater than 0"));
        }
        if self.database.timeout_secs == 0 {
            return Err(invalid("database.timeout_secs", "must be greater than 0"));
        }
        if self.launcher.program.trim().is_empty() {
            return Err(invalid("launcher.program", "cannot be empty"));
        }
        if self.launcher.mode == LaunchMode::PerRecord
            && !self
                .launcher
                .args
                .iter()
                .any(|a| a.contains(ID_PLACEHOLDER))
        {
            return Err(invalid(
                "launcher.args",
                "per_record mode needs an argument containing {id}",
            ));
        }
        if self.ui.tick_rate_ms == 0 {
            return Err(invalid("ui.tick_rate_ms", "must be greater than 0"));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
