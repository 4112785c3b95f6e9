//! Error types for mission-control operations.
//!
//! Defines error types for the collaborators the front-end talks to:
//! - Survey database access (queries, catalog, survey info)
//! - Pipeline launches (spawning the external launcher)
//! - Sky map export
//! - Configuration loading and validation
//! - Controller-level rejections surfaced to the user

use thiserror::Error;

/// Errors that can occur while talking to the survey database.
#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("Cannot reach survey database at {url}: {message}")]
    Connection { url: String, message: String },

    #[error("Survey database returned HTTP {code} for '{endpoint}': {message}")]
    Status {
        endpoint: String,
        code: u16,
        message: String,
    },

    #[error("Unexpected response shape from '{endpoint}': {message}")]
    Schema { endpoint: String, message: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// Errors that can occur when handing records to the external pipeline.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(
        "Launcher program '{program}' could not be started: {message} \
         ({started} jobs of this launch were already started)"
    )]
    SpawnFailed {
        program: String,
        message: String,
        started: usize,
    },

    #[error("Launcher is not configured: {0}")]
    NotConfigured(String),

    #[error("Launch request is empty")]
    EmptyRequest,
}

/// Errors that can occur while writing the sky map to a file.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file '{0}' not found")]
    NotFound(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Conditions under which the controller refuses or fails an action.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Nothing selected: choose at least one pointing before launching")]
    NothingSelected,

    #[error(transparent)]
    DataAccess(#[from] DataAccessError),

    #[error(transparent)]
    Launch(#[from] LaunchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_error_is_transparent() {
        let err: ControllerError = LaunchError::EmptyRequest.into();
        assert_eq!(err.to_string(), "Launch request is empty");

        let err: ControllerError = DataAccessError::InvalidQuery("no survey".into()).into();
        assert_eq!(err.to_string(), "Invalid query: no survey");
    }

    #[test]
    fn test_status_error_message() {
        let err = DataAccessError::Status {
            endpoint: "data/search_data".to_string(),
            code: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Survey database returned HTTP 503 for 'data/search_data': unavailable"
        );
    }
}
