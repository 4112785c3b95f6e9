//! mission-control: query survey pointings and launch processing jobs.
//!
//! The library holds the pieces behind the terminal interface: the survey
//! database adapter, the pipeline launcher, the selection view and the
//! controller that ties them together.

pub mod cli;
pub mod config;
pub mod controller;
pub mod database;
pub mod error;
pub mod launcher;
pub mod shell;
pub mod state;
pub mod survey;
pub mod view;

// Re-export commonly used types
pub use config::MissionConfig;
pub use controller::{Controller, LaunchOutcome, RefreshOutcome};
pub use database::{DatabaseAdapter, HttpDatabase};
pub use error::{ConfigError, ControllerError, DataAccessError, ExportError, LaunchError};
pub use launcher::{LaunchHandle, LaunchOptions, LaunchRequest, PipelineLauncher, ProcessLauncher};
pub use state::AppState;
pub use survey::{
    CoordinateFilter, ProcessingStatus, QueryParams, RecordId, SurveyCatalog, SurveyInfo,
    SurveyRecord, SurveySummary,
};
pub use view::{SelectionSet, SelectionView};
