//! Hand-off of selected records to the external processing pipeline.
//!
//! The pipeline owns scheduling, retries and output handling. From this
//! side a launch is fire-and-forget: a [`LaunchHandle`] says what was
//! started, never whether the jobs succeed.

pub mod process;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LaunchError;
use crate::survey::RecordId;

pub use process::ProcessLauncher;

/// Per-launch options chosen by the user or the command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaunchOptions {
    /// Build the commands but do not start anything.
    #[serde(default)]
    pub dry_run: bool,
    /// Extra arguments appended to every launcher command.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl LaunchOptions {
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }
}

/// Selected identifiers bundled with the options, consumed by one launch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchRequest {
    pub request_id: Uuid,
    pub record_ids: Vec<RecordId>,
    pub options: LaunchOptions,
    pub created_at: DateTime<Utc>,
}

impl LaunchRequest {
    pub fn new(record_ids: Vec<RecordId>, options: LaunchOptions) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            record_ids,
            options,
            created_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.record_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record_ids.is_empty()
    }
}

/// What a launcher reports back after starting a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchHandle {
    pub request_id: Uuid,
    pub launched: Vec<RecordId>,
    /// Operating system ids of the spawned processes; empty for a dry run.
    pub pids: Vec<u32>,
    /// The command lines that were (or, for a dry run, would be) executed.
    pub commands: Vec<String>,
    pub dry_run: bool,
    pub submitted_at: DateTime<Utc>,
}

/// Starts processing for a set of records.
#[async_trait]
pub trait PipelineLauncher: Send + Sync {
    async fn launch(&self, request: &LaunchRequest) -> Result<LaunchHandle, LaunchError>;
}
