//! Launcher that starts an external program for the selected records.
//!
//! In per-record mode every identifier gets its own process
//! (`launcher.py -d <id>`); in batch mode one process receives all of them.
//! Children run in their own process group with null stdio and are never
//! awaited.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use chrono::Utc;
use tokio::process::Command;
use tracing::{info, warn};

use super::{LaunchHandle, LaunchRequest, PipelineLauncher};
use crate::config::{LaunchMode, LauncherConfig, ID_PLACEHOLDER};
use crate::error::LaunchError;

/// Spawns the configured launcher program.
pub struct ProcessLauncher {
    program: String,
    args: Vec<String>,
    mode: LaunchMode,
    working_dir: Option<PathBuf>,
}

impl ProcessLauncher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            mode: LaunchMode::Batch,
            working_dir: None,
        }
    }

    pub fn from_config(config: &LauncherConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            mode: config.mode,
            working_dir: config.working_dir.clone(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_mode(mut self, mode: LaunchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Argument vectors (program excluded) for each process the request needs.
    pub fn build_invocations(&self, request: &LaunchRequest) -> Vec<Vec<String>> {
        let extra = &request.options.extra_args;
        match self.mode {
            LaunchMode::PerRecord => request
                .record_ids
                .iter()
                .map(|id| {
                    self.args
                        .iter()
                        .map(|a| a.replace(ID_PLACEHOLDER, id.as_str()))
                        .chain(extra.iter().cloned())
                        .collect()
                })
                .collect(),
            LaunchMode::Batch => {
                let args = self
                    .args
                    .iter()
                    .filter(|a| !a.contains(ID_PLACEHOLDER))
                    .cloned()
                    .chain(extra.iter().cloned())
                    .chain(request.record_ids.iter().map(|id| id.to_string()))
                    .collect();
                vec![args]
            }
        }
    }

    fn command_line(&self, args: &[String]) -> String {
        std::iter::once(&self.program)
            .chain(args.iter())
            .map(|part| {
                if part.is_empty() || part.contains(char::is_whitespace) {
                    format!("'{}'", part.replace('\'', "'\\''"))
                } else {
                    part.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn spawn(&self, args: &[String]) -> std::io::Result<u32> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn()?;
        Ok(child.id().unwrap_or_default())
    }
}

#[async_trait]
impl PipelineLauncher for ProcessLauncher {
    async fn launch(&self, request: &LaunchRequest) -> Result<LaunchHandle, LaunchError> {
        if request.is_empty() {
            return Err(LaunchError::EmptyRequest);
        }
        if self.program.trim().is_empty() {
            return Err(LaunchError::NotConfigured(
                "launcher program is empty".to_string(),
            ));
        }

        let invocations = self.build_invocations(request);
        let commands: Vec<String> = invocations
            .iter()
            .map(|args| self.command_line(args))
            .collect();

        let mut pids = Vec::new();
        if request.options.dry_run {
            for command in &commands {
                info!(request_id = %request.request_id, %command, "Dry run, not launching");
            }
        } else {
            for (args, command) in invocations.iter().zip(&commands) {
                match self.spawn(args) {
                    Ok(pid) => {
                        info!(request_id = %request.request_id, pid, %command, "Launched");
                        pids.push(pid);
                    }
                    Err(e) => {
                        warn!(
                            request_id = %request.request_id,
                            started = pids.len(),
                            %command,
                            "Launch aborted: {}",
                            e
                        );
                        return Err(LaunchError::SpawnFailed {
                            program: self.program.clone(),
                            message: e.to_string(),
                            started: pids.len(),
                        });
                    }
                }
            }
        }

        Ok(LaunchHandle {
            request_id: request.request_id,
            launched: request.record_ids.clone(),
            pids,
            commands,
            dry_run: request.options.dry_run,
            submitted_at: Utc::now(),
        })
    }
}
