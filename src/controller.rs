//! Action controller: turns user actions into adapter and launcher calls.
//!
//! The controller keeps no state of its own; everything it reads or changes
//! lives in the [`AppState`] passed in by the shell.

use std::sync::Arc;

use tracing::{info, warn};

use crate::database::DatabaseAdapter;
use crate::error::ControllerError;
use crate::launcher::{LaunchHandle, LaunchRequest, PipelineLauncher};
use crate::state::AppState;
use crate::survey::{QueryParams, SurveySummary};

/// Result of a successful refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub pointings: usize,
    /// Pointings that still need processing.
    pub pending: usize,
}

impl RefreshOutcome {
    pub fn is_empty(&self) -> bool {
        self.pointings == 0
    }
}

/// Result of a successful launch.
#[derive(Debug, Clone)]
pub struct LaunchOutcome {
    pub handle: LaunchHandle,
    /// Launched records that were already submitted before.
    pub already_submitted: usize,
}

/// Mediates between view events and the external collaborators.
#[derive(Clone)]
pub struct Controller {
    database: Arc<dyn DatabaseAdapter>,
    launcher: Arc<dyn PipelineLauncher>,
}

impl Controller {
    pub fn new(database: Arc<dyn DatabaseAdapter>, launcher: Arc<dyn PipelineLauncher>) -> Self {
        Self { database, launcher }
    }

    /// Reloads the survey catalog into the query form.
    ///
    /// On failure the form keeps its previous catalog.
    pub async fn load_catalog(&self, state: &mut AppState) -> Result<usize, ControllerError> {
        let catalog = self.database.surveys().await?;
        let parents = catalog.parents().len();
        state.form.set_catalog(catalog);
        Ok(parents)
    }

    /// Runs `params` against the database and renders the result.
    ///
    /// Both the pointing query and the survey lookup must succeed before
    /// anything in `state` changes.
    pub async fn refresh(
        &self,
        state: &mut AppState,
        params: QueryParams,
    ) -> Result<RefreshOutcome, ControllerError> {
        let records = self.database.query(&params).await.map_err(|e| {
            warn!(survey = %params.survey, "Refresh failed: {}", e);
            e
        })?;
        let survey_info = self.database.survey_info(&params.survey).await.map_err(|e| {
            warn!(survey = %params.survey, "Survey lookup failed: {}", e);
            e
        })?;

        let summary = SurveySummary::compute(
            &params.parent_survey,
            &params.survey,
            &records,
            survey_info.as_ref(),
        );
        let outcome = RefreshOutcome {
            pointings: records.len(),
            pending: summary.unprocessed(),
        };

        state.view.render(records);
        state.summary = Some(summary);
        state.last_query = Some(params);

        info!(
            pointings = outcome.pointings,
            pending = outcome.pending,
            "Rendered query result"
        );
        Ok(outcome)
    }

    /// Hands the current selection to the pipeline launcher.
    ///
    /// An empty selection is rejected without touching the launcher. The
    /// selection is cleared only when the launch succeeds.
    pub async fn launch(&self, state: &mut AppState) -> Result<LaunchOutcome, ControllerError> {
        let selection = state.view.get_selection();
        if selection.is_empty() {
            return Err(ControllerError::NothingSelected);
        }

        let already_submitted = selection
            .ids()
            .iter()
            .filter_map(|id| state.view.record(id))
            .filter(|r| !r.needs_processing())
            .count();

        let request = LaunchRequest::new(selection.into_ids(), state.launch_options.clone());
        info!(
            request_id = %request.request_id,
            records = request.len(),
            dry_run = request.options.dry_run,
            "Submitting launch request"
        );

        let handle = self.launcher.launch(&request).await.map_err(|e| {
            warn!(request_id = %request.request_id, "Launch failed: {}", e);
            e
        })?;

        state.view.clear_selection();
        state.last_launch = Some(handle.clone());
        Ok(LaunchOutcome {
            handle,
            already_submitted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DataAccessError, LaunchError};
    use crate::launcher::LaunchOptions;
    use crate::survey::{ProcessingStatus, RecordId, SurveyCatalog, SurveyInfo, SurveyRecord};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    struct FixedDatabase {
        records: Vec<SurveyRecord>,
        fail_info: bool,
    }

    #[async_trait]
    impl DatabaseAdapter for FixedDatabase {
        async fn surveys(&self) -> Result<SurveyCatalog, DataAccessError> {
            Ok(SurveyCatalog::from_pairs(vec![("GBNCC", "gbncc-1")]))
        }

        async fn query(&self, _: &QueryParams) -> Result<Vec<SurveyRecord>, DataAccessError> {
            Ok(self.records.clone())
        }

        async fn survey_info(&self, survey: &str) -> Result<Option<SurveyInfo>, DataAccessError> {
            if self.fail_info {
                return Err(DataAccessError::Schema {
                    endpoint: "survey/search_data".to_string(),
                    message: "missing f_low".to_string(),
                });
            }
            Ok(Some(SurveyInfo {
                survey: survey.to_string(),
                f_low: 300.0,
                f_hi: 400.0,
            }))
        }
    }

    #[derive(Default)]
    struct RecordingLauncher {
        calls: Mutex<Vec<Vec<RecordId>>>,
        fail: bool,
    }

    #[async_trait]
    impl PipelineLauncher for RecordingLauncher {
        async fn launch(&self, request: &LaunchRequest) -> Result<LaunchHandle, LaunchError> {
            self.calls
                .lock()
                .expect("lock")
                .push(request.record_ids.clone());
            if self.fail {
                return Err(LaunchError::NotConfigured("test".to_string()));
            }
            Ok(LaunchHandle {
                request_id: request.request_id,
                launched: request.record_ids.clone(),
                pids: vec![],
                commands: vec![],
                dry_run: true,
                submitted_at: Utc::now(),
            })
        }
    }

    fn records() -> Vec<SurveyRecord> {
        vec![
            SurveyRecord::new("A", 58000.0, 1.0, 1.0),
            SurveyRecord::new("B", 58001.0, 2.0, 2.0).with_status(ProcessingStatus::Completed),
        ]
    }

    fn state() -> AppState {
        AppState::new(SurveyCatalog::default(), false, LaunchOptions::default())
    }

    #[tokio::test]
    async fn test_refresh_renders_and_summarises() {
        let db = Arc::new(FixedDatabase {
            records: records(),
            fail_info: false,
        });
        let controller = Controller::new(db, Arc::new(RecordingLauncher::default()));
        let mut state = state();

        let outcome = controller
            .refresh(&mut state, QueryParams::new("GBNCC", "gbncc-1"))
            .await
            .expect("refresh");
        assert_eq!(outcome, RefreshOutcome { pointings: 2, pending: 1 });
        assert_eq!(state.view.records().len(), 2);
        let summary = state.summary.as_ref().expect("summary");
        assert_eq!(summary.frequency_range, Some((300.0, 400.0)));
        assert_eq!(summary.completed, 1);
        assert_eq!(state.last_query.as_ref().map(|q| q.survey.as_str()), Some("gbncc-1"));
    }

    #[tokio::test]
    async fn test_refresh_is_all_or_nothing() {
        let good = Arc::new(FixedDatabase {
            records: records(),
            fail_info: false,
        });
        let mut state = state();
        Controller::new(good, Arc::new(RecordingLauncher::default()))
            .refresh(&mut state, QueryParams::new("GBNCC", "gbncc-1"))
            .await
            .expect("first refresh");
        state.view.select(&"A".into());

        // Pointing query would succeed but the survey lookup fails.
        let half_broken = Arc::new(FixedDatabase {
            records: vec![SurveyRecord::new("Z", 1.0, 0.0, 0.0)],
            fail_info: true,
        });
        let err = Controller::new(half_broken, Arc::new(RecordingLauncher::default()))
            .refresh(&mut state, QueryParams::new("GBNCC", "gbncc-2"))
            .await
            .expect_err("lookup failure");

        assert!(matches!(err, ControllerError::DataAccess(_)));
        assert_eq!(state.view.records().len(), 2);
        assert_eq!(state.view.get_selection().len(), 1);
        assert_eq!(state.last_query.as_ref().map(|q| q.survey.as_str()), Some("gbncc-1"));
    }

    #[tokio::test]
    async fn test_launch_failure_keeps_selection() {
        let db = Arc::new(FixedDatabase {
            records: records(),
            fail_info: false,
        });
        let launcher = Arc::new(RecordingLauncher {
            fail: true,
            ..Default::default()
        });
        let controller = Controller::new(db, launcher.clone());
        let mut state = state();
        controller
            .refresh(&mut state, QueryParams::new("GBNCC", "gbncc-1"))
            .await
            .expect("refresh");
        state.view.select(&"A".into());

        let err = controller.launch(&mut state).await.expect_err("launch fails");
        assert!(matches!(err, ControllerError::Launch(_)));
        assert_eq!(state.view.get_selection().len(), 1);
        assert!(state.last_launch.is_none());
        assert_eq!(launcher.calls.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn test_launch_counts_already_submitted() {
        let db = Arc::new(FixedDatabase {
            records: records(),
            fail_info: false,
        });
        let launcher = Arc::new(RecordingLauncher::default());
        let controller = Controller::new(db, launcher.clone());
        let mut state = state();
        controller
            .refresh(&mut state, QueryParams::new("GBNCC", "gbncc-1"))
            .await
            .expect("refresh");
        state.view.select(&"A".into());
        state.view.select(&"B".into());

        let outcome = controller.launch(&mut state).await.expect("launch");
        assert_eq!(outcome.already_submitted, 1);
        assert_eq!(outcome.handle.launched.len(), 2);
        assert!(state.view.get_selection().is_empty());
        assert!(state.last_launch.is_some());
    }

    #[tokio::test]
    async fn test_load_catalog() {
        let db = Arc::new(FixedDatabase {
            records: vec![],
            fail_info: false,
        });
        let controller = Controller::new(db, Arc::new(RecordingLauncher::default()));
        let mut state = state();
        assert_eq!(controller.load_catalog(&mut state).await.expect("catalog"), 1);
        assert_eq!(state.form.survey(), Some("gbncc-1"));
    }
}
