//! Survey database access.
//!
//! The front-end only needs three things from the database: the survey
//! catalog, the pointings matching a query (with their processing status)
//! and the band information of a survey. [`DatabaseAdapter`] captures that
//! capability; [`HttpDatabase`] implements it against the REST service.

pub mod http;

use async_trait::async_trait;

use crate::error::DataAccessError;
use crate::survey::{QueryParams, SurveyCatalog, SurveyInfo, SurveyRecord};

pub use http::HttpDatabase;

/// Read access to the survey database.
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Parent surveys and the surveys under each.
    async fn surveys(&self) -> Result<SurveyCatalog, DataAccessError>;

    /// Pointings matching `params`, each with its processing status resolved.
    async fn query(&self, params: &QueryParams) -> Result<Vec<SurveyRecord>, DataAccessError>;

    /// Band information for a survey; `None` when the survey has no entry.
    async fn survey_info(&self, survey: &str) -> Result<Option<SurveyInfo>, DataAccessError>;
}
