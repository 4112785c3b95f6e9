//! REST client for the survey database.
//!
//! Every endpoint is a `GET` carrying a Mongo-style JSON filter in the body
//! and answering with a JSON array of matching documents.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::DatabaseAdapter;
use crate::config::DatabaseConfig;
use crate::error::DataAccessError;
use crate::survey::query::{job_filter, survey_filter};
use crate::survey::{
    ProcessingStatus, QueryParams, RecordId, SurveyCatalog, SurveyInfo, SurveyRecord,
};

const SURVEY_ENDPOINT: &str = "survey";
const SURVEY_SEARCH_ENDPOINT: &str = "survey/search_data";
const POINTING_SEARCH_ENDPOINT: &str = "data/search_data";

#[derive(Debug, Deserialize)]
struct SurveyRow {
    survey: String,
    parent_survey: String,
}

#[derive(Debug, Deserialize)]
struct SurveyInfoRow {
    survey: Option<String>,
    f_low: f64,
    f_hi: f64,
}

#[derive(Debug, Deserialize)]
struct PointingRow {
    #[serde(rename = "_id")]
    id: Value,
    start_date_time: f64,
    ra_j: f64,
    dec_j: f64,
    #[serde(default)]
    source_name: Option<String>,
}

impl PointingRow {
    fn record_id(&self) -> RecordId {
        match &self.id {
            Value::String(s) => RecordId::new(s.clone()),
            // ObjectId-style `{"$oid": "..."}` documents.
            Value::Object(map) => match map.get("$oid").and_then(Value::as_str) {
                Some(oid) => RecordId::new(oid),
                None => RecordId::new(self.id.to_string()),
            },
            other => RecordId::new(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JobRow {
    #[serde(default)]
    completed: bool,
}

/// Survey database reached over HTTP.
pub struct HttpDatabase {
    http_client: Client,
    base_url: String,
    token: Option<String>,
    status_endpoint: String,
}

impl HttpDatabase {
    /// Creates a client for the database described by `config`.
    pub fn new(config: &DatabaseConfig) -> Result<Self, DataAccessError> {
        let base_url = config.base_url();
        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DataAccessError::Connection {
                url: base_url.clone(),
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            base_url,
            token: config.token.clone(),
            status_endpoint: config.status_endpoint.trim_matches('/').to_string(),
        })
    }

    /// Points the client at a different base URL (test servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.base_url = base_url;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn search<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        filter: Option<&Value>,
    ) -> Result<Vec<T>, DataAccessError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self.http_client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(filter) = filter {
            request = request.json(filter);
        }

        debug!(endpoint, "Querying survey database");
        let response = request
            .send()
            .await
            .map_err(|e| DataAccessError::Connection {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DataAccessError::Status {
                endpoint: endpoint.to_string(),
                code: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| DataAccessError::Connection {
                url: url.clone(),
                message: e.to_string(),
            })?;
        serde_json::from_str(&body).map_err(|e| DataAccessError::Schema {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    async fn status_of(&self, id: &RecordId) -> Result<ProcessingStatus, DataAccessError> {
        let jobs: Vec<JobRow> = self
            .search(&self.status_endpoint, Some(&job_filter(id.as_str())))
            .await?;
        Ok(match jobs.first() {
            None => ProcessingStatus::Unprocessed,
            Some(job) if job.completed => ProcessingStatus::Completed,
            Some(_) => ProcessingStatus::Active,
        })
    }
}

#[async_trait]
impl DatabaseAdapter for HttpDatabase {
    async fn surveys(&self) -> Result<SurveyCatalog, DataAccessError> {
        let rows: Vec<SurveyRow> = self.search(SURVEY_ENDPOINT, None).await?;
        let catalog =
            SurveyCatalog::from_pairs(rows.into_iter().map(|r| (r.parent_survey, r.survey)));
        info!(parents = catalog.parents().len(), "Survey catalog loaded");
        Ok(catalog)
    }

    async fn query(&self, params: &QueryParams) -> Result<Vec<SurveyRecord>, DataAccessError> {
        if params.survey.trim().is_empty() {
            return Err(DataAccessError::InvalidQuery(
                "no survey selected".to_string(),
            ));
        }

        let rows: Vec<PointingRow> = self
            .search(POINTING_SEARCH_ENDPOINT, Some(&params.pointing_filter()))
            .await?;
        let fetched = rows.len();

        let mut records = Vec::new();
        for row in rows
            .into_iter()
            .filter(|r| params.coordinates.contains(r.ra_j, r.dec_j))
        {
            let id = row.record_id();
            let status = self.status_of(&id).await?;
            let mut record = SurveyRecord::new(id, row.start_date_time, row.ra_j, row.dec_j)
                .with_status(status);
            if let Some(source) = row.source_name {
                record = record.with_source(source);
            }
            records.push(record);
        }

        info!(
            survey = %params.survey,
            fetched,
            kept = records.len(),
            "Pointing query complete"
        );
        Ok(records)
    }

    async fn survey_info(&self, survey: &str) -> Result<Option<SurveyInfo>, DataAccessError> {
        let rows: Vec<SurveyInfoRow> = self
            .search(SURVEY_SEARCH_ENDPOINT, Some(&survey_filter(survey)))
            .await?;
        Ok(rows.into_iter().next().map(|row| SurveyInfo {
            survey: row.survey.unwrap_or_else(|| survey.to_string()),
            f_low: row.f_low,
            f_hi: row.f_hi,
        }))
    }
}
