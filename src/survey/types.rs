//! Core record types shared by the database adapter, view and controller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque identifier of a survey record, as issued by the database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Processing state of a pointing as reported by the job records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    /// No job has ever been submitted for this pointing.
    Unprocessed,
    /// A job was submitted and has not completed.
    Active,
    /// A job was submitted and finished.
    Completed,
}

impl ProcessingStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            ProcessingStatus::Unprocessed => "Unprocessed",
            ProcessingStatus::Active => "Active",
            ProcessingStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A single pointing from the survey database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub id: RecordId,
    /// Target source name, when the observation was of a specific source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    /// Start of the observation (MJD).
    pub mjd: f64,
    /// Right ascension, J2000, degrees.
    pub ra: f64,
    /// Declination, J2000, degrees.
    pub dec: f64,
    pub status: ProcessingStatus,
}

impl SurveyRecord {
    pub fn new(id: impl Into<RecordId>, mjd: f64, ra: f64, dec: f64) -> Self {
        Self {
            id: id.into(),
            source_name: None,
            mjd,
            ra,
            dec,
            status: ProcessingStatus::Unprocessed,
        }
    }

    pub fn with_status(mut self, status: ProcessingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_name = Some(source.into());
        self
    }

    /// Only pointings that were never submitted can be handed to the pipeline.
    pub fn needs_processing(&self) -> bool {
        self.status == ProcessingStatus::Unprocessed
    }
}

/// Observing band of a survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyInfo {
    pub survey: String,
    /// Lower edge of the band (MHz).
    pub f_low: f64,
    /// Upper edge of the band (MHz).
    pub f_hi: f64,
}

/// Parent surveys and the surveys grouped under each, both sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveyCatalog {
    groups: BTreeMap<String, Vec<String>>,
}

impl SurveyCatalog {
    /// Builds a catalog from `(parent_survey, survey)` pairs.
    ///
    /// Duplicate pairs collapse; surveys under each parent are sorted.
    pub fn from_pairs<I, P, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<String>,
        S: Into<String>,
    {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (parent, survey) in pairs {
            let surveys = groups.entry(parent.into()).or_default();
            let survey = survey.into();
            if !surveys.contains(&survey) {
                surveys.push(survey);
            }
        }
        for surveys in groups.values_mut() {
            surveys.sort();
        }
        Self { groups }
    }

    pub fn parents(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    /// Surveys under `parent`; empty when the parent is unknown.
    pub fn surveys(&self, parent: &str) -> &[String] {
        self.groups.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
