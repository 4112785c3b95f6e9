//! Aggregate figures shown in the survey information pane.

use super::types::{ProcessingStatus, SurveyInfo, SurveyRecord};

/// Snapshot of one query result, computed when it is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveySummary {
    pub survey: String,
    pub parent_survey: String,
    pub pointings: usize,
    pub mjd_range: Option<(f64, f64)>,
    /// Observing band (MHz), when the survey entry was found.
    pub frequency_range: Option<(f64, f64)>,
    pub completed: usize,
    pub active: usize,
}

impl SurveySummary {
    pub fn compute(
        parent_survey: &str,
        survey: &str,
        records: &[SurveyRecord],
        info: Option<&SurveyInfo>,
    ) -> Self {
        let mjd_range = records.iter().fold(None, |acc, r| match acc {
            None => Some((r.mjd, r.mjd)),
            Some((lo, hi)) => Some((f64::min(lo, r.mjd), f64::max(hi, r.mjd))),
        });
        let count = |status| records.iter().filter(|r| r.status == status).count();

        Self {
            survey: survey.to_string(),
            parent_survey: parent_survey.to_string(),
            pointings: records.len(),
            mjd_range,
            frequency_range: info.map(|i| (i.f_low, i.f_hi)),
            completed: count(ProcessingStatus::Completed),
            active: count(ProcessingStatus::Active),
        }
    }

    pub fn unprocessed(&self) -> usize {
        self.pointings - self.completed - self.active
    }

    pub fn completed_percent(&self) -> f64 {
        percent(self.completed, self.pointings)
    }

    pub fn active_percent(&self) -> f64 {
        percent(self.active, self.pointings)
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}
