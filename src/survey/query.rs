//! Query parameters for selecting pointings from a survey.
//!
//! The database filters on survey, observation date and source; the sky
//! position cut is evaluated on the returned pointings.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Earliest MJD considered when the lower bound is left blank.
pub const DEFAULT_MJD_LOW: f64 = 45000.0;
/// Latest MJD considered when the upper bound is left blank.
pub const DEFAULT_MJD_HIGH: f64 = 63000.0;
/// A disk this wide covers the whole sky.
pub const WHOLE_SKY_RADIUS_DEG: f64 = 1000.0;

/// Sky position cut.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CoordinateFilter {
    /// Inclusive right ascension and declination intervals (degrees).
    Range {
        ra_low: f64,
        ra_high: f64,
        dec_low: f64,
        dec_high: f64,
    },
    /// Pointings within `radius` degrees of a center.
    Disk {
        center_ra: f64,
        center_dec: f64,
        radius: f64,
    },
}

impl Default for CoordinateFilter {
    fn default() -> Self {
        CoordinateFilter::Range {
            ra_low: 0.0,
            ra_high: 360.0,
            dec_low: -90.0,
            dec_high: 90.0,
        }
    }
}

impl CoordinateFilter {
    /// Whole-sky disk used when a disk center is missing.
    pub fn whole_sky_disk() -> Self {
        CoordinateFilter::Disk {
            center_ra: 180.0,
            center_dec: 0.0,
            radius: WHOLE_SKY_RADIUS_DEG,
        }
    }

    pub fn contains(&self, ra: f64, dec: f64) -> bool {
        match *self {
            CoordinateFilter::Range {
                ra_low,
                ra_high,
                dec_low,
                dec_high,
            } => ra >= ra_low && ra <= ra_high && dec >= dec_low && dec <= dec_high,
            CoordinateFilter::Disk {
                center_ra,
                center_dec,
                radius,
            } => angular_separation(center_ra, center_dec, ra, dec) <= radius,
        }
    }
}

/// Great-circle separation between two sky positions, all in degrees.
pub fn angular_separation(ra1: f64, dec1: f64, ra2: f64, dec2: f64) -> f64 {
    let (ra1, dec1, ra2, dec2) = (
        ra1.to_radians(),
        dec1.to_radians(),
        ra2.to_radians(),
        dec2.to_radians(),
    );
    let half_ddec = ((dec2 - dec1) / 2.0).sin();
    let half_dra = ((ra2 - ra1) / 2.0).sin();
    let h = half_ddec * half_ddec + dec1.cos() * dec2.cos() * half_dra * half_dra;
    (2.0 * h.sqrt().min(1.0).asin()).to_degrees()
}

/// Everything needed to fetch one batch of pointings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    pub parent_survey: String,
    pub survey: String,
    pub mjd_low: f64,
    pub mjd_high: f64,
    /// Restrict to observations of this source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub coordinates: CoordinateFilter,
}

impl QueryParams {
    pub fn new(parent_survey: impl Into<String>, survey: impl Into<String>) -> Self {
        Self {
            parent_survey: parent_survey.into(),
            survey: survey.into(),
            mjd_low: DEFAULT_MJD_LOW,
            mjd_high: DEFAULT_MJD_HIGH,
            source: None,
            coordinates: CoordinateFilter::default(),
        }
    }

    pub fn with_mjd_range(mut self, low: f64, high: f64) -> Self {
        self.mjd_low = low;
        self.mjd_high = high;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_coordinates(mut self, coordinates: CoordinateFilter) -> Self {
        self.coordinates = coordinates;
        self
    }

    /// Body sent to the pointing search endpoint.
    pub fn pointing_filter(&self) -> Value {
        let mut filter = json!({
            "start_date_time": {"$gte": self.mjd_low, "$lte": self.mjd_high},
            "survey": {"$eq": self.survey},
        });
        if let Some(source) = &self.source {
            filter["source_name"] = json!({"$eq": source});
        }
        filter
    }
}

/// Body sent to the survey search endpoint.
pub fn survey_filter(survey: &str) -> Value {
    json!({"survey": {"$eq": survey}})
}

/// Body used to look up the job entry for one pointing.
pub fn job_filter(id: &str) -> Value {
    json!({"dataID": {"$eq": id}})
}
