//! Query form: survey choice, date and sky cuts, sky map toggle.
//!
//! Text fields are parsed leniently. A blank field takes its default; a
//! field that does not parse takes its default and is reported in the log.

use std::collections::HashMap;

use tracing::warn;

use crate::error::DataAccessError;
use crate::survey::query::{DEFAULT_MJD_HIGH, DEFAULT_MJD_LOW, WHOLE_SKY_RADIUS_DEG};
use crate::survey::{CoordinateFilter, QueryParams, SurveyCatalog};

/// How the sky position cut is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateMode {
    #[default]
    Range,
    Disk,
}

/// Inputs of the form, in focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    ParentSurvey,
    Survey,
    MjdLow,
    MjdHigh,
    Source,
    CoordinateMode,
    RaLow,
    RaHigh,
    DecLow,
    DecHigh,
    CenterRa,
    CenterDec,
    Radius,
    ShowSkymap,
}

impl FormField {
    pub fn label(&self) -> &'static str {
        match self {
            FormField::ParentSurvey => "Parent survey",
            FormField::Survey => "Survey",
            FormField::MjdLow => "MJD low",
            FormField::MjdHigh => "MJD high",
            FormField::Source => "Source",
            FormField::CoordinateMode => "Coordinates",
            FormField::RaLow => "Right ascension low",
            FormField::RaHigh => "Right ascension high",
            FormField::DecLow => "Declination low",
            FormField::DecHigh => "Declination high",
            FormField::CenterRa => "Central right ascension",
            FormField::CenterDec => "Central declination",
            FormField::Radius => "Radius (deg)",
            FormField::ShowSkymap => "Show skymap",
        }
    }

    pub fn is_text(&self) -> bool {
        !matches!(
            self,
            FormField::ParentSurvey
                | FormField::Survey
                | FormField::CoordinateMode
                | FormField::ShowSkymap
        )
    }
}

/// State of the query form.
#[derive(Debug, Clone)]
pub struct QueryForm {
    catalog: SurveyCatalog,
    parent_idx: usize,
    survey_idx: usize,
    text: HashMap<FormField, String>,
    coordinate_mode: CoordinateMode,
    show_skymap: bool,
    focus: usize,
}

impl QueryForm {
    pub fn new(catalog: SurveyCatalog, show_skymap: bool) -> Self {
        Self {
            catalog,
            parent_idx: 0,
            survey_idx: 0,
            text: HashMap::new(),
            coordinate_mode: CoordinateMode::default(),
            show_skymap,
            focus: 0,
        }
    }

    /// Swaps in a freshly loaded catalog, resetting both choices.
    pub fn set_catalog(&mut self, catalog: SurveyCatalog) {
        self.catalog = catalog;
        self.parent_idx = 0;
        self.survey_idx = 0;
    }

    pub fn catalog(&self) -> &SurveyCatalog {
        &self.catalog
    }

    /// Fields currently shown, in focus order.
    pub fn fields(&self) -> Vec<FormField> {
        let mut fields = vec![
            FormField::ParentSurvey,
            FormField::Survey,
            FormField::MjdLow,
            FormField::MjdHigh,
            FormField::Source,
            FormField::CoordinateMode,
        ];
        match self.coordinate_mode {
            CoordinateMode::Range => fields.extend([
                FormField::RaLow,
                FormField::RaHigh,
                FormField::DecLow,
                FormField::DecHigh,
            ]),
            CoordinateMode::Disk => fields.extend([
                FormField::CenterRa,
                FormField::CenterDec,
                FormField::Radius,
            ]),
        }
        fields.push(FormField::ShowSkymap);
        fields
    }

    pub fn focused(&self) -> FormField {
        let fields = self.fields();
        fields[self.focus.min(fields.len() - 1)]
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.fields().len();
    }

    pub fn focus_previous(&mut self) {
        let len = self.fields().len();
        self.focus = (self.focus + len - 1) % len;
    }

    pub fn parent_survey(&self) -> Option<&str> {
        self.catalog.parents().get(self.parent_idx).copied()
    }

    pub fn survey(&self) -> Option<&str> {
        let parent = self.parent_survey()?;
        self.catalog
            .surveys(parent)
            .get(self.survey_idx)
            .map(String::as_str)
    }

    pub fn coordinate_mode(&self) -> CoordinateMode {
        self.coordinate_mode
    }

    pub fn show_skymap(&self) -> bool {
        self.show_skymap
    }

    /// Raw text of a text field.
    pub fn value(&self, field: FormField) -> &str {
        self.text.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Display value of any field.
    pub fn display_value(&self, field: FormField) -> String {
        match field {
            FormField::ParentSurvey => self.parent_survey().unwrap_or("-").to_string(),
            FormField::Survey => self.survey().unwrap_or("-").to_string(),
            FormField::CoordinateMode => match self.coordinate_mode {
                CoordinateMode::Range => "Range".to_string(),
                CoordinateMode::Disk => "Disk".to_string(),
            },
            FormField::ShowSkymap => String::from(if self.show_skymap { "yes" } else { "no" }),
            text => self.value(text).to_string(),
        }
    }

    pub fn set_value(&mut self, field: FormField, value: impl Into<String>) {
        if field.is_text() {
            self.text.insert(field, value.into());
        }
    }

    pub fn input_char(&mut self, c: char) {
        let field = self.focused();
        if field.is_text() {
            self.text.entry(field).or_default().push(c);
        }
    }

    pub fn backspace(&mut self) {
        let field = self.focused();
        if let Some(value) = self.text.get_mut(&field) {
            value.pop();
        }
    }

    /// Moves a choice or toggle field; `forward` picks the next option.
    pub fn cycle(&mut self, forward: bool) {
        match self.focused() {
            FormField::ParentSurvey => {
                let len = self.catalog.parents().len();
                if len > 0 {
                    self.parent_idx = step(self.parent_idx, len, forward);
                    // A new parent always starts at its first survey.
                    self.survey_idx = 0;
                }
            }
            FormField::Survey => {
                let len = self
                    .parent_survey()
                    .map(|p| self.catalog.surveys(p).len())
                    .unwrap_or(0);
                if len > 0 {
                    self.survey_idx = step(self.survey_idx, len, forward);
                }
            }
            FormField::CoordinateMode => {
                self.coordinate_mode = match self.coordinate_mode {
                    CoordinateMode::Range => CoordinateMode::Disk,
                    CoordinateMode::Disk => CoordinateMode::Range,
                };
            }
            FormField::ShowSkymap => self.show_skymap = !self.show_skymap,
            _ => {}
        }
    }

    /// Builds query parameters from the current inputs.
    pub fn to_params(&self) -> Result<QueryParams, DataAccessError> {
        let (parent, survey) = match (self.parent_survey(), self.survey()) {
            (Some(p), Some(s)) => (p, s),
            _ => {
                return Err(DataAccessError::InvalidQuery(
                    "no survey selected; reload the catalog with Ctrl-R".to_string(),
                ))
            }
        };

        let mjd_low = self.number(FormField::MjdLow).unwrap_or(DEFAULT_MJD_LOW);
        let mjd_high = self.number(FormField::MjdHigh).unwrap_or(DEFAULT_MJD_HIGH);

        let coordinates = match self.coordinate_mode {
            CoordinateMode::Range => CoordinateFilter::Range {
                ra_low: self.number(FormField::RaLow).unwrap_or(0.0),
                ra_high: self.number(FormField::RaHigh).unwrap_or(360.0),
                dec_low: self.number(FormField::DecLow).unwrap_or(-90.0),
                dec_high: self.number(FormField::DecHigh).unwrap_or(90.0),
            },
            CoordinateMode::Disk => {
                let center_ra = self.number(FormField::CenterRa);
                let center_dec = self.number(FormField::CenterDec);
                let radius = self.number(FormField::Radius);
                match (center_ra, center_dec) {
                    (Some(center_ra), Some(center_dec)) => CoordinateFilter::Disk {
                        center_ra,
                        center_dec,
                        radius: radius.unwrap_or(WHOLE_SKY_RADIUS_DEG),
                    },
                    _ => CoordinateFilter::whole_sky_disk(),
                }
            }
        };

        let mut params = QueryParams::new(parent, survey)
            .with_mjd_range(mjd_low, mjd_high)
            .with_coordinates(coordinates);
        let source = self.value(FormField::Source).trim();
        if !source.is_empty() {
            params = params.with_source(source);
        }
        Ok(params)
    }

    fn number(&self, field: FormField) -> Option<f64> {
        parse_number(field.label(), self.value(field))
    }
}

/// Parses a numeric field; blank is `None`, garbage is `None` plus a warning.
pub fn parse_number(label: &str, raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            warn!(field = label, value = raw, "Invalid value, using default");
            None
        }
    }
}

fn step(idx: usize, len: usize, forward: bool) -> usize {
    if forward {
        (idx + 1) % len
    } else {
        (idx + len - 1) % len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> SurveyCatalog {
        SurveyCatalog::from_pairs(vec![
            ("GBNCC", "gbncc-1"),
            ("GBNCC", "gbncc-2"),
            ("PALFA", "palfa-inner"),
        ])
    }

    fn focus_on(form: &mut QueryForm, field: FormField) {
        while form.focused() != field {
            form.focus_next();
        }
    }

    #[test]
    fn test_blank_form_uses_defaults() {
        let form = QueryForm::new(catalog(), true);
        let params = form.to_params().expect("params");
        assert_eq!(params.parent_survey, "GBNCC");
        assert_eq!(params.survey, "gbncc-1");
        assert_eq!(params.mjd_low, DEFAULT_MJD_LOW);
        assert_eq!(params.mjd_high, DEFAULT_MJD_HIGH);
        assert_eq!(params.source, None);
        assert_eq!(params.coordinates, CoordinateFilter::default());
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let mut form = QueryForm::new(catalog(), true);
        form.set_value(FormField::MjdLow, "55000.5");
        form.set_value(FormField::MjdHigh, "soon");
        form.set_value(FormField::Source, "  J1713+0747 ");
        let params = form.to_params().expect("params");
        assert_eq!(params.mjd_low, 55000.5);
        assert_eq!(params.mjd_high, DEFAULT_MJD_HIGH);
        assert_eq!(params.source.as_deref(), Some("J1713+0747"));
    }

    #[test]
    fn test_parent_change_resets_survey() {
        let mut form = QueryForm::new(catalog(), true);
        focus_on(&mut form, FormField::Survey);
        form.cycle(true);
        assert_eq!(form.survey(), Some("gbncc-2"));

        focus_on(&mut form, FormField::ParentSurvey);
        form.cycle(true);
        assert_eq!(form.parent_survey(), Some("PALFA"));
        assert_eq!(form.survey(), Some("palfa-inner"));
    }

    #[test]
    fn test_disk_mode() {
        let mut form = QueryForm::new(catalog(), true);
        focus_on(&mut form, FormField::CoordinateMode);
        form.cycle(true);
        assert_eq!(form.coordinate_mode(), CoordinateMode::Disk);
        assert!(form.fields().contains(&FormField::Radius));
        assert!(!form.fields().contains(&FormField::RaLow));

        form.set_value(FormField::CenterRa, "83.6");
        form.set_value(FormField::CenterDec, "22.0");
        form.set_value(FormField::Radius, "2");
        assert_eq!(
            form.to_params().expect("params").coordinates,
            CoordinateFilter::Disk {
                center_ra: 83.6,
                center_dec: 22.0,
                radius: 2.0
            }
        );
    }

    #[test]
    fn test_disk_without_center_covers_sky() {
        let mut form = QueryForm::new(catalog(), true);
        focus_on(&mut form, FormField::CoordinateMode);
        form.cycle(false);
        form.set_value(FormField::CenterRa, "83.6");
        form.set_value(FormField::Radius, "2");
        assert_eq!(
            form.to_params().expect("params").coordinates,
            CoordinateFilter::whole_sky_disk()
        );
    }

    #[test]
    fn test_typing_edits_focused_text_field() {
        let mut form = QueryForm::new(catalog(), true);
        focus_on(&mut form, FormField::MjdLow);
        for c in "5800x".chars() {
            form.input_char(c);
        }
        form.backspace();
        assert_eq!(form.value(FormField::MjdLow), "5800");

        focus_on(&mut form, FormField::ParentSurvey);
        form.input_char('z');
        assert_eq!(form.display_value(FormField::ParentSurvey), "GBNCC");
    }

    #[test]
    fn test_focus_wraps() {
        let mut form = QueryForm::new(catalog(), false);
        form.focus_previous();
        assert_eq!(form.focused(), FormField::ShowSkymap);
        form.cycle(true);
        assert!(form.show_skymap());
        form.focus_next();
        assert_eq!(form.focused(), FormField::ParentSurvey);
    }

    #[test]
    fn test_empty_catalog_cannot_query() {
        let form = QueryForm::new(SurveyCatalog::default(), true);
        assert!(matches!(
            form.to_params(),
            Err(DataAccessError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("x", ""), None);
        assert_eq!(parse_number("x", " 12.5 "), Some(12.5));
        assert_eq!(parse_number("x", "NaN"), None);
        assert_eq!(parse_number("x", "abc"), None);
    }
}
