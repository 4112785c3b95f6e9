//! Application state owned by the shell and handed to the controller.

use crate::launcher::{LaunchHandle, LaunchOptions};
use crate::survey::{QueryParams, SurveyCatalog, SurveySummary};
use crate::view::{QueryForm, SelectionView};

/// Which screen the shell shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Query,
    Results,
}

/// Severity of a status line message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One-line message under the main panes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub severity: Severity,
    pub text: String,
}

/// Everything the front-end knows between events.
#[derive(Debug)]
pub struct AppState {
    pub screen: Screen,
    pub form: QueryForm,
    pub view: SelectionView,
    /// Figures for the result currently rendered in `view`.
    pub summary: Option<SurveySummary>,
    /// Parameters of the result currently rendered in `view`.
    pub last_query: Option<QueryParams>,
    pub launch_options: LaunchOptions,
    pub last_launch: Option<LaunchHandle>,
    pub status: Option<StatusLine>,
    /// Modal message; any key dismisses it.
    pub popup: Option<StatusLine>,
    /// File name being typed for a sky map export.
    pub save_prompt: Option<String>,
    pub show_help: bool,
    pub show_skymap: bool,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(catalog: SurveyCatalog, show_skymap: bool, launch_options: LaunchOptions) -> Self {
        Self {
            screen: Screen::Query,
            form: QueryForm::new(catalog, show_skymap),
            view: SelectionView::new(),
            summary: None,
            last_query: None,
            launch_options,
            last_launch: None,
            status: None,
            popup: None,
            save_prompt: None,
            show_help: false,
            show_skymap,
            should_quit: false,
        }
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.set_status(Severity::Info, text);
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.set_status(Severity::Warning, text);
    }

    /// Errors go to both the status line and a popup.
    pub fn error(&mut self, text: impl Into<String>) {
        let line = StatusLine {
            severity: Severity::Error,
            text: text.into(),
        };
        self.status = Some(line.clone());
        self.popup = Some(line);
    }

    fn set_status(&mut self, severity: Severity, text: impl Into<String>) {
        self.status = Some(StatusLine {
            severity,
            text: text.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_raises_popup() {
        let mut state = AppState::new(SurveyCatalog::default(), true, LaunchOptions::default());
        state.info("ready");
        assert!(state.popup.is_none());

        state.error("database down");
        assert_eq!(
            state.popup.as_ref().map(|p| p.severity),
            Some(Severity::Error)
        );
        assert_eq!(
            state.status.as_ref().map(|s| s.text.as_str()),
            Some("database down")
        );
    }
}
