//! Ratatui layout and widget rendering.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap,
};
use ratatui::Frame;

use super::skymap::draw_skymap;
use crate::state::{AppState, Screen, Severity};
use crate::survey::{ProcessingStatus, SurveyRecord, SurveySummary};
use crate::view::{FormField, StatusFilter};

pub const HELP_TEXT: &str = "\
Mission Control finds pointings of a survey that need processing
and hands them to the pipeline launcher.

Query form
  Tab / Shift-Tab   move between fields
  Left / Right      change a choice or toggle
  Enter             run the query
  Ctrl-R            reload the survey catalog
  F1                this help
  Esc               quit

Results
  Up / Down, Home / End   move
  Space             select / unselect pointing
  a                 select every unprocessed pointing
  c                 clear selection
  Tab               cycle All / Unprocessed / Active / Completed
  l                 launch selected pointings
  r                 re-run the last query
  m                 show / hide sky map
  s                 save the sky map points to a JSON file
  b, Esc            back to the query form
  q                 quit";

/// Draw the whole screen.
pub fn draw(f: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(8),    // Main content
            Constraint::Length(3), // Status line
        ])
        .split(f.area());

    draw_header(f, state, chunks[0]);
    match state.screen {
        Screen::Query => draw_form(f, state, chunks[1]),
        Screen::Results => draw_results(f, state, chunks[1]),
    }
    draw_status(f, state, chunks[2]);

    if state.show_help {
        draw_overlay(f, " HELP ", HELP_TEXT, Color::Cyan);
    } else if let Some(file_name) = &state.save_prompt {
        let text = format!("File name: {}_\n\nEnter: save | Esc: cancel", file_name);
        draw_overlay(f, " SAVE SKYMAP ", &text, Color::Blue);
    } else if let Some(popup) = &state.popup {
        let color = severity_color(popup.severity);
        draw_overlay(f, " MESSAGE ", &format!("{}\n\n(press any key)", popup.text), color);
    }
}

fn draw_header(f: &mut Frame, state: &AppState, area: Rect) {
    let screen = match state.screen {
        Screen::Query => "Query",
        Screen::Results => "Results",
    };
    let mut spans = vec![
        Span::styled(
            " MISSION CONTROL ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" | {}", screen), Style::default().fg(Color::DarkGray)),
    ];
    if state.launch_options.dry_run {
        spans.push(Span::styled(" | DRY RUN", Style::default().fg(Color::Yellow)));
    }
    if state.screen == Screen::Results {
        spans.push(Span::styled(
            format!(" | selected: {}", state.view.selected_count()),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(header, area);
}

fn draw_form(f: &mut Frame, state: &AppState, area: Rect) {
    let form = &state.form;
    let focused = form.focused();

    let lines: Vec<Line> = form
        .fields()
        .into_iter()
        .map(|field| {
            let is_focused = field == focused;
            let label_style = if is_focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let value = form.display_value(field);
            let value = if field.is_text() {
                if is_focused {
                    format!("{}_", value)
                } else {
                    value
                }
            } else {
                format!("< {} >", value)
            };
            let marker = if is_focused { "> " } else { "  " };
            Line::from(vec![
                Span::styled(marker, label_style),
                Span::styled(format!("{:<26}", field.label()), label_style),
                Span::styled(value, Style::default().fg(Color::White)),
            ])
        })
        .collect();

    let hint = match focused {
        _ if form.catalog().is_empty() => "No surveys loaded; Ctrl-R to reload the catalog",
        FormField::ParentSurvey | FormField::Survey => "Left/Right to choose",
        FormField::CoordinateMode => "Left/Right to switch between Range and Disk",
        FormField::ShowSkymap => "Left/Right to toggle",
        _ => "Type a number or leave blank for the default",
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    let body = Paragraph::new(lines).block(
        Block::default()
            .title(" SELECT POINTINGS ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );
    f.render_widget(body, rows[0]);
    f.render_widget(
        Paragraph::new(Span::styled(
            format!(" {} | Enter: generate | F1: help", hint),
            Style::default().fg(Color::DarkGray),
        )),
        rows[1],
    );
}

fn draw_results(f: &mut Frame, state: &AppState, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(40), Constraint::Min(30)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(8)])
        .split(cols[0]);
    draw_summary(f, state.summary.as_ref(), left[0]);
    draw_detail(f, state.view.current(), left[1]);

    if state.show_skymap {
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(cols[1]);
        draw_records(f, state, right[0]);
        let survey = state.summary.as_ref().map(|s| s.survey.as_str()).unwrap_or("");
        draw_skymap(f, state.view.records(), survey, right[1]);
    } else {
        draw_records(f, state, cols[1]);
    }
}

/// Survey information pane.
fn draw_summary(f: &mut Frame, summary: Option<&SurveySummary>, area: Rect) {
    let lines = match summary {
        None => vec![Line::from("No query yet")],
        Some(s) => {
            let range = |r: Option<(f64, f64)>| match r {
                Some((lo, hi)) => format!("({}, {})", lo, hi),
                None => "-".to_string(),
            };
            vec![
                label_line("Survey", &s.survey),
                label_line("Parent survey", &s.parent_survey),
                label_line("MJD range", &range(s.mjd_range)),
                label_line("Frequency range (MHz)", &range(s.frequency_range)),
                label_line("Pointings", &s.pointings.to_string()),
                label_line(
                    "Number processed",
                    &format!("{} ({:.2}%)", s.completed, s.completed_percent()),
                ),
                label_line(
                    "Number active",
                    &format!("{} ({:.2}%)", s.active, s.active_percent()),
                ),
            ]
        }
    };

    let pane = Paragraph::new(lines).block(
        Block::default()
            .title(" SURVEY INFORMATION ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );
    f.render_widget(pane, area);
}

fn label_line<'a>(label: &'a str, value: &str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Style::default().fg(Color::DarkGray)),
        Span::styled(value.to_string(), Style::default().fg(Color::White)),
    ])
}

/// Pointing under the cursor.
fn draw_detail(f: &mut Frame, record: Option<&SurveyRecord>, area: Rect) {
    let lines = match record {
        None => vec![Line::from("-")],
        Some(r) => vec![
            label_line("ID", r.id.as_str()),
            label_line("MJD", &r.mjd.to_string()),
            label_line("RA", &r.ra.to_string()),
            label_line("Dec", &r.dec.to_string()),
            Line::from(vec![
                Span::styled("Status: ", Style::default().fg(Color::DarkGray)),
                Span::styled(r.status.to_string(), status_style(r.status)),
            ]),
        ],
    };
    let pane =
        Paragraph::new(lines).block(Block::default().title(" POINTING ").borders(Borders::ALL));
    f.render_widget(pane, area);
}

fn draw_records(f: &mut Frame, state: &AppState, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);

    let filter = state.view.filter();
    let selected_tab = StatusFilter::ALL.iter().position(|f| *f == filter).unwrap_or(0);
    let tabs = Tabs::new(StatusFilter::ALL.iter().map(|f| f.title()))
        .select(selected_tab)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, rows[0]);

    let header = Row::new(vec!["", "ID", "MJD", "RA", "Dec", "Status"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let body: Vec<Row> = state
        .view
        .visible()
        .into_iter()
        .map(|r| {
            let mark = if state.view.is_selected(&r.id) { "[x]" } else { "[ ]" };
            Row::new(vec![
                Cell::from(mark),
                Cell::from(r.id.to_string()).style(Style::default().fg(Color::Cyan)),
                Cell::from(format!("{:.4}", r.mjd)),
                Cell::from(format!("{:.3}", r.ra)),
                Cell::from(format!("{:.3}", r.dec)),
                Cell::from(r.status.to_string()).style(status_style(r.status)),
            ])
        })
        .collect();

    let table = Table::new(
        body,
        [
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(11),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(11),
        ],
    )
    .header(header)
    .row_highlight_style(Style::default().bg(Color::DarkGray))
    .block(
        Block::default()
            .title(format!(" {} ", filter.title().to_uppercase()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );

    let mut table_state = TableState::default();
    if state.view.current().is_some() {
        table_state.select(Some(state.view.cursor()));
    }
    f.render_stateful_widget(table, rows[1], &mut table_state);
}

fn draw_status(f: &mut Frame, state: &AppState, area: Rect) {
    let line = match &state.status {
        Some(status) => Line::from(Span::styled(
            status.text.clone(),
            Style::default().fg(severity_color(status.severity)),
        )),
        None => Line::from(Span::styled(
            "F1 / ? for help",
            Style::default().fg(Color::DarkGray),
        )),
    };
    let bar = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(bar, area);
}

fn draw_overlay(f: &mut Frame, title: &str, text: &str, color: Color) {
    let area = centered_rect(70, 70, f.area());
    f.render_widget(Clear, area);
    let body = Paragraph::new(text.to_string())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );
    f.render_widget(body, area);
}

fn status_style(status: ProcessingStatus) -> Style {
    match status {
        ProcessingStatus::Unprocessed => Style::default().fg(Color::Green),
        ProcessingStatus::Active => Style::default().fg(Color::Yellow),
        ProcessingStatus::Completed => Style::default().fg(Color::DarkGray),
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::Green,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
    }
}

/// Rectangle of `percent_x` x `percent_y` centred in `area`.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::LaunchOptions;
    use crate::survey::SurveyCatalog;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn state() -> AppState {
        AppState::new(
            SurveyCatalog::from_pairs(vec![("GBNCC", "gbncc-1")]),
            false,
            LaunchOptions::default(),
        )
    }

    #[test]
    fn test_form_renders_fields() {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).expect("terminal");
        let state = state();
        terminal.draw(|f| draw(f, &state)).expect("draw");

        let text = screen_text(&terminal);
        assert!(text.contains("MISSION CONTROL"));
        assert!(text.contains("Parent survey"));
        assert!(text.contains("GBNCC"));
        assert!(text.contains("Right ascension low"));
    }

    #[test]
    fn test_results_render_rows_and_marks() {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).expect("terminal");
        let mut state = state();
        state.screen = Screen::Results;
        state.view.render(vec![
            SurveyRecord::new("ptg-001", 58000.0, 10.0, 20.0),
            SurveyRecord::new("ptg-002", 58001.0, 11.0, 21.0)
                .with_status(ProcessingStatus::Active),
        ]);
        state.view.select(&"ptg-002".into());
        terminal.draw(|f| draw(f, &state)).expect("draw");

        let text = screen_text(&terminal);
        assert!(text.contains("ptg-001"));
        assert!(text.contains("[x]"));
        assert!(text.contains("selected: 1"));
        assert!(text.contains("SURVEY INFORMATION"));
    }

    #[test]
    fn test_form_hints_reload_without_catalog() {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).expect("terminal");
        let state = AppState::new(SurveyCatalog::default(), false, LaunchOptions::default());
        terminal.draw(|f| draw(f, &state)).expect("draw");
        assert!(screen_text(&terminal).contains("No surveys loaded"));
    }

    #[test]
    fn test_save_prompt_overlay() {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).expect("terminal");
        let mut state = state();
        state.screen = Screen::Results;
        state.save_prompt = Some("map.json".to_string());
        terminal.draw(|f| draw(f, &state)).expect("draw");
        let text = screen_text(&terminal);
        assert!(text.contains("SAVE SKYMAP"));
        assert!(text.contains("map.json_"));
    }

    #[test]
    fn test_help_overlay() {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).expect("terminal");
        let mut state = state();
        state.show_help = true;
        terminal.draw(|f| draw(f, &state)).expect("draw");
        assert!(screen_text(&terminal).contains("HELP"));
    }

    #[test]
    fn test_centered_rect_is_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(50, 50, outer);
        assert!(inner.x >= 25 && inner.width <= 50);
        assert!(inner.y >= 12 && inner.height <= 25);
    }
}
