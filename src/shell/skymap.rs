//! Sky map of the rendered pointings.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine, Points};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ExportError;
use crate::survey::{RecordId, SurveyRecord};

/// One plotted pointing in a saved sky map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkymapPoint {
    pub id: RecordId,
    pub ra: f64,
    pub dec: f64,
    /// Horizontal map coordinate, RA wrapped into (-180, 180].
    pub x: f64,
    pub y: f64,
}

/// Saved sky map document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkymapExport {
    pub survey: String,
    pub points: Vec<SkymapPoint>,
}

impl SkymapExport {
    pub fn new(survey: &str, records: &[SurveyRecord]) -> Self {
        let points = records
            .iter()
            .zip(plot_points(records))
            .map(|(r, (x, y))| SkymapPoint {
                id: r.id.clone(),
                ra: r.ra,
                dec: r.dec,
                x,
                y,
            })
            .collect();
        Self {
            survey: survey.to_string(),
            points,
        }
    }
}

/// Wraps right ascension into (-180, 180] so the map is centred on RA 0.
pub fn wrap_ra(ra: f64) -> f64 {
    let mut ra = ra.rem_euclid(360.0);
    if ra > 180.0 {
        ra -= 360.0;
    }
    ra
}

/// Canvas coordinates `(x, y)` for each record.
pub fn plot_points(records: &[SurveyRecord]) -> Vec<(f64, f64)> {
    records.iter().map(|r| (wrap_ra(r.ra), r.dec)).collect()
}

/// Writes the plotted pointings to `path` as JSON; returns the point count.
pub fn save_skymap(
    path: &Path,
    survey: &str,
    records: &[SurveyRecord],
) -> Result<usize, ExportError> {
    let export = SkymapExport::new(survey, records);
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &export)?;
    writer.flush()?;

    info!(path = %path.display(), survey, points = export.points.len(), "Sky map saved");
    Ok(export.points.len())
}

pub fn draw_skymap(f: &mut Frame, records: &[SurveyRecord], survey: &str, area: Rect) {
    let points = plot_points(records);
    let canvas = Canvas::default()
        .block(
            Block::default()
                .title(format!(" SKYMAP: {} ", survey))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .marker(Marker::Braille)
        .x_bounds([-180.0, 180.0])
        .y_bounds([-90.0, 90.0])
        .paint(move |ctx| {
            // Equator and prime meridian.
            ctx.draw(&CanvasLine {
                x1: -180.0,
                y1: 0.0,
                x2: 180.0,
                y2: 0.0,
                color: Color::DarkGray,
            });
            ctx.draw(&CanvasLine {
                x1: 0.0,
                y1: -90.0,
                x2: 0.0,
                y2: 90.0,
                color: Color::DarkGray,
            });
            ctx.layer();
            ctx.draw(&Points {
                coords: &points,
                color: Color::Red,
            });
            ctx.print(-178.0, 85.0, Span::styled("RA -180", Style::default().fg(Color::DarkGray)));
            ctx.print(150.0, 85.0, Span::styled("RA 180", Style::default().fg(Color::DarkGray)));
        });
    f.render_widget(canvas, area);
}
