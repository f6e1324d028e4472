//! Chart sinks for build trend series.
//!
//! The analyzer only hands over time-ordered `(timestamp, value)` series; how
//! they are drawn is up to the sink.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::BuildSummary;

pub const CHART_FILE: &str = "trend_charts.svg";

const PANEL_WIDTH: f64 = 560.0;
const PANEL_HEIGHT: f64 = 320.0;
const MARGIN: f64 = 50.0;

/// A chronological series of one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub title: String,
    pub y_label: String,
    /// Fixed y-axis range; derived from the data when `None`
    pub y_range: Option<(f64, f64)>,
    pub color: &'static str,
    pub points: Vec<(DateTime<Utc>, f64)>,
}

/// Destination for trend series.
pub trait ChartSink {
    /// Render the series into `output_dir`, returning the file written, if any.
    fn render(&self, series: &[ChartSeries], output_dir: &Path) -> AppResult<Option<PathBuf>>;
}

/// Pass-rate and duration series over all builds.
pub fn chart_series(summaries: &[BuildSummary]) -> Vec<ChartSeries> {
    vec![
        ChartSeries {
            title: "Test Pass Rate Trend".to_string(),
            y_label: "Pass Rate (%)".to_string(),
            y_range: Some((0.0, 100.0)),
            color: "#1f77b4",
            points: summaries.iter().map(|b| (b.timestamp, b.pass_rate)).collect(),
        },
        ChartSeries {
            title: "Test Duration Trend".to_string(),
            y_label: "Duration (seconds)".to_string(),
            y_range: None,
            color: "#ff7f0e",
            points: summaries.iter().map(|b| (b.timestamp, b.duration)).collect(),
        },
    ]
}

/// Run `sink` on the blocking thread pool.
pub async fn render_blocking(
    sink: Box<dyn ChartSink + Send>,
    series: Vec<ChartSeries>,
    output_dir: PathBuf,
) -> AppResult<Option<PathBuf>> {
    tokio::task::spawn_blocking(move || sink.render(&series, &output_dir))
        .await
        .map_err(|e| AppError::FileSystem(format!("Chart rendering task failed: {}", e)))?
}

/// Sink used when charts are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopChartSink;

impl ChartSink for NoopChartSink {
    fn render(&self, series: &[ChartSeries], _output_dir: &Path) -> AppResult<Option<PathBuf>> {
        debug!("Chart rendering disabled, dropping {} series", series.len());
        Ok(None)
    }
}

/// Writes all series side by side into a single SVG file.
#[derive(Debug, Default, Clone, Copy)]
pub struct SvgChartSink;

impl ChartSink for SvgChartSink {
    fn render(&self, series: &[ChartSeries], output_dir: &Path) -> AppResult<Option<PathBuf>> {
        if series.iter().all(|s| s.points.is_empty()) {
            info!("No build data available for chart generation");
            return Ok(None);
        }

        std::fs::create_dir_all(output_dir).map_err(|e| {
            AppError::FileSystem(format!("Failed to create chart directory: {}", e))
        })?;

        let path = output_dir.join(CHART_FILE);
        std::fs::write(&path, render_svg(series)).map_err(|e| {
            AppError::FileSystem(format!("Failed to write {}: {}", path.display(), e))
        })?;

        info!("Charts saved to {}", path.display());
        Ok(Some(path))
    }
}

/// Render the series as one SVG document with a panel per series.
pub fn render_svg(series: &[ChartSeries]) -> String {
    let width = PANEL_WIDTH * series.len().max(1) as f64;
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" font-family=\"Arial, sans-serif\">\n",
        w = width,
        h = PANEL_HEIGHT
    );
    svg.push_str(&format!(
        "  <rect width=\"{}\" height=\"{}\" fill=\"white\"/>\n",
        width, PANEL_HEIGHT
    ));

    for (i, s) in series.iter().enumerate() {
        svg.push_str(&render_panel(s, i as f64 * PANEL_WIDTH));
    }

    svg.push_str("</svg>\n");
    svg
}

fn render_panel(series: &ChartSeries, x_offset: f64) -> String {
    let left = x_offset + MARGIN;
    let right = x_offset + PANEL_WIDTH - MARGIN / 2.0;
    let top = MARGIN;
    let bottom = PANEL_HEIGHT - MARGIN;

    let mut panel = String::new();
    panel.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"14\">{}</text>\n",
        (left + right) / 2.0,
        top / 2.0,
        series.title
    ));
    panel.push_str(&format!(
        "  <line x1=\"{l}\" y1=\"{b}\" x2=\"{r}\" y2=\"{b}\" stroke=\"#333\"/>\n  <line x1=\"{l}\" y1=\"{t}\" x2=\"{l}\" y2=\"{b}\" stroke=\"#333\"/>\n",
        l = left,
        r = right,
        t = top,
        b = bottom
    ));
    panel.push_str(&format!(
        "  <text x=\"{x}\" y=\"{y}\" font-size=\"11\" text-anchor=\"middle\" transform=\"rotate(-90 {x} {y})\">{label}</text>\n",
        x = x_offset + MARGIN / 3.0,
        y = (top + bottom) / 2.0,
        label = series.y_label
    ));

    let (Some(first), Some(last)) = (series.points.first(), series.points.last()) else {
        return panel;
    };

    let (y_min, y_max) = series.y_range.unwrap_or_else(|| value_range(&series.points));
    let t_min = first.0.timestamp() as f64;
    let t_span = (last.0.timestamp() as f64 - t_min).max(1.0);
    let y_span = (y_max - y_min).max(f64::EPSILON);

    let project = |(timestamp, value): &(DateTime<Utc>, f64)| {
        let x = if series.points.len() == 1 {
            (left + right) / 2.0
        } else {
            left + (timestamp.timestamp() as f64 - t_min) / t_span * (right - left)
        };
        let y = bottom - (value - y_min) / y_span * (bottom - top);
        (x, y)
    };

    let coords: Vec<(f64, f64)> = series.points.iter().map(project).collect();
    let polyline = coords
        .iter()
        .map(|(x, y)| format!("{:.1},{:.1}", x, y))
        .collect::<Vec<_>>()
        .join(" ");

    panel.push_str(&format!(
        "  <polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
        polyline, series.color
    ));
    for (x, y) in &coords {
        panel.push_str(&format!(
            "  <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"3\" fill=\"{}\"/>\n",
            x, y, series.color
        ));
    }

    for (value, y) in [(y_max, top), (y_min, bottom)] {
        panel.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"10\" text-anchor=\"end\">{:.1}</text>\n",
            left - 4.0,
            y + 3.0,
            value
        ));
    }
    for (timestamp, anchor, x) in [(first.0, "start", left), (last.0, "end", right)] {
        panel.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"10\" text-anchor=\"{}\">{}</text>\n",
            x,
            bottom + 15.0,
            anchor,
            timestamp.format("%m/%d")
        ));
    }

    panel
}

fn value_range(points: &[(DateTime<Utc>, f64)]) -> (f64, f64) {
    let min = points.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let max = points.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        (min - 1.0, max + 1.0)
    } else {
        (min, max)
    }
}
