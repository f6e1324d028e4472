//! Report emitter: JSON and HTML trend reports.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::info;

use crate::config::OutputFormat;
use crate::error::{AppError, AppResult};
use crate::models::{DateRange, ReportSummary, TrendMetrics, TrendReport, window_label};
use crate::services::trends::TrendAnalyzer;

pub const JSON_REPORT_FILE: &str = "trend_analysis.json";
pub const HTML_REPORT_FILE: &str = "trend_analysis.html";

/// Number of flaky tests and regressions listed in the console summary.
const SUMMARY_TOP_N: usize = 5;

/// Analyze every window and assemble the report document.
pub fn build_report(
    analyzer: &TrendAnalyzer,
    project: &str,
    framework: &str,
    windows: &[u32],
    now: DateTime<Utc>,
) -> TrendReport {
    let summaries = analyzer.summaries();

    let mut trends = IndexMap::new();
    for &days in windows {
        trends
            .entry(window_label(days))
            .or_insert_with(|| analyzer.analyze_trends_at(now, days));
    }

    TrendReport {
        project: project.to_string(),
        framework: framework.to_string(),
        generated_at: now,
        summary: ReportSummary {
            total_builds: summaries.len(),
            total_test_results: analyzer.results().len(),
            date_range: DateRange {
                start: summaries.iter().map(|b| b.timestamp).min(),
                end: summaries.iter().map(|b| b.timestamp).max(),
            },
        },
        trends,
    }
}

/// Serialize the report as pretty-printed JSON.
pub fn render_json(report: &TrendReport) -> AppResult<String> {
    serde_json::to_string_pretty(report)
        .map_err(|e| AppError::Serialization(format!("Failed to serialize report: {}", e)))
}

/// Write the report files selected by `format` into `output_dir`.
///
/// Returns the paths written. Any failure is fatal for the run.
pub async fn write_report(
    report: &TrendReport,
    output_dir: &Path,
    format: OutputFormat,
    primary_label: &str,
) -> AppResult<Vec<PathBuf>> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| AppError::FileSystem(format!("Failed to create output directory: {}", e)))?;

    let mut written = Vec::new();

    if format.writes_json() {
        let path = output_dir.join(JSON_REPORT_FILE);
        write_file(&path, render_json(report)?).await?;
        info!("JSON report saved to {}", path.display());
        written.push(path);
    }

    if format.writes_html() {
        let path = output_dir.join(HTML_REPORT_FILE);
        write_file(&path, render_html(report, primary_label)).await?;
        info!("HTML report saved to {}", path.display());
        written.push(path);
    }

    Ok(written)
}

async fn write_file(path: &Path, content: String) -> AppResult<()> {
    tokio::fs::write(path, content)
        .await
        .map_err(|e| AppError::FileSystem(format!("Failed to write {}: {}", path.display(), e)))
}

// ============================================================================
// HTML
// ============================================================================

const HTML_STYLE: &str = r#"
        body { font-family: Arial, sans-serif; margin: 20px; background: #f5f5f5; }
        .container { max-width: 1200px; margin: 0 auto; background: white; padding: 20px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
        h1, h2, h3 { color: #333; }
        .summary { display: grid; grid-template-columns: repeat(auto-fit, minmax(250px, 1fr)); gap: 20px; margin: 20px 0; }
        .metric { background: #f8f9fa; padding: 15px; border-radius: 6px; border-left: 4px solid #007bff; }
        .metric h4 { margin: 0 0 10px 0; color: #666; }
        .metric .value { font-size: 24px; font-weight: bold; color: #333; }
        .trend-improving { border-left-color: #28a745; }
        .trend-declining { border-left-color: #dc3545; }
        .trend-stable { border-left-color: #ffc107; }
        .flaky-tests, .failed-tests { background: #fff3cd; padding: 15px; border-radius: 6px; margin: 10px 0; }
        .categories { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 10px; }
        .category { background: #e9ecef; padding: 10px; border-radius: 4px; text-align: center; }
        table { width: 100%; border-collapse: collapse; margin: 10px 0; }
        th, td { padding: 8px; text-align: left; border-bottom: 1px solid #ddd; }
        th { background-color: #f8f9fa; }
        .footer { text-align: center; margin-top: 30px; color: #666; font-size: 12px; }
"#;

/// Render the human-readable report for one window of `report`.
pub fn render_html(report: &TrendReport, window: &str) -> String {
    let empty = TrendMetrics::empty();
    let metrics = report.trends.get(window).unwrap_or(&empty);
    let window_title = window.replace('_', " ");
    let project = escape_html(&report.project);

    let date_range = match (report.summary.date_range.start, report.summary.date_range.end) {
        (Some(start), Some(end)) => format!("{} to {}", start.to_rfc3339(), end.to_rfc3339()),
        _ => "No data".to_string(),
    };

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("    <meta charset=\"UTF-8\">\n");
    html.push_str(
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html.push_str(&format!("    <title>Trend Analysis - {}</title>\n", project));
    html.push_str(&format!("    <style>{}    </style>\n", HTML_STYLE));
    html.push_str("</head>\n<body>\n    <div class=\"container\">\n");
    html.push_str("        <h1>Test Trend Analysis Report</h1>\n");
    html.push_str(&format!(
        "        <p><strong>Project:</strong> {} | <strong>Framework:</strong> {}</p>\n",
        project,
        escape_html(&report.framework)
    ));
    html.push_str(&format!(
        "        <p><strong>Generated:</strong> {} | <strong>Data Range:</strong> {}</p>\n",
        report.generated_at.to_rfc3339(),
        date_range
    ));

    html.push_str(&format!(
        "        <h2>{} Trend Summary</h2>\n",
        escape_html(&window_title)
    ));
    html.push_str("        <div class=\"summary\">\n");
    html.push_str(&metric_card(
        "Average Pass Rate",
        &format!("{:.1}%", metrics.average_pass_rate),
        Some(metrics.pass_rate_trend.as_str()),
    ));
    html.push_str(&metric_card(
        "Average Duration",
        &format!("{:.1}s", metrics.average_duration),
        Some(metrics.duration_trend.as_str()),
    ));
    html.push_str(&metric_card("Total Builds", &metrics.total_builds.to_string(), None));
    html.push_str(&metric_card("Flaky Tests", &metrics.flaky_tests.len().to_string(), None));
    html.push_str("        </div>\n");

    if !metrics.flaky_tests.is_empty() {
        html.push_str("        <h3>Flaky Tests</h3>\n        <div class=\"flaky-tests\">\n");
        html.push_str(
            "            <p>Tests with inconsistent results that may need attention:</p>\n",
        );
        html.push_str(&html_list(&metrics.flaky_tests));
        html.push_str("        </div>\n");
    }

    if !metrics.most_failed_tests.is_empty() {
        html.push_str("        <h3>Most Failed Tests</h3>\n        <div class=\"failed-tests\">\n");
        html.push_str("            <table>\n");
        html.push_str("                <tr><th>Test Name</th><th>Failure Count</th></tr>\n");
        for (name, count) in &metrics.most_failed_tests {
            html.push_str(&format!(
                "                <tr><td>{}</td><td>{}</td></tr>\n",
                escape_html(name),
                count
            ));
        }
        html.push_str("            </table>\n        </div>\n");
    }

    if !metrics.failure_categories.is_empty() {
        html.push_str("        <h3>Failure Categories</h3>\n        <div class=\"categories\">\n");
        for (category, count) in &metrics.failure_categories {
            html.push_str(&format!(
                "            <div class=\"category\"><strong>{}</strong><br>{} failures</div>\n",
                category, count
            ));
        }
        html.push_str("        </div>\n");
    }

    if !metrics.performance_regressions.is_empty() {
        html.push_str(
            "        <h3>Performance Regressions</h3>\n        <div class=\"flaky-tests\">\n",
        );
        html.push_str("            <p>Tests showing performance degradation:</p>\n");
        html.push_str(&html_list(&metrics.performance_regressions));
        html.push_str("        </div>\n");
    }

    html.push_str(&format!(
        "        <div class=\"footer\">\n            <p>Report data is based on the last {}</p>\n        </div>\n",
        escape_html(&window_title)
    ));
    html.push_str("    </div>\n</body>\n</html>\n");

    html
}

fn metric_card(title: &str, value: &str, trend: Option<&str>) -> String {
    match trend {
        Some(trend) => format!(
            "            <div class=\"metric trend-{trend}\">\n                <h4>{title}</h4>\n                <div class=\"value\">{value}</div>\n                <small>Trend: {trend}</small>\n            </div>\n"
        ),
        None => format!(
            "            <div class=\"metric\">\n                <h4>{title}</h4>\n                <div class=\"value\">{value}</div>\n            </div>\n"
        ),
    }
}

fn html_list(items: &[String]) -> String {
    let mut list = String::from("            <ul>\n");
    for item in items {
        list.push_str(&format!("                <li>{}</li>\n", escape_html(item)));
    }
    list.push_str("            </ul>\n");
    list
}

/// Escape text for interpolation into HTML.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// ============================================================================
// Console summary
// ============================================================================

/// Lines of the console summary for one window.
pub fn summary_lines(metrics: &TrendMetrics, days: u32) -> Vec<String> {
    let mut lines = vec![
        format!("Trend Analysis Summary ({} days):", days),
        format!(
            "  Average Pass Rate: {:.1}% ({})",
            metrics.average_pass_rate, metrics.pass_rate_trend
        ),
        format!(
            "  Average Duration: {:.1}s ({})",
            metrics.average_duration, metrics.duration_trend
        ),
        format!("  Total Builds: {}", metrics.total_builds),
        format!("  Flaky Tests: {}", metrics.flaky_tests.len()),
        format!("  Most Failed Tests: {}", metrics.most_failed_tests.len()),
    ];

    if !metrics.flaky_tests.is_empty() {
        lines.push("Top Flaky Tests:".to_string());
        lines.extend(
            metrics
                .flaky_tests
                .iter()
                .take(SUMMARY_TOP_N)
                .map(|t| format!("  - {}", t)),
        );
    }

    if !metrics.performance_regressions.is_empty() {
        lines.push("Performance Regressions:".to_string());
        lines.extend(
            metrics
                .performance_regressions
                .iter()
                .take(SUMMARY_TOP_N)
                .map(|t| format!("  - {}", t)),
        );
    }

    lines
}
