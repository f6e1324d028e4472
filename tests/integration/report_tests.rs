//! Report emission over a loaded project.

use chrono::{Duration, Utc};

use test_trends_lib::config::OutputFormat;
use test_trends_lib::models::TrendReport;
use test_trends_lib::services::charts::{self, CHART_FILE};
use test_trends_lib::services::report::{self, HTML_REPORT_FILE, JSON_REPORT_FILE};
use test_trends_lib::services::{ChartSink, SvgChartSink, TrendAnalyzer, extraction, history};

use crate::fixtures::{RecordSpec, days_ago, write_history, write_results};

async fn load_project(root: &std::path::Path) -> TrendAnalyzer {
    let now = Utc::now();
    let statuses = ["passed", "failed", "failed", "passed"];
    let builds = ["11", "12", "13", "14"];

    let mut records = Vec::new();
    for (i, build) in builds.iter().enumerate() {
        let start = days_ago(now, 4 - i as i64);
        records.push(
            RecordSpec::new("ui.test_<menu>", statuses[i], build, start)
                .message("Timeout waiting for selector"),
        );
        let stable_start = start + Duration::minutes(1);
        records.push(RecordSpec::new("ui.test_stable", "passed", build, stable_start));
    }
    write_results(&root.join("results"), &records);
    write_history(&root.join("history"), &[(1, days_ago(now, 45), 9, 1)]);

    let results = extraction::load_results_from_directory(&root.join("results"), "unknown").await;
    let history = history::load_history_from_directory(&root.join("history"), "unknown").await;
    TrendAnalyzer::from_sources(results, history)
}

#[tokio::test]
async fn test_json_report_round_trips_windows() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = load_project(dir.path()).await;
    let out = dir.path().join("trends");

    let trend_report = report::build_report(&analyzer, "shop", "pytest", &[7, 30, 90], Utc::now());
    let written = report::write_report(&trend_report, &out, OutputFormat::Json, "30_days")
        .await
        .unwrap();

    assert_eq!(written, vec![out.join(JSON_REPORT_FILE)]);
    assert!(!out.join(HTML_REPORT_FILE).exists());

    let content = std::fs::read_to_string(out.join(JSON_REPORT_FILE)).unwrap();
    let parsed: TrendReport = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed, trend_report);

    let keys: Vec<&str> = parsed.trends.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["7_days", "30_days", "90_days"]);
    assert_eq!(parsed.summary.total_builds, 5);
    assert_eq!(parsed.summary.total_test_results, 8);
    assert_eq!(parsed.trends["7_days"].total_builds, 4);
    assert_eq!(parsed.trends["90_days"].total_builds, 5);
    assert_eq!(parsed.trends["30_days"].flaky_tests, vec!["ui.test_<menu>".to_string()]);

    let raw: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(raw["project"], "shop");
    assert_eq!(raw["trends"]["30_days"]["pass_rate_trend"], "stable");
    assert_eq!(raw["trends"]["30_days"]["failure_categories"]["infrastructure"], 2);
}

#[tokio::test]
async fn test_all_format_writes_json_and_html() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = load_project(dir.path()).await;
    let out = dir.path().join("trends");

    let trend_report = report::build_report(&analyzer, "shop", "pytest", &[7, 30], Utc::now());
    let written = report::write_report(&trend_report, &out, OutputFormat::All, "7_days")
        .await
        .unwrap();

    assert_eq!(written.len(), 2);
    let html = std::fs::read_to_string(out.join(HTML_REPORT_FILE)).unwrap();
    assert!(html.contains("shop"));
    assert!(html.contains("7 days"));
    assert!(html.contains("ui.test_&lt;menu&gt;"));
    assert!(!html.contains("ui.test_<menu>"));
}

#[tokio::test]
async fn test_empty_project_still_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = TrendAnalyzer::from_sources(Vec::new(), Vec::new());
    let out = dir.path().join("trends");

    let trend_report = report::build_report(&analyzer, "empty", "unknown", &[30], Utc::now());
    report::write_report(&trend_report, &out, OutputFormat::All, "30_days")
        .await
        .unwrap();

    let content = std::fs::read_to_string(out.join(JSON_REPORT_FILE)).unwrap();
    let raw: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(raw["summary"]["total_builds"], 0);
    assert!(raw["summary"]["date_range"]["start"].is_null());
    assert_eq!(raw["trends"]["30_days"]["pass_rate_trend"], "unknown");

    let html = std::fs::read_to_string(out.join(HTML_REPORT_FILE)).unwrap();
    assert!(html.contains("No data"));

    let rendered = SvgChartSink
        .render(&charts::chart_series(analyzer.summaries()), &out)
        .unwrap();
    assert!(rendered.is_none());
}

#[tokio::test]
async fn test_chart_sink_writes_alongside_report() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = load_project(dir.path()).await;
    let out = dir.path().join("trends");

    let rendered = SvgChartSink
        .render(&charts::chart_series(analyzer.summaries()), &out)
        .unwrap();

    assert_eq!(rendered, Some(out.join(CHART_FILE)));
    let svg = std::fs::read_to_string(out.join(CHART_FILE)).unwrap();
    assert_eq!(svg.matches("<circle").count(), 10);
}
