//! End-to-end ingestion and analysis over fixture directories.

use chrono::{Duration, Utc};

use test_trends_lib::models::{FailureCategory, TrendDirection};
use test_trends_lib::services::{TrendAnalyzer, extraction, history};

use crate::fixtures::{RecordSpec, days_ago, write_history, write_results};

/// Six builds over the last six days with one flaky test, one regressing test
/// and one test failing on infrastructure errors, plus three old history builds.
async fn load_sample_project(root: &std::path::Path) -> TrendAnalyzer {
    let now = Utc::now();
    let builds = ["101", "102", "103", "104", "105", "106"];
    let cart_statuses = ["passed", "failed", "passed", "passed", "passed", "failed"];

    let mut records = Vec::new();
    for (i, build) in builds.iter().enumerate() {
        let start = days_ago(now, 6 - i as i64);
        let pay_ms = if i < 3 { 1000 } else { 2000 };

        records.push(
            RecordSpec::new("suite.checkout.test_pay", "passed", build, start).duration_ms(pay_ms),
        );

        let cart_start = start + Duration::minutes(1);
        let cart = RecordSpec::new("suite.cart.test_add", cart_statuses[i], build, cart_start);
        records.push(if cart_statuses[i] == "failed" {
            cart.message("AssertionError: expected 3 items, found 2")
        } else {
            cart
        });

        let query_start = start + Duration::minutes(2);
        records.push(
            RecordSpec::new("suite.search.test_query", "failed", build, query_start)
                .message("Connection refused by search server"),
        );
        records.push(
            RecordSpec::new("suite.login.test_ok", "passed", build, start + Duration::minutes(3))
                .duration_ms(200),
        );
    }
    write_results(&root.join("allure-results"), &records);

    write_history(
        &root.join("allure-history"),
        &[
            (1, days_ago(now, 60), 6, 4),
            (2, days_ago(now, 50), 7, 3),
            (3, days_ago(now, 40), 8, 2),
        ],
    );

    let results =
        extraction::load_results_from_directory(&root.join("allure-results"), "unknown").await;
    let history =
        history::load_history_from_directory(&root.join("allure-history"), "unknown").await;
    TrendAnalyzer::from_sources(results, history)
}

#[tokio::test]
async fn test_pipeline_loads_and_aggregates() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = load_sample_project(dir.path()).await;

    assert_eq!(analyzer.results().len(), 24);
    assert_eq!(analyzer.summaries().len(), 9);

    let ids: Vec<&str> = analyzer.summaries().iter().map(|b| b.build_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "101", "102", "103", "104", "105", "106"]);

    for build in analyzer.summaries() {
        assert_eq!(build.total, build.passed + build.failed + build.skipped + build.broken);
    }

    let build_102 = &analyzer.summaries()[4];
    assert_eq!(build_102.total, 4);
    assert_eq!(build_102.failed, 2);
    assert_eq!(build_102.branch, "main");
    assert_eq!(build_102.framework, "pytest");
    assert!((build_102.pass_rate - 50.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_pipeline_thirty_day_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = load_sample_project(dir.path()).await;

    let metrics = analyzer.analyze_trends(30);

    assert_eq!(metrics.total_builds, 6);
    assert!((metrics.average_pass_rate - 400.0 / 6.0).abs() < 1e-9);
    assert_eq!(metrics.pass_rate_trend, TrendDirection::Declining);
    assert!((metrics.average_duration - 3.7).abs() < 1e-9);
    assert_eq!(metrics.duration_trend, TrendDirection::Declining);
    assert_eq!(metrics.flaky_tests, vec!["suite.cart.test_add".to_string()]);
    assert_eq!(
        metrics.most_failed_tests,
        vec![
            ("suite.search.test_query".to_string(), 6),
            ("suite.cart.test_add".to_string(), 2)
        ]
    );
    assert_eq!(metrics.failure_categories.len(), 2);
    assert_eq!(metrics.failure_categories[&FailureCategory::ProductDefect], 2);
    assert_eq!(metrics.failure_categories[&FailureCategory::Infrastructure], 6);
    assert_eq!(
        metrics.performance_regressions,
        vec!["suite.checkout.test_pay".to_string()]
    );
}

#[tokio::test]
async fn test_pipeline_wide_window_includes_history() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = load_sample_project(dir.path()).await;

    let metrics = analyzer.analyze_trends(90);
    assert_eq!(metrics.total_builds, 9);

    let metrics = analyzer.analyze_trends(2);
    assert_eq!(metrics.total_builds, 2);
    assert!(metrics.flaky_tests.is_empty());
    assert!(metrics.performance_regressions.is_empty());
}

#[tokio::test]
async fn test_missing_inputs_produce_empty_analysis() {
    let dir = tempfile::tempdir().unwrap();

    let results =
        extraction::load_results_from_directory(&dir.path().join("missing-results"), "unknown")
            .await;
    let history =
        history::load_history_from_directory(&dir.path().join("missing-history"), "unknown").await;
    let analyzer = TrendAnalyzer::from_sources(results, history);

    let metrics = analyzer.analyze_trends(30);
    assert_eq!(metrics.total_builds, 0);
    assert_eq!(metrics.pass_rate_trend, TrendDirection::Unknown);
    assert_eq!(metrics.duration_trend, TrendDirection::Unknown);
}

#[tokio::test]
async fn test_malformed_inputs_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let results_dir = dir.path().join("allure-results");
    let now = Utc::now();

    write_results(
        &results_dir,
        &[RecordSpec::new("suite.a.test_one", "passed", "7", days_ago(now, 1))],
    );
    std::fs::write(results_dir.join("zz-broken-result.json"), "{\"fullName\": ").unwrap();
    std::fs::write(
        results_dir.join("zz-nameless-result.json"),
        "{\"start\": 1, \"stop\": 2}",
    )
    .unwrap();

    let history_dir = dir.path().join("allure-history");
    std::fs::create_dir_all(&history_dir).unwrap();
    std::fs::write(
        history_dir.join("history.json"),
        format!(
            "[42, {{\"buildOrder\": 6, \"time\": {{\"start\": {}}}, \"statistic\": {{\"total\": 2, \"passed\": 1, \"failed\": 1}}}}]",
            days_ago(now, 2).timestamp_millis()
        ),
    )
    .unwrap();

    let results = extraction::load_results_from_directory(&results_dir, "unknown").await;
    let history = history::load_history_from_directory(&history_dir, "unknown").await;
    assert_eq!(results.len(), 1);
    assert_eq!(history.len(), 1);

    let analyzer = TrendAnalyzer::from_sources(results, history);
    let metrics = analyzer.analyze_trends(30);
    assert_eq!(metrics.total_builds, 2);
    assert!((metrics.average_pass_rate - 75.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_unlabelled_results_share_unknown_build() {
    let dir = tempfile::tempdir().unwrap();
    let results_dir = dir.path().join("allure-results");
    std::fs::create_dir_all(&results_dir).unwrap();

    let start = days_ago(Utc::now(), 1).timestamp_millis();
    for (i, status) in ["passed", "broken", "skipped"].iter().enumerate() {
        std::fs::write(
            results_dir.join(format!("{}-result.json", i)),
            format!(
                "{{\"fullName\": \"t{}\", \"status\": \"{}\", \"start\": {}, \"stop\": {}}}",
                i,
                status,
                start,
                start + 500
            ),
        )
        .unwrap();
    }

    let results = extraction::load_results_from_directory(&results_dir, "vitest").await;
    let analyzer = TrendAnalyzer::from_sources(results, Vec::new());

    assert_eq!(analyzer.summaries().len(), 1);
    let build = &analyzer.summaries()[0];
    assert_eq!(build.build_id, "unknown");
    assert_eq!(build.branch, "unknown");
    assert_eq!(build.framework, "vitest");
    assert_eq!((build.passed, build.broken, build.skipped), (1, 1, 1));
}
