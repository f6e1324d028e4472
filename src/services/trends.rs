//! Trend analysis over a lookback window.
//!
//! The analyzer is a pure function of the loaded results, the build summaries,
//! the window length and the reference time. Every analysis degrades to an
//! empty or `unknown` output when there is not enough data.

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::models::{
    BuildSummary, FailureCategory, TestResult, TestStatus, TrendDirection, TrendMetrics,
};
use crate::services::aggregation;

/// Minimum |slope| per build for a trend to count as a change.
pub const TREND_SLOPE_THRESHOLD: f64 = 0.1;
/// Minimum number of points before a trend direction is inferred.
pub const MIN_TREND_POINTS: usize = 3;
/// Minimum runs in the window before a test can be flaky.
pub const MIN_FLAKY_RUNS: usize = 3;
/// Minimum share of runs with the minority outcome.
pub const FLAKY_RATIO_THRESHOLD: f64 = 0.2;
/// Minimum duration samples before checking for a regression.
pub const MIN_REGRESSION_POINTS: usize = 5;
/// Recent mean must exceed the early mean by this factor.
pub const REGRESSION_FACTOR: f64 = 1.5;
/// Recent mean must also exceed this many seconds.
pub const REGRESSION_FLOOR_SECS: f64 = 1.0;
/// Cap on every ranked list in `TrendMetrics`.
pub const MAX_LISTED: usize = 10;

/// Holds the result and build collections of one analysis run.
#[derive(Debug, Clone, Default)]
pub struct TrendAnalyzer {
    results: Vec<TestResult>,
    summaries: Vec<BuildSummary>,
}

impl TrendAnalyzer {
    /// Create an analyzer. Summaries are sorted by timestamp; ties keep their
    /// input order.
    pub fn new(results: Vec<TestResult>, mut summaries: Vec<BuildSummary>) -> Self {
        summaries.sort_by_key(|b| b.timestamp);
        TrendAnalyzer { results, summaries }
    }

    /// Aggregate per-test results into builds and merge the imported history.
    pub fn from_sources(results: Vec<TestResult>, history: Vec<BuildSummary>) -> Self {
        let mut summaries = aggregation::aggregate_builds(&results);
        info!(
            "Aggregated {} test results into {} builds, {} historical builds",
            results.len(),
            summaries.len(),
            history.len()
        );
        summaries.extend(history);
        Self::new(results, summaries)
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// Build summaries in chronological order.
    pub fn summaries(&self) -> &[BuildSummary] {
        &self.summaries
    }

    /// Analyze the last `days_back` days up to now.
    pub fn analyze_trends(&self, days_back: u32) -> TrendMetrics {
        self.analyze_trends_at(Utc::now(), days_back)
    }

    /// Analyze the `days_back` days preceding `now`.
    pub fn analyze_trends_at(&self, now: DateTime<Utc>, days_back: u32) -> TrendMetrics {
        debug!("Analyzing trends for the last {} days", days_back);

        // A window reaching past the representable range covers everything.
        let cutoff = Duration::try_days(i64::from(days_back))
            .and_then(|window| now.checked_sub_signed(window));
        let in_window = |timestamp: DateTime<Utc>| cutoff.is_none_or(|c| timestamp >= c);

        let recent_builds: Vec<&BuildSummary> = self
            .summaries
            .iter()
            .filter(|b| in_window(b.timestamp))
            .collect();

        if recent_builds.is_empty() {
            debug!("No builds within the last {} days", days_back);
            return TrendMetrics::empty();
        }

        let pass_rates: Vec<f64> = recent_builds.iter().map(|b| b.pass_rate).collect();
        let durations: Vec<f64> = recent_builds.iter().map(|b| b.duration).collect();

        let recent_results: Vec<&TestResult> = self
            .results
            .iter()
            .filter(|r| in_window(r.timestamp))
            .collect();

        TrendMetrics {
            average_pass_rate: mean(&pass_rates),
            pass_rate_trend: analyze_trend(&pass_rates, false),
            average_duration: mean(&durations),
            // Rising duration is a decline.
            duration_trend: analyze_trend(&durations, true),
            total_builds: recent_builds.len(),
            flaky_tests: identify_flaky_tests(&recent_results),
            most_failed_tests: identify_most_failed_tests(&recent_results),
            failure_categories: analyze_failure_categories(&recent_results),
            performance_regressions: identify_performance_regressions(&recent_results),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Classify a chronological series by its least-squares slope against index.
///
/// `invert` flips the sign for metrics where lower is better.
pub fn analyze_trend(values: &[f64], invert: bool) -> TrendDirection {
    let n = values.len();
    if n < MIN_TREND_POINTS {
        return TrendDirection::Unknown;
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);

    let (numerator, denominator) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });

    if denominator == 0.0 {
        return TrendDirection::Stable;
    }

    let mut slope = numerator / denominator;
    if invert {
        slope = -slope;
    }

    if slope > TREND_SLOPE_THRESHOLD {
        TrendDirection::Improving
    } else if slope < -TREND_SLOPE_THRESHOLD {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

/// Tests whose outcome disagrees with the majority in at least one in five runs.
pub fn identify_flaky_tests(results: &[&TestResult]) -> Vec<String> {
    let mut by_test: IndexMap<&str, IndexMap<TestStatus, usize>> = IndexMap::new();
    for result in results {
        *by_test
            .entry(result.name.as_str())
            .or_default()
            .entry(result.status)
            .or_default() += 1;
    }

    by_test
        .into_iter()
        .filter(|(_, counts)| {
            let runs: usize = counts.values().sum();
            if counts.len() < 2 || runs < MIN_FLAKY_RUNS {
                return false;
            }
            let minority = counts.values().copied().min().unwrap_or(0);
            minority as f64 / runs as f64 >= FLAKY_RATIO_THRESHOLD
        })
        .map(|(name, _)| name.to_string())
        .take(MAX_LISTED)
        .collect()
}

/// Tests with the most `failed` results, ties in first-encounter order.
pub fn identify_most_failed_tests(results: &[&TestResult]) -> Vec<(String, usize)> {
    let mut failures: IndexMap<&str, usize> = IndexMap::new();
    for result in results.iter().filter(|r| r.status == TestStatus::Failed) {
        *failures.entry(result.name.as_str()).or_default() += 1;
    }

    let mut ranked: Vec<(String, usize)> = failures
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    // Stable sort keeps encounter order among equal counts.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(MAX_LISTED);
    ranked
}

/// Histogram of failure categories over `failed` results.
pub fn analyze_failure_categories(results: &[&TestResult]) -> IndexMap<FailureCategory, usize> {
    let mut categories = IndexMap::new();
    for result in results.iter().filter(|r| r.status == TestStatus::Failed) {
        *categories.entry(result.category).or_default() += 1;
    }
    categories
}

/// Tests whose later runs are markedly slower than their earlier runs.
pub fn identify_performance_regressions(results: &[&TestResult]) -> Vec<String> {
    let mut by_test: IndexMap<&str, Vec<(DateTime<Utc>, f64)>> = IndexMap::new();
    for result in results {
        by_test
            .entry(result.name.as_str())
            .or_default()
            .push((result.timestamp, result.duration));
    }

    by_test
        .into_iter()
        .filter(|(_, samples)| samples.len() >= MIN_REGRESSION_POINTS)
        .filter_map(|(name, mut samples)| {
            samples.sort_by_key(|(timestamp, _)| *timestamp);
            let durations: Vec<f64> = samples.into_iter().map(|(_, d)| d).collect();

            let (early, recent) = durations.split_at(durations.len() / 2);
            let early_mean = mean(early);
            let recent_mean = mean(recent);

            let regressed =
                recent_mean > early_mean * REGRESSION_FACTOR && recent_mean > REGRESSION_FLOOR_SECS;
            regressed.then(|| name.to_string())
        })
        .take(MAX_LISTED)
        .collect()
}
