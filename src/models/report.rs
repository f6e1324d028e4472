//! Trend report document emitted by the analyzer.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::TrendMetrics;

/// Earliest and latest build timestamps covered by the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Totals over the whole loaded history, independent of any window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_builds: usize,
    pub total_test_results: usize,
    pub date_range: DateRange,
}

/// Machine-readable trend report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub project: String,
    pub framework: String,
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    /// Metrics keyed by window label, e.g. `"30_days"`
    pub trends: IndexMap<String, TrendMetrics>,
}

/// Label used for a lookback window in the `trends` mapping.
pub fn window_label(days: u32) -> String {
    format!("{}_days", days)
}
