//! Output of one windowed trend analysis.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::FailureCategory;

/// Direction of a metric over a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
    Unknown,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
            Self::Stable => "stable",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregate trend metrics for one lookback window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendMetrics {
    pub average_pass_rate: f64,
    pub pass_rate_trend: TrendDirection,
    /// Mean build duration in seconds
    pub average_duration: f64,
    pub duration_trend: TrendDirection,
    pub total_builds: usize,
    /// Tests with inconsistent outcomes, in first-encounter order
    pub flaky_tests: Vec<String>,
    /// `(name, failure count)` by descending count
    pub most_failed_tests: Vec<(String, usize)>,
    pub failure_categories: IndexMap<FailureCategory, usize>,
    /// Tests whose recent runs are markedly slower, in first-encounter order
    pub performance_regressions: Vec<String>,
}

impl TrendMetrics {
    /// Metrics for a window without any builds.
    pub fn empty() -> Self {
        TrendMetrics {
            average_pass_rate: 0.0,
            pass_rate_trend: TrendDirection::Unknown,
            average_duration: 0.0,
            duration_trend: TrendDirection::Unknown,
            total_builds: 0,
            flaky_tests: Vec::new(),
            most_failed_tests: Vec::new(),
            failure_categories: IndexMap::new(),
            performance_regressions: Vec::new(),
        }
    }
}
