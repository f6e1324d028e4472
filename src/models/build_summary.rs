//! Per-build aggregate statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary statistics for one build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub build_id: String,
    /// Latest result timestamp, or the start time supplied by history
    pub timestamp: DateTime<Utc>,
    pub branch: String,
    pub framework: String,
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub broken: u32,
    /// Total duration in seconds
    pub duration: f64,
    /// Percentage of passed tests (0 when the build has no tests)
    pub pass_rate: f64,
}

impl BuildSummary {
    /// Create a build summary, deriving `total` and `pass_rate` from the counts.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        build_id: String,
        timestamp: DateTime<Utc>,
        branch: String,
        framework: String,
        passed: u32,
        failed: u32,
        skipped: u32,
        broken: u32,
        duration: f64,
    ) -> Self {
        let total = passed + failed + skipped + broken;
        BuildSummary {
            build_id,
            timestamp,
            branch,
            framework,
            total,
            passed,
            failed,
            skipped,
            broken,
            duration,
            pass_rate: pass_rate(passed, total),
        }
    }
}

/// Pass rate as a percentage.
pub fn pass_rate(passed: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(passed) / f64::from(total) * 100.0
    }
}
