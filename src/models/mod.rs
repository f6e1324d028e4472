//! Domain models for the trend analyzer.

pub mod build_summary;
pub mod report;
pub mod test_result;
pub mod trend_metrics;

// Re-export commonly used types
pub use build_summary::BuildSummary;
pub use report::{DateRange, ReportSummary, TrendReport, window_label};
pub use test_result::{FailureCategory, TestResult, TestStatus};
pub use trend_metrics::{TrendDirection, TrendMetrics};
