//! Test result model representing individual test execution results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Test execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Broken,
    Skipped,
    Unknown,
}

impl TestStatus {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Broken => "broken",
            Self::Skipped => "skipped",
            Self::Unknown => "unknown",
        }
    }

    /// Parse from string representation, ignoring case.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "passed" => Self::Passed,
            "failed" => Self::Failed,
            "broken" => Self::Broken,
            "skipped" => Self::Skipped,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure taxonomy assigned to every result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    Passed,
    ProductDefect,
    TestDefect,
    Infrastructure,
    Performance,
    UnknownFailure,
    OtherFailure,
}

impl FailureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::ProductDefect => "product_defect",
            Self::TestDefect => "test_defect",
            Self::Infrastructure => "infrastructure",
            Self::Performance => "performance",
            Self::UnknownFailure => "unknown_failure",
            Self::OtherFailure => "other_failure",
        }
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Individual test execution result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Full test identifier
    pub name: String,
    /// Execution status
    pub status: TestStatus,
    /// Execution duration in seconds
    pub duration: f64,
    /// Execution start time
    pub timestamp: DateTime<Utc>,
    /// Build the result belongs to
    pub build_id: String,
    pub branch: String,
    pub framework: String,
    /// Failure message reported by the framework (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Derived failure category
    pub category: FailureCategory,
}
