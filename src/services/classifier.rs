//! Failure categorization from error text.
//!
//! Rules are evaluated in order and the first match wins. Assertion wording is
//! checked before infrastructure wording, so an assertion message that mentions
//! a timeout is still a product defect.

use crate::models::{FailureCategory, TestStatus};

const PRODUCT_DEFECT_KEYWORDS: &[&str] = &["assertion", "expect", "should"];
const TEST_DEFECT_KEYWORDS: &[&str] = &[
    "typeerror",
    "referenceerror",
    "syntaxerror",
    "importerror",
];
const INFRASTRUCTURE_KEYWORDS: &[&str] = &["timeout", "connection", "network", "server"];
const PERFORMANCE_KEYWORDS: &[&str] = &["performance", "slow", "memory"];

/// Ordered keyword rules applied to failing results with error text.
const RULES: &[(&[&str], FailureCategory)] = &[
    (PRODUCT_DEFECT_KEYWORDS, FailureCategory::ProductDefect),
    (TEST_DEFECT_KEYWORDS, FailureCategory::TestDefect),
    (INFRASTRUCTURE_KEYWORDS, FailureCategory::Infrastructure),
    (PERFORMANCE_KEYWORDS, FailureCategory::Performance),
];

/// Classify a result by status and error text.
pub fn classify(status: TestStatus, error_message: Option<&str>) -> FailureCategory {
    if status == TestStatus::Passed {
        return FailureCategory::Passed;
    }

    let message = match error_message {
        Some(m) if !m.is_empty() => m.to_lowercase(),
        _ => return FailureCategory::UnknownFailure,
    };

    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| message.contains(k)))
        .map(|(_, category)| *category)
        .unwrap_or(FailureCategory::OtherFailure)
}
