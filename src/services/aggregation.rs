//! Build aggregation: reduce per-test results into per-build summaries.

use indexmap::IndexMap;

use crate::models::{BuildSummary, TestResult, TestStatus};

/// Group results by build id and reduce each group to a `BuildSummary`.
///
/// Builds are returned in order of first appearance. Results with an
/// `unknown` status count as broken so that the counts always add up to the
/// total.
pub fn aggregate_builds(results: &[TestResult]) -> Vec<BuildSummary> {
    let mut builds: IndexMap<&str, Vec<&TestResult>> = IndexMap::new();
    for result in results {
        builds.entry(result.build_id.as_str()).or_default().push(result);
    }

    builds
        .into_iter()
        .filter_map(|(build_id, group)| summarize_build(build_id, &group))
        .collect()
}

fn summarize_build(build_id: &str, results: &[&TestResult]) -> Option<BuildSummary> {
    let first = results.first()?;
    let timestamp = results.iter().map(|r| r.timestamp).max()?;

    let (mut passed, mut failed, mut skipped, mut broken) = (0u32, 0u32, 0u32, 0u32);
    for result in results {
        match result.status {
            TestStatus::Passed => passed += 1,
            TestStatus::Failed => failed += 1,
            TestStatus::Skipped => skipped += 1,
            TestStatus::Broken | TestStatus::Unknown => broken += 1,
        }
    }

    let duration = results.iter().map(|r| r.duration).sum();

    Some(BuildSummary::new(
        build_id.to_string(),
        timestamp,
        first.branch.clone(),
        first.framework.clone(),
        passed,
        failed,
        skipped,
        broken,
        duration,
    ))
}
