//! Result extraction service for parsing Allure `*-result.json` records.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, MalformedRecordKind};
use crate::models::{TestResult, TestStatus};
use crate::services::classifier;

/// Sentinel for metadata the record does not carry.
pub const UNKNOWN: &str = "unknown";

/// File name suffix of per-test result records.
pub const RESULT_FILE_SUFFIX: &str = "-result.json";

// ============================================================================
// Allure JSON Schema Structs
// ============================================================================

/// One per-test result record.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllureResult {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Start time in epoch milliseconds
    #[serde(default)]
    pub start: Option<i64>,
    /// Stop time in epoch milliseconds
    #[serde(default)]
    pub stop: Option<i64>,
    #[serde(default)]
    pub labels: Vec<AllureLabel>,
    #[serde(default)]
    pub status_details: Option<AllureStatusDetails>,
}

/// A `{name, value}` label attached to a result.
#[derive(Debug, Deserialize)]
pub struct AllureLabel {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Failure details of a result.
#[derive(Debug, Default, Deserialize)]
pub struct AllureStatusDetails {
    #[serde(default)]
    pub message: Option<String>,
}

impl AllureResult {
    /// Labels as a lookup table. Later duplicates override earlier ones.
    fn label_map(&self) -> HashMap<&str, &str> {
        self.labels
            .iter()
            .map(|l| (l.name.as_str(), l.value.as_str()))
            .collect()
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a raw JSON record into a normalized test result.
pub fn parse_result_str(content: &str, default_framework: &str) -> AppResult<TestResult> {
    let raw: AllureResult = serde_json::from_str(content)?;
    parse_result(&raw, default_framework)
}

/// Normalize one Allure record.
///
/// Missing `start` falls back to the current time. `stop < start` is clamped
/// to a zero duration rather than rejected.
pub fn parse_result(raw: &AllureResult, default_framework: &str) -> AppResult<TestResult> {
    let name = non_empty(raw.full_name.as_deref())
        .or_else(|| non_empty(raw.name.as_deref()))
        .ok_or(MalformedRecordKind::MissingName)?
        .to_string();

    let start = raw.start.filter(|ms| *ms != 0);
    let stop = raw.stop.filter(|ms| *ms != 0);

    let (timestamp, duration) = match (start, stop) {
        (None, None) => return Err(MalformedRecordKind::MissingTiming.into()),
        (Some(start), Some(stop)) => {
            let timestamp = timestamp_from_millis(start)?;
            timestamp_from_millis(stop)?;

            let elapsed = stop.checked_sub(start).ok_or_else(|| {
                MalformedRecordKind::InvalidEntry(format!(
                    "duration between {} and {} is out of range",
                    start, stop
                ))
            })?;
            if elapsed < 0 {
                debug!(
                    "Clamping negative duration for '{}' (start={}, stop={})",
                    name, start, stop
                );
            }
            (timestamp, (elapsed as f64 / 1000.0).max(0.0))
        }
        (Some(start), None) => (timestamp_from_millis(start)?, 0.0),
        (None, Some(stop)) => {
            timestamp_from_millis(stop)?;
            (Utc::now(), 0.0)
        }
    };

    let status = raw
        .status
        .as_deref()
        .map(TestStatus::parse)
        .unwrap_or(TestStatus::Unknown);

    let labels = raw.label_map();
    let label = |key: &str, default: &str| {
        labels
            .get(key)
            .copied()
            .unwrap_or(default)
            .to_string()
    };

    let error_message = raw
        .status_details
        .as_ref()
        .and_then(|d| d.message.clone());

    let category = classifier::classify(status, error_message.as_deref());

    Ok(TestResult {
        name,
        status,
        duration,
        timestamp,
        build_id: label("build", UNKNOWN),
        branch: label("branch", UNKNOWN),
        framework: label("framework", default_framework),
        error_message,
        category,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Convert epoch milliseconds to a UTC timestamp.
pub fn timestamp_from_millis(ms: i64) -> AppResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        MalformedRecordKind::InvalidEntry(format!("timestamp {} is out of range", ms)).into()
    })
}

// ============================================================================
// Directory Loading
// ============================================================================

/// Find all result files under a directory, sorted by path.
pub fn find_result_files(results_dir: &Path) -> AppResult<Vec<PathBuf>> {
    if !results_dir.is_dir() {
        return Err(AppError::MissingInput(results_dir.display().to_string()));
    }

    let pattern = format!(
        "{}/**/*{}",
        glob::Pattern::escape(&results_dir.to_string_lossy()),
        RESULT_FILE_SUFFIX
    );

    let paths = glob::glob(&pattern)
        .map_err(|e| AppError::FileSystem(format!("Invalid results pattern: {}", e)))?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => files.push(path),
            Err(e) => warn!("Skipping unreadable path: {}", e),
        }
    }
    files.sort();

    Ok(files)
}

/// Load and parse every result file under `results_dir`.
///
/// A missing directory or a bad file contributes nothing; this never fails.
/// Results keep the sorted file order so downstream grouping is deterministic.
pub async fn load_results_from_directory(
    results_dir: &Path,
    default_framework: &str,
) -> Vec<TestResult> {
    info!("Loading results from: {}", results_dir.display());

    let files = match find_result_files(results_dir) {
        Ok(files) => files,
        Err(e) => {
            warn!("{}", e);
            return Vec::new();
        }
    };

    let contents: Vec<(PathBuf, std::io::Result<String>)> = stream::iter(files)
        .map(|path| async move {
            let content = tokio::fs::read_to_string(&path).await;
            (path, content)
        })
        .buffered(num_cpus::get().max(1))
        .collect()
        .await;

    let mut results = Vec::with_capacity(contents.len());
    let mut skipped = 0;

    for (path, content) in contents {
        let parsed = content
            .map_err(AppError::from)
            .and_then(|c| parse_result_str(&c, default_framework));

        match parsed {
            Ok(result) => results.push(result),
            Err(e) => {
                warn!("Error loading {}: {}", path.display(), e);
                skipped += 1;
            }
        }
    }

    info!(
        "Loaded {} test results from {} ({} skipped)",
        results.len(),
        results_dir.display(),
        skipped
    );

    results
}
