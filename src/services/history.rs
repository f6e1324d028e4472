//! History import: pre-aggregated build statistics from `history.json`.
//!
//! Historical feeds are often incomplete, so a bad entry is skipped with a
//! warning and never fails the import.

use std::path::Path;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{AppError, AppResult, MalformedRecordKind};
use crate::models::BuildSummary;
use crate::services::extraction::{UNKNOWN, timestamp_from_millis};

/// File name of the history feed inside the history directory.
pub const HISTORY_FILE: &str = "history.json";

/// One historical build.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(default)]
    pub build_order: Option<BuildOrder>,
    #[serde(default)]
    pub time: Option<HistoryTime>,
    #[serde(default)]
    pub statistic: Option<HistoryStatistic>,
}

/// Build ordinal, written as a number or a string depending on the producer.
/// Numbers are kept as written.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BuildOrder {
    Number(serde_json::Number),
    Text(String),
}

impl std::fmt::Display for BuildOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryTime {
    /// Build start in epoch milliseconds
    #[serde(default)]
    pub start: Option<i64>,
    /// Build duration in milliseconds
    #[serde(default)]
    pub duration: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryStatistic {
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub passed: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub skipped: u32,
    #[serde(default)]
    pub broken: u32,
}

impl HistoryEntry {
    /// Convert to a build summary. Branch is not recorded in history.
    pub fn into_summary(self, framework: &str) -> AppResult<BuildSummary> {
        let build_id = self
            .build_order
            .map(|b| b.to_string())
            .unwrap_or_else(|| UNKNOWN.to_string());

        let time = self.time.unwrap_or_default();
        let timestamp = match time.start.filter(|ms| *ms != 0) {
            Some(ms) => timestamp_from_millis(ms)?,
            None => Utc::now(),
        };
        let duration = time.duration.unwrap_or(0).max(0) as f64 / 1000.0;

        let stats = self.statistic.unwrap_or_default();
        let counted = [stats.failed, stats.skipped, stats.broken]
            .into_iter()
            .try_fold(stats.passed, u32::checked_add)
            .ok_or_else(|| {
                MalformedRecordKind::InvalidEntry(format!("build {}: counts overflow", build_id))
            })?;
        let total = stats.total.unwrap_or(counted);
        if total < counted {
            return Err(MalformedRecordKind::InvalidEntry(format!(
                "build {}: total {} is less than the sum of counts {}",
                build_id, total, counted
            ))
            .into());
        }

        // Outcomes the feed does not break down (e.g. "unknown") count as broken.
        let broken = stats.broken + (total - counted);

        Ok(BuildSummary::new(
            build_id,
            timestamp,
            UNKNOWN.to_string(),
            framework.to_string(),
            stats.passed,
            stats.failed,
            stats.skipped,
            broken,
            duration,
        ))
    }
}

/// Parse a history document into build summaries, skipping malformed entries.
pub fn parse_history(content: &str, framework: &str) -> AppResult<Vec<BuildSummary>> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(content)?;

    let mut summaries = Vec::with_capacity(entries.len());
    for (index, value) in entries.into_iter().enumerate() {
        let summary = serde_json::from_value::<HistoryEntry>(value)
            .map_err(AppError::from)
            .and_then(|entry| entry.into_summary(framework));

        match summary {
            Ok(summary) => summaries.push(summary),
            Err(e) => warn!("Error parsing history entry {}: {}", index, e),
        }
    }

    Ok(summaries)
}

/// Load `history.json` from the history directory.
///
/// A missing directory, missing file or unreadable document yields no builds.
pub async fn load_history_from_directory(
    history_dir: &Path,
    framework: &str,
) -> Vec<BuildSummary> {
    info!("Loading history from: {}", history_dir.display());

    match read_history(history_dir, framework).await {
        Ok(summaries) => {
            info!("Loaded {} historical builds", summaries.len());
            summaries
        }
        Err(e) => {
            warn!("Error loading history: {}", e);
            Vec::new()
        }
    }
}

async fn read_history(history_dir: &Path, framework: &str) -> AppResult<Vec<BuildSummary>> {
    if !history_dir.is_dir() {
        return Err(AppError::MissingInput(history_dir.display().to_string()));
    }

    let history_file = history_dir.join(HISTORY_FILE);
    if !history_file.is_file() {
        return Err(AppError::MissingInput(history_file.display().to_string()));
    }

    let content = tokio::fs::read_to_string(&history_file).await?;
    parse_history(&content, framework)
}
