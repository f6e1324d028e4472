//! Fixture builders for Allure results and history feeds.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;

/// One test execution to write as an Allure `*-result.json` file.
pub struct RecordSpec<'a> {
    pub name: &'a str,
    pub status: &'a str,
    pub build: &'a str,
    pub start: DateTime<Utc>,
    pub duration_ms: i64,
    pub message: Option<&'a str>,
}

impl<'a> RecordSpec<'a> {
    pub fn new(name: &'a str, status: &'a str, build: &'a str, start: DateTime<Utc>) -> Self {
        RecordSpec {
            name,
            status,
            build,
            start,
            duration_ms: 1000,
            message: None,
        }
    }

    pub fn duration_ms(mut self, duration_ms: i64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn message(mut self, message: &'a str) -> Self {
        self.message = Some(message);
        self
    }
}

pub fn days_ago(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

/// Write records as `<index>-result.json` files, zero-padded to keep path order.
pub fn write_results(dir: &Path, records: &[RecordSpec<'_>]) {
    std::fs::create_dir_all(dir).unwrap();
    for (i, record) in records.iter().enumerate() {
        let start = record.start.timestamp_millis();
        let mut value = json!({
            "uuid": format!("uuid-{}", i),
            "fullName": record.name,
            "name": record.name.rsplit('.').next().unwrap_or(record.name),
            "status": record.status,
            "start": start,
            "stop": start + record.duration_ms,
            "labels": [
                {"name": "build", "value": record.build},
                {"name": "branch", "value": "main"},
                {"name": "framework", "value": "pytest"}
            ]
        });
        if let Some(message) = record.message {
            value["statusDetails"] = json!({"message": message, "trace": "..."});
        }
        std::fs::write(
            dir.join(format!("{:05}-result.json", i)),
            serde_json::to_string_pretty(&value).unwrap(),
        )
        .unwrap();
    }
}

/// Write a `history.json` feed with `(build order, start, passed, failed)` entries.
pub fn write_history(dir: &Path, builds: &[(u64, DateTime<Utc>, u32, u32)]) {
    std::fs::create_dir_all(dir).unwrap();
    let entries: Vec<serde_json::Value> = builds
        .iter()
        .map(|(order, start, passed, failed)| {
            json!({
                "buildOrder": order,
                "reportName": "Allure Report",
                "time": {"start": start.timestamp_millis(), "duration": 120_000},
                "statistic": {
                    "total": passed + failed,
                    "passed": passed,
                    "failed": failed,
                    "skipped": 0,
                    "broken": 0
                }
            })
        })
        .collect();
    std::fs::write(
        dir.join("history.json"),
        serde_json::to_string(&entries).unwrap(),
    )
    .unwrap();
}
