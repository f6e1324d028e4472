//! Application configuration loaded from environment variables.
//!
//! Command-line flags override these values in `main`.

use std::env;
use std::path::PathBuf;

/// Default values used when neither the environment nor the CLI sets a value.
pub mod defaults {
    pub const RESULTS_DIR: &str = "allure-results";
    pub const HISTORY_DIR: &str = "allure-history";
    pub const OUTPUT_DIR: &str = "trends";
    pub const PROJECT: &str = "unknown-project";
    pub const FRAMEWORK: &str = "unknown";
    pub const FORMAT: &str = "all";
    pub const DAYS: u32 = 30;
    pub const WINDOWS: &[u32] = &[7, 30, 90];
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Html,
    All,
}

impl OutputFormat {
    /// Parse output format from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "html" => Some(Self::Html),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    pub fn writes_json(&self) -> bool {
        matches!(self, Self::Json | Self::All)
    }

    pub fn writes_html(&self) -> bool {
        matches!(self, Self::Html | Self::All)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Html => write!(f, "html"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory containing `*-result.json` files
    pub results_dir: PathBuf,
    /// Directory containing `history.json`
    pub history_dir: PathBuf,
    /// Directory reports and charts are written to
    pub output_dir: PathBuf,
    /// Project name shown in reports
    pub project: String,
    /// Framework used when a result has no `framework` label
    pub framework: String,
    pub format: OutputFormat,
    /// Primary window in days (HTML report and console summary)
    pub days: u32,
    /// All windows included in the JSON report
    pub windows: Vec<u32>,
    /// Render trend charts
    pub charts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            results_dir: PathBuf::from(defaults::RESULTS_DIR),
            history_dir: PathBuf::from(defaults::HISTORY_DIR),
            output_dir: PathBuf::from(defaults::OUTPUT_DIR),
            project: defaults::PROJECT.to_string(),
            framework: defaults::FRAMEWORK.to_string(),
            format: OutputFormat::All,
            days: defaults::DAYS,
            windows: defaults::WINDOWS.to_vec(),
            charts: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TREND_RESULTS_DIR`: Results directory (default: allure-results)
    /// - `TREND_HISTORY_DIR`: History directory (default: allure-history)
    /// - `TREND_OUTPUT_DIR`: Output directory (default: trends)
    /// - `TREND_PROJECT`: Project name (default: unknown-project)
    /// - `TREND_FRAMEWORK`: Fallback framework name (default: unknown)
    /// - `TREND_FORMAT`: json, html or all (default: all)
    /// - `TREND_DAYS`: Primary window in days (default: 30)
    /// - `TREND_WINDOWS`: Comma-separated report windows (default: 7,30,90)
    /// - `TREND_CHARTS`: Render charts, true/false (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(dir) = lookup("TREND_RESULTS_DIR") {
            config.results_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("TREND_HISTORY_DIR") {
            config.history_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("TREND_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(project) = lookup("TREND_PROJECT") {
            config.project = project;
        }
        if let Some(framework) = lookup("TREND_FRAMEWORK") {
            config.framework = framework;
        }

        let format = lookup("TREND_FORMAT").unwrap_or_else(|| defaults::FORMAT.to_string());
        config.format = OutputFormat::parse(&format).ok_or(ConfigError::InvalidValue(
            "TREND_FORMAT must be 'json', 'html' or 'all'",
        ))?;

        if let Some(days) = lookup("TREND_DAYS") {
            config.days = days
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidValue("TREND_DAYS must be a valid number"))?;
        }

        if let Some(windows) = lookup("TREND_WINDOWS") {
            config.windows = parse_windows(&windows).ok_or(ConfigError::InvalidValue(
                "TREND_WINDOWS must be a comma-separated list of numbers",
            ))?;
        }

        if let Some(charts) = lookup("TREND_CHARTS") {
            config.charts = parse_bool(&charts)
                .ok_or(ConfigError::InvalidValue("TREND_CHARTS must be true or false"))?;
        }

        Ok(config)
    }

    /// Validate the final configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.days == 0 {
            errors.push("days must be at least 1".to_string());
        }

        if self.windows.is_empty() {
            errors.push("at least one report window is required".to_string());
        }

        if self.windows.contains(&0) {
            errors.push("report windows must be at least 1 day".to_string());
        }

        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }

        Ok(())
    }

    /// Report windows with the primary window included, duplicates removed.
    pub fn report_windows(&self) -> Vec<u32> {
        let mut windows = Vec::with_capacity(self.windows.len() + 1);
        for days in self.windows.iter().copied().chain(std::iter::once(self.days)) {
            if !windows.contains(&days) {
                windows.push(days);
            }
        }
        windows
    }
}

/// Parse a comma-separated list of day counts.
pub fn parse_windows(s: &str) -> Option<Vec<u32>> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<u32>().ok())
        .collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}
