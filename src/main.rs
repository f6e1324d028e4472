//! Test trend analyzer - Main entry point.
//!
//! Loads Allure results and history, analyzes trends and writes reports.

use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use test_trends_lib::config::{Config, ConfigError, OutputFormat, parse_windows};
use test_trends_lib::models::window_label;
use test_trends_lib::services::{
    ChartSink, NoopChartSink, SvgChartSink, TrendAnalyzer, charts, extraction, history, report,
};

/// Analyze test result trends across builds.
#[derive(Debug, Parser)]
#[command(name = "test-trends", version, about)]
struct Cli {
    /// Results directory containing *-result.json files
    #[arg(long)]
    results: Option<PathBuf>,

    /// History directory containing history.json
    #[arg(long)]
    history: Option<PathBuf>,

    /// Output directory
    #[arg(long)]
    output: Option<PathBuf>,

    /// Project name
    #[arg(long)]
    project: Option<String>,

    /// Framework used when a result carries no framework label
    #[arg(long)]
    framework: Option<String>,

    /// Output format
    #[arg(long, value_parser = ["json", "html", "all"])]
    format: Option<String>,

    /// Days to analyze for the HTML report and console summary
    #[arg(long)]
    days: Option<u32>,

    /// Comma-separated report windows in days
    #[arg(long)]
    windows: Option<String>,

    /// Generate trend charts
    #[arg(long)]
    charts: bool,

    /// Verbose output
    #[arg(long, short)]
    verbose: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the environment configuration.
    fn apply(self, config: &mut Config) -> Result<(), ConfigError> {
        if let Some(results) = self.results {
            config.results_dir = results;
        }
        if let Some(history) = self.history {
            config.history_dir = history;
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }
        if let Some(project) = self.project {
            config.project = project;
        }
        if let Some(framework) = self.framework {
            config.framework = framework;
        }
        if let Some(format) = self.format {
            config.format = OutputFormat::parse(&format)
                .ok_or(ConfigError::InvalidValue("--format must be json, html or all"))?;
        }
        if let Some(days) = self.days {
            config.days = days;
        }
        if let Some(windows) = self.windows {
            config.windows = parse_windows(&windows).ok_or(
                ConfigError::InvalidValue("--windows must be a comma-separated list of numbers"),
            )?;
        }
        if self.charts {
            config.charts = true;
        }
        config.validate()
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = cli.apply(&mut config) {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("Starting trend analysis for project: {}", config.project);
    info!("Results directory: {}", config.results_dir.display());
    info!("History directory: {}", config.history_dir.display());
    info!("Output directory: {}", config.output_dir.display());

    let results =
        extraction::load_results_from_directory(&config.results_dir, &config.framework).await;
    let history =
        history::load_history_from_directory(&config.history_dir, &config.framework).await;
    let analyzer = TrendAnalyzer::from_sources(results, history);

    if analyzer.summaries().is_empty() {
        warn!("No build data available for trend analysis");
    }

    let now = Utc::now();
    let primary = window_label(config.days);
    let trend_report = report::build_report(
        &analyzer,
        &config.project,
        &config.framework,
        &config.report_windows(),
        now,
    );

    if let Err(e) =
        report::write_report(&trend_report, &config.output_dir, config.format, &primary).await
    {
        error!("Failed to write report: {}", e);
        std::process::exit(1);
    }

    let sink: Box<dyn ChartSink + Send> = if config.charts {
        Box::new(SvgChartSink)
    } else {
        Box::new(NoopChartSink)
    };
    let series = charts::chart_series(analyzer.summaries());
    if let Err(e) = charts::render_blocking(sink, series, config.output_dir.clone()).await {
        warn!("Chart generation failed: {}", e);
    }

    let metrics = trend_report
        .trends
        .get(&primary)
        .cloned()
        .unwrap_or_else(|| analyzer.analyze_trends_at(now, config.days));

    println!();
    for line in report::summary_lines(&metrics, config.days) {
        println!("{}", line);
    }
}
