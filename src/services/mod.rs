//! Ingestion, analysis and reporting services.

pub mod aggregation;
pub mod charts;
pub mod classifier;
pub mod extraction;
pub mod history;
pub mod report;
pub mod trends;

pub use charts::{ChartSeries, ChartSink, NoopChartSink, SvgChartSink};
pub use trends::TrendAnalyzer;
