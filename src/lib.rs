//! Test trend analyzer library.
//!
//! This library provides result ingestion, build aggregation, trend analysis
//! and report generation for historical test runs.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
