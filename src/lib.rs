//! CTDC Report - exploratory report over trafficking case registrations.
//!
//! The pipeline runs once per invocation:
//! load ([`data::CaseLoader`]) → project and clean ([`data::DataProcessor`]) →
//! aggregate ([`data::Aggregator`]) → render ([`charts::ChartRenderer`]) and
//! fit the yearly trend ([`stats::TrendEstimator`]).
//! [`report::run`] wires the stages together.

pub mod charts;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod report;
pub mod stats;

pub use config::{MissingGenderPolicy, ReportConfig};
pub use error::{ReportError, Result, Stage};
