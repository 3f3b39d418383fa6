//! Stats module - Trend estimation

mod trend;

pub use trend::{TrendEstimator, TrendFit, MIN_DISTINCT_YEARS, SIGNIFICANCE_THRESHOLD};
