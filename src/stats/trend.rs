//! Trend Estimator Module
//! Ordinary least squares fit of yearly case counts against registration year.

use crate::data::YearCount;
use crate::error::{ReportError, Result, Stage};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::collections::BTreeSet;

/// Default significance threshold for the slope test
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Fewest distinct years a fit is computed from.
pub const MIN_DISTINCT_YEARS: usize = 3;

/// Fitted line `count = slope * year + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendFit {
    pub intercept: f64,
    pub slope: f64,
    pub slope_std_error: f64,
    pub t_statistic: f64,
    /// Two-sided p-value for slope = 0.
    pub p_value: f64,
    pub r_squared: f64,
    pub observations: usize,
    pub degrees_of_freedom: usize,
}

impl TrendFit {
    pub fn predict(&self, year: f64) -> f64 {
        self.slope * year + self.intercept
    }

    /// Whether the slope differs from zero at level `alpha`.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

pub struct TrendEstimator;

impl TrendEstimator {
    /// Fit count ~ year over the given observations.
    pub fn fit(points: &[YearCount]) -> Result<TrendFit> {
        let distinct: BTreeSet<i64> = points.iter().map(|p| p.year).collect();
        if distinct.len() < MIN_DISTINCT_YEARS {
            return Err(ReportError::InsufficientData {
                stage: Stage::Trend,
                observed: distinct.len(),
                required: MIN_DISTINCT_YEARS,
            });
        }

        let n = points.len() as f64;
        let xs: Vec<f64> = points.iter().map(|p| p.year as f64).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.count as f64).collect();
        let x_mean = xs.iter().sum::<f64>() / n;
        let y_mean = ys.iter().sum::<f64>() / n;

        // Centred sums keep the year magnitude out of the squares
        let sxx: f64 = xs.iter().map(|x| (x - x_mean).powi(2)).sum();
        let sxy: f64 = xs
            .iter()
            .zip(&ys)
            .map(|(x, y)| (x - x_mean) * (y - y_mean))
            .sum();
        let syy: f64 = ys.iter().map(|y| (y - y_mean).powi(2)).sum();

        let slope = sxy / sxx;
        let intercept = y_mean - slope * x_mean;

        let ssr: f64 = xs
            .iter()
            .zip(&ys)
            .map(|(x, y)| (y - (slope * x + intercept)).powi(2))
            .sum();
        let df = points.len() - 2;
        let slope_std_error = (ssr / df as f64 / sxx).sqrt();
        let r_squared = if syy > 0.0 { 1.0 - ssr / syy } else { 1.0 };

        let (t_statistic, p_value) = Self::slope_test(slope, slope_std_error, df);

        Ok(TrendFit {
            intercept,
            slope,
            slope_std_error,
            t_statistic,
            p_value,
            r_squared,
            observations: points.len(),
            degrees_of_freedom: df,
        })
    }

    /// t statistic and two-sided p-value for slope = 0.
    fn slope_test(slope: f64, std_error: f64, df: usize) -> (f64, f64) {
        if std_error == 0.0 {
            // Exact fit
            return if slope == 0.0 {
                (0.0, 1.0)
            } else {
                (f64::INFINITY.copysign(slope), 0.0)
            };
        }

        let t = slope / std_error;
        if let Ok(dist) = StudentsT::new(0.0, 1.0, df as f64) {
            let p_value = 2.0 * (1.0 - dist.cdf(t.abs()));
            (t, p_value.clamp(0.0, 1.0))
        } else {
            (t, f64::NAN)
        }
    }
}
