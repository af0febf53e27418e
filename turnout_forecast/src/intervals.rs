//! Confidence bounds around forecast points

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::{ForecastError, Result};

/// Closed range interval bounds are clamped into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClampRange {
    min: f64,
    max: f64,
}

impl ClampRange {
    /// Create a clamp range; `min` must not exceed `max`
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ForecastError::ValidationError(format!(
                "Clamp range must be finite with min <= max, got [{}, {}]",
                min, max
            )));
        }

        Ok(Self { min, max })
    }

    /// Lower end of the range
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper end of the range
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Clamp a value into the range
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Whether a value lies inside the range
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// One forecast season with its clamped confidence bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Forecast season
    pub period: i32,
    /// Point estimate (not clamped)
    pub estimate: f64,
    /// Clamped lower bound
    pub lower: f64,
    /// Clamped upper bound
    pub upper: f64,
}

/// Population standard deviation of in-sample residuals
pub fn residual_std(residuals: &[f64]) -> Result<f64> {
    if residuals.is_empty() {
        return Err(ForecastError::ModelFitFailure(
            "No residuals to estimate spread from".to_string(),
        ));
    }

    let std = residuals.population_std_dev();
    if !std.is_finite() {
        return Err(ForecastError::ModelFitFailure(format!(
            "Residual standard deviation is not finite: {}",
            std
        )));
    }

    Ok(std)
}

/// Standard error at forecast step `step` (1-based).
///
/// Treats per-step errors as independent, so variance grows linearly with the
/// step and the error with its square root.
pub fn step_standard_error(residual_std: f64, step: usize) -> f64 {
    (residual_std.powi(2) * step as f64).sqrt()
}

/// Build the clamped forecast point for `step`
pub fn forecast_point(
    period: i32,
    estimate: f64,
    step: usize,
    residual_std: f64,
    multiplier: f64,
    range: &ClampRange,
) -> ForecastPoint {
    let margin = multiplier * step_standard_error(residual_std, step);

    ForecastPoint {
        period,
        estimate,
        lower: range.clamp(estimate - margin),
        upper: range.clamp(estimate + margin),
    }
}
