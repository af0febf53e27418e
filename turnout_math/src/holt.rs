//! Holt's linear trend method (additive-trend exponential smoothing)
//!
//! Recursion, starting from an explicit initial level `l0` and trend `b0`:
//! - One-step forecast: `y_hat(t) = l(t-1) + b(t-1)`
//! - Level: `l(t) = alpha * y(t) + (1 - alpha) * (l(t-1) + b(t-1))`
//! - Trend: `b(t) = beta * (l(t) - l(t-1)) + (1 - beta) * b(t-1)`
//! - h-step forecast: `y_hat(T+h) = l(T) + h * b(T)`

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Number of leading observations used for the heuristic initial state
const INITIAL_WINDOW: usize = 10;

/// Smoothing parameters together with the state the recursion starts from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoltParams {
    /// Level smoothing parameter in [0, 1]
    pub alpha: f64,
    /// Trend smoothing parameter in [0, 1]
    pub beta: f64,
    /// Level before the first observation
    pub initial_level: f64,
    /// Trend before the first observation
    pub initial_trend: f64,
}

impl HoltParams {
    /// Create a validated parameter set
    pub fn new(alpha: f64, beta: f64, initial_level: f64, initial_trend: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(MathError::InvalidInput(format!(
                "Alpha must be between 0 and 1 (inclusive), got {}",
                alpha
            )));
        }
        if !(0.0..=1.0).contains(&beta) {
            return Err(MathError::InvalidInput(format!(
                "Beta must be between 0 and 1 (inclusive), got {}",
                beta
            )));
        }
        if !initial_level.is_finite() || !initial_trend.is_finite() {
            return Err(MathError::InvalidInput(
                "Initial level and trend must be finite".to_string(),
            ));
        }

        Ok(Self {
            alpha,
            beta,
            initial_level,
            initial_trend,
        })
    }
}

/// Double Exponential Smoothing (Holt's Method) state
#[derive(Debug, Clone)]
pub struct DoubleExponentialSmoothing {
    alpha: f64,
    beta: f64,
    level: f64,
    trend: f64,
    values_seen: usize,
}

impl DoubleExponentialSmoothing {
    /// Start the recursion from the initial state carried by `params`
    pub fn new(params: &HoltParams) -> Self {
        Self {
            alpha: params.alpha,
            beta: params.beta,
            level: params.initial_level,
            trend: params.initial_trend,
            values_seen: 0,
        }
    }

    /// Feed one observation and return the one-step forecast that was made for it
    pub fn update(&mut self, value: f64) -> Result<f64> {
        if !value.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "Observation {} is not finite: {}",
                self.values_seen, value
            )));
        }

        let predicted = self.level + self.trend;
        let prev_level = self.level;

        self.level = self.alpha * value + (1.0 - self.alpha) * predicted;
        self.trend = self.beta * (self.level - prev_level) + (1.0 - self.beta) * self.trend;
        self.values_seen += 1;

        Ok(predicted)
    }

    /// Forecast h steps past the last observation
    pub fn forecast(&self, h: usize) -> f64 {
        self.level + (h as f64) * self.trend
    }

    /// Get the current level
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Get the current trend
    pub fn trend(&self) -> f64 {
        self.trend
    }

    /// Number of observations consumed so far
    pub fn values_seen(&self) -> usize {
        self.values_seen
    }
}

/// In-sample pass of the recursion over a whole series
#[derive(Debug, Clone)]
pub struct HoltFit {
    /// One-step-ahead fitted values, aligned with the input
    pub fitted: Vec<f64>,
    /// Residuals `actual - fitted`
    pub residuals: Vec<f64>,
    /// Level after the last observation
    pub level: f64,
    /// Trend after the last observation
    pub trend: f64,
    /// Sum of squared residuals
    pub sse: f64,
}

/// Run the recursion over `values`, collecting fitted values and residuals
pub fn fit(values: &[f64], params: &HoltParams) -> Result<HoltFit> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot run Holt recursion on an empty series".to_string(),
        ));
    }

    let mut state = DoubleExponentialSmoothing::new(params);
    let mut fitted = Vec::with_capacity(values.len());
    let mut residuals = Vec::with_capacity(values.len());
    let mut sse = 0.0;

    for &value in values {
        let predicted = state.update(value)?;
        let residual = value - predicted;
        sse += residual * residual;
        fitted.push(predicted);
        residuals.push(residual);
    }

    Ok(HoltFit {
        fitted,
        residuals,
        level: state.level(),
        trend: state.trend(),
        sse,
    })
}

/// Sum of squared one-step errors, the objective minimised during estimation.
///
/// Returns `f64::INFINITY` instead of an error so it can be handed straight
/// to an optimiser; non-finite values only come out of non-finite inputs.
pub fn sse(values: &[f64], alpha: f64, beta: f64, initial_level: f64, initial_trend: f64) -> f64 {
    let mut level = initial_level;
    let mut trend = initial_trend;
    let mut total = 0.0;

    for &value in values {
        let predicted = level + trend;
        let error = value - predicted;
        total += error * error;

        let prev_level = level;
        level = alpha * value + (1.0 - alpha) * predicted;
        trend = beta * (level - prev_level) + (1.0 - beta) * trend;
    }

    if total.is_finite() {
        total
    } else {
        f64::INFINITY
    }
}

/// Heuristic starting state: mean first difference over the leading window as
/// the trend, and a level placed one trend step before the first value so the
/// first one-step forecast reproduces it.
pub fn initial_state(values: &[f64]) -> Result<(f64, f64)> {
    match values {
        [] => Err(MathError::InsufficientData(
            "Need at least one value to initialise level".to_string(),
        )),
        [only] => Ok((*only, 0.0)),
        _ => {
            let window = &values[..values.len().min(INITIAL_WINDOW)];
            let steps = (window.len() - 1) as f64;
            let trend = (window[window.len() - 1] - window[0]) / steps;
            Ok((values[0] - trend, trend))
        }
    }
}
