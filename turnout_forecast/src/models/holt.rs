//! Holt's linear trend model with estimated parameters
//!
//! Smoothing parameters and the initial level/trend are chosen together by
//! minimising the in-sample sum of squared one-step errors.

use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use crate::prep::TrainingSet;
use tracing::debug;
use turnout_math::holt::{self, HoltFit, HoltParams};
use turnout_math::NelderMead;

const START_ALPHA: f64 = 0.5;
const START_BETA: f64 = 0.05;
/// Initial simplex edges for (alpha, beta, level offset, trend offset)
const SIMPLEX_STEPS: [f64; 4] = [0.1, 0.05, 0.1, 0.1];
const UNIT: (f64, f64) = (0.0, 1.0);
const FREE: (f64, f64) = (f64::NEG_INFINITY, f64::INFINITY);

/// How the smoothing parameters are obtained
#[derive(Debug, Clone, Copy, PartialEq)]
enum Estimation {
    /// Search alpha, beta and the initial state
    Optimized(NelderMead),
    /// Use fixed alpha/beta with the heuristic initial state
    Fixed { alpha: f64, beta: f64 },
}

/// Additive-trend exponential smoothing (no seasonal component)
#[derive(Debug, Clone)]
pub struct HoltLinear {
    /// Name of the model
    name: String,
    estimation: Estimation,
}

/// Trained Holt model
#[derive(Debug, Clone)]
pub struct TrainedHoltLinear {
    /// Name of the model
    name: String,
    /// Estimated parameters and initial state
    params: HoltParams,
    /// In-sample pass with the estimated parameters
    fit: HoltFit,
    /// Optimiser iterations used (zero for fixed parameters)
    iterations: usize,
}

impl HoltLinear {
    /// Create a model whose parameters are estimated with `optimizer`
    pub fn estimated(optimizer: NelderMead) -> Self {
        Self {
            name: "Holt Linear (estimated)".to_string(),
            estimation: Estimation::Optimized(optimizer),
        }
    }

    /// Create a model with fixed smoothing parameters
    pub fn with_smoothing(alpha: f64, beta: f64) -> Result<Self> {
        HoltParams::new(alpha, beta, 0.0, 0.0)
            .map_err(|e| ForecastError::ValidationError(e.to_string()))?;

        Ok(Self {
            name: format!("Holt Linear (alpha={}, beta={})", alpha, beta),
            estimation: Estimation::Fixed { alpha, beta },
        })
    }

    fn optimize(optimizer: &NelderMead, values: &[f64]) -> Result<(HoltParams, usize)> {
        let (level0, trend0) = holt::initial_state(values)?;
        let scale = series_scale(values);

        let objective = |p: &[f64]| {
            holt::sse(values, p[0], p[1], level0 + scale * p[2], trend0 + scale * p[3])
        };
        let minimum = optimizer.minimize(
            objective,
            &[START_ALPHA, START_BETA, 0.0, 0.0],
            &SIMPLEX_STEPS,
            &[UNIT, UNIT, FREE, FREE],
        )?;

        if !minimum.converged {
            return Err(ForecastError::ModelFitFailure(format!(
                "parameter search did not converge after {} iterations",
                minimum.iterations
            )));
        }
        if !minimum.value.is_finite() || minimum.point.iter().any(|p| !p.is_finite()) {
            return Err(ForecastError::ModelFitFailure(
                "parameter search produced non-finite estimates".to_string(),
            ));
        }

        let p = &minimum.point;
        let params = HoltParams::new(p[0], p[1], level0 + scale * p[2], trend0 + scale * p[3])?;
        Ok((params, minimum.iterations))
    }
}

/// Unit used to search the initial state, so the simplex works on values of
/// order one whatever the magnitude of the series.
fn series_scale(values: &[f64]) -> f64 {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let mean_abs = values.iter().map(|v| v.abs()).sum::<f64>() / values.len() as f64;

    (max - min).max(0.01 * mean_abs).max(1.0)
}

impl ForecastModel for HoltLinear {
    type Trained = TrainedHoltLinear;

    fn train(&self, data: &TrainingSet) -> Result<Self::Trained> {
        let values = data.values();
        if values.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: values.len(),
            });
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::ModelFitFailure(format!(
                "value for period {} is not finite",
                data.periods()[i]
            )));
        }

        let (params, iterations) = match &self.estimation {
            Estimation::Optimized(optimizer) => Self::optimize(optimizer, values)?,
            Estimation::Fixed { alpha, beta } => {
                let (level0, trend0) = holt::initial_state(values)?;
                (HoltParams::new(*alpha, *beta, level0, trend0)?, 0)
            }
        };

        let fit = holt::fit(values, &params)?;
        if !fit.sse.is_finite() || !fit.level.is_finite() || !fit.trend.is_finite() {
            return Err(ForecastError::ModelFitFailure(
                "fitted state is not finite".to_string(),
            ));
        }

        debug!(
            entity = data.entity(),
            metric = data.metric(),
            alpha = params.alpha,
            beta = params.beta,
            sse = fit.sse,
            iterations,
            "fitted Holt model"
        );

        Ok(TrainedHoltLinear {
            name: self.name.clone(),
            params,
            fit,
            iterations,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedHoltLinear {
    /// Estimated parameters and initial state
    pub fn params(&self) -> &HoltParams {
        &self.params
    }

    /// Level after the last training point
    pub fn level(&self) -> f64 {
        self.fit.level
    }

    /// Trend after the last training point
    pub fn trend(&self) -> f64 {
        self.fit.trend
    }

    /// In-sample sum of squared errors
    pub fn sse(&self) -> f64 {
        self.fit.sse
    }

    /// Optimiser iterations used
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

impl TrainedForecastModel for TrainedHoltLinear {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        let values = (1..=horizon)
            .map(|h| self.fit.level + h as f64 * self.fit.trend)
            .collect();

        ForecastResult::new(values, horizon)
    }

    fn fitted_values(&self) -> &[f64] {
        &self.fit.fitted
    }

    fn residuals(&self) -> &[f64] {
        &self.fit.residuals
    }

    fn name(&self) -> &str {
        &self.name
    }
}
