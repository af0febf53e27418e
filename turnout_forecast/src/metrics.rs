//! In-sample accuracy of a fitted model

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// Accuracy of one-step-ahead fitted values against the training data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error, over non-zero actuals
    pub mape: f64,
}

/// Calculate accuracy metrics for fitted vs actual values
pub fn fit_accuracy(actual: &[f64], fitted: &[f64]) -> Result<FitAccuracy> {
    if actual.len() != fitted.len() || actual.is_empty() {
        return Err(ForecastError::ValidationError(
            "Fitted and actual values must have the same non-zero length".to_string(),
        ));
    }

    let n = actual.len() as f64;

    let errors: Vec<f64> = actual
        .iter()
        .zip(fitted.iter())
        .map(|(&a, &f)| a - f)
        .collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let rmse = (errors.iter().map(|e| e.powi(2)).sum::<f64>() / n).sqrt();

    let (pct_sum, pct_count) = actual
        .iter()
        .zip(errors.iter())
        .filter(|(&a, _)| a != 0.0)
        .fold((0.0, 0usize), |(sum, count), (&a, &e)| {
            (sum + (e.abs() / a.abs()) * 100.0, count + 1)
        });
    let mape = if pct_count > 0 {
        pct_sum / pct_count as f64
    } else {
        0.0
    };

    Ok(FitAccuracy { mae, rmse, mape })
}

impl std::fmt::Display for FitAccuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MAE {:.2}, RMSE {:.2}, MAPE {:.2}%",
            self.mae, self.rmse, self.mape
        )
    }
}
