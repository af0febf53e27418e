//! # Turnout Math
//!
//! Numeric building blocks for the attendance forecasting workspace:
//! Holt's additive-trend exponential smoothing recursion and a bounded
//! Nelder-Mead minimiser used to estimate its parameters.

use thiserror::Error;

pub mod holt;
pub mod optimize;

pub use holt::{DoubleExponentialSmoothing, HoltFit, HoltParams};
pub use optimize::{Minimum, NelderMead};

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
