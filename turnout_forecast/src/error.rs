//! Error types for the turnout_forecast crate

use crate::config::ConfigError;
use thiserror::Error;

/// Custom error types for the turnout_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A tracked metric column is absent from the input table
    #[error("Missing metric column: {0}")]
    MissingMetricColumn(String),

    /// A structural column (entity or period) is absent from the input table
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// The input table has no rows
    #[error("Input contains no rows")]
    EmptyInput,

    /// A row violates the input contract
    #[error("Malformed input row {row}: {message}")]
    MalformedRow { row: usize, message: String },

    /// The same entity appears twice for one period
    #[error("Duplicate record for '{entity}' in period {period}")]
    DuplicateRecord { entity: String, period: i32 },

    /// Too few usable points to fit a model
    #[error("Insufficient data: need {needed} training points, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The smoothing model could not be estimated
    #[error("Model fit failure: {0}")]
    ModelFitFailure(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from configuration loading
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from reading or writing CSV output
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from writing the JSON run report
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ForecastError {
    /// Whether this error only concerns a single entity/metric pair.
    ///
    /// Pair-level errors are turned into skips by the pipeline; everything
    /// else aborts the run.
    pub fn is_pair_level(&self) -> bool {
        matches!(
            self,
            ForecastError::InsufficientData { .. } | ForecastError::ModelFitFailure(_)
        )
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<polars::prelude::PolarsError> for ForecastError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<turnout_math::MathError> for ForecastError {
    fn from(err: turnout_math::MathError) -> Self {
        ForecastError::ModelFitFailure(err.to_string())
    }
}
