//! Run configuration for the forecasting pipeline
//!
//! Every domain constant (forecast seasons, excluded seasons, tracked metrics,
//! thresholds, interval settings) lives here so a run can be overridden from
//! TOML or built directly in tests.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use turnout_math::NelderMead;

use crate::intervals::ClampRange;

/// Fewest points the trend model can be estimated from
pub const MIN_SUPPORTED_TRAINING_POINTS: usize = 2;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Settings for the smoothing-parameter search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Iteration cap for the simplex search
    pub max_iterations: usize,
    /// Convergence tolerance on objective spread and simplex size
    pub tolerance: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5000,
            tolerance: 1e-10,
        }
    }
}

impl OptimizerConfig {
    /// Build the minimiser described by these settings
    pub fn build(&self) -> Result<NelderMead, ConfigError> {
        NelderMead::new(self.max_iterations, self.tolerance)
            .map_err(|e| ConfigError::Validation(format!("optimizer: {}", e)))
    }
}

/// Forecasting run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Seasons to forecast, in order; the horizon is their count
    pub forecast_periods: Vec<i32>,
    /// Seasons left out of model training (still reported historically)
    pub excluded_periods: BTreeSet<i32>,
    /// Metric columns to forecast
    pub metrics: Vec<String>,
    /// Minimum usable training points for a pair to be forecast
    pub min_training_points: usize,
    /// Multiplier applied to the step standard error
    pub confidence_multiplier: f64,
    /// Lower clamp for interval bounds
    pub clamp_min: f64,
    /// Upper clamp for interval bounds
    pub clamp_max: f64,
    /// Emit historical rows for pairs that could not be forecast
    pub emit_history_for_skipped: bool,
    /// Evaluate pairs on a worker pool (needs the `parallel` feature)
    pub parallel: bool,
    /// Parameter search settings
    pub optimizer: OptimizerConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            forecast_periods: (2025..=2029).collect(),
            excluded_periods: BTreeSet::from([2020]),
            metrics: vec![
                "home_avg".to_string(),
                "road_avg".to_string(),
                "overall_avg".to_string(),
            ],
            min_training_points: 3,
            confidence_multiplier: 1.96,
            clamp_min: 0.0,
            clamp_max: 200_000.0,
            emit_history_for_skipped: false,
            parallel: false,
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl FromStr for ForecastConfig {
    type Err = ConfigError;

    /// Parse and validate configuration from a TOML string
    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        let config: ForecastConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }
}

impl ForecastConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        contents.parse()
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Replace the confidence multiplier with the two-sided normal quantile
    /// for `level` (0.95 gives ~1.96).
    pub fn with_confidence_level(mut self, level: f64) -> Result<Self, ConfigError> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ConfigError::Validation(format!(
                "Confidence level must be between 0 and 1 (exclusive), got {}",
                level
            )));
        }

        let normal = Normal::new(0.0, 1.0).map_err(|e| ConfigError::Validation(e.to_string()))?;
        self.confidence_multiplier = normal.inverse_cdf(0.5 + level / 2.0);
        Ok(self)
    }

    /// Number of forecast steps
    pub fn horizon(&self) -> usize {
        self.forecast_periods.len()
    }

    /// Clamp range for interval bounds
    pub fn clamp_range(&self) -> Result<ClampRange, ConfigError> {
        ClampRange::new(self.clamp_min, self.clamp_max)
            .map_err(|e| ConfigError::Validation(e.to_string()))
    }

    /// Validate the configuration for consistency and completeness
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.forecast_periods.is_empty() {
            return Err(ConfigError::Validation(
                "forecast_periods must name at least one season".into(),
            ));
        }
        if self.forecast_periods.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ConfigError::Validation(
                "forecast_periods must be strictly increasing".into(),
            ));
        }
        if self.metrics.is_empty() {
            return Err(ConfigError::Validation(
                "metrics must name at least one column".into(),
            ));
        }
        let mut seen = BTreeSet::new();
        for metric in &self.metrics {
            if metric.trim().is_empty() {
                return Err(ConfigError::Validation("metric names must not be blank".into()));
            }
            if !seen.insert(metric.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "metric '{}' is listed more than once",
                    metric
                )));
            }
        }
        if self.min_training_points < MIN_SUPPORTED_TRAINING_POINTS {
            return Err(ConfigError::Validation(format!(
                "min_training_points must be at least {}, got {}",
                MIN_SUPPORTED_TRAINING_POINTS, self.min_training_points
            )));
        }
        if !(self.confidence_multiplier > 0.0 && self.confidence_multiplier.is_finite()) {
            return Err(ConfigError::Validation(format!(
                "confidence_multiplier must be positive and finite, got {}",
                self.confidence_multiplier
            )));
        }
        self.clamp_range()?;
        self.optimizer.build()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_match_domain_constants() {
        let config = ForecastConfig::default();
        assert_eq!(config.forecast_periods, vec![2025, 2026, 2027, 2028, 2029]);
        assert_eq!(config.horizon(), 5);
        assert!(config.excluded_periods.contains(&2020));
        assert_eq!(config.metrics, vec!["home_avg", "road_avg", "overall_avg"]);
        assert_eq!(config.min_training_points, 3);
        assert_relative_eq!(config.confidence_multiplier, 1.96);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ForecastConfig = r#"
            forecast_periods = [2025, 2026]
            excluded_periods = []

            [optimizer]
            max_iterations = 200
        "#
        .parse()
        .unwrap();

        assert_eq!(config.horizon(), 2);
        assert!(config.excluded_periods.is_empty());
        assert_eq!(config.optimizer.max_iterations, 200);
        assert_relative_eq!(config.optimizer.tolerance, 1e-10);
        assert_eq!(config.metrics.len(), 3);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = "horizon = 5".parse::<ForecastConfig>();
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ForecastConfig::default();
        let text = config.to_toml_string().unwrap();
        let parsed: ForecastConfig = text.parse().unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validation_failures() {
        let cases = [
            ForecastConfig {
                forecast_periods: vec![],
                ..Default::default()
            },
            ForecastConfig {
                forecast_periods: vec![2026, 2025],
                ..Default::default()
            },
            ForecastConfig {
                metrics: vec![],
                ..Default::default()
            },
            ForecastConfig {
                metrics: vec!["home_avg".into(), "home_avg".into()],
                ..Default::default()
            },
            ForecastConfig {
                min_training_points: 1,
                ..Default::default()
            },
            ForecastConfig {
                confidence_multiplier: 0.0,
                ..Default::default()
            },
            ForecastConfig {
                clamp_min: 10.0,
                clamp_max: 5.0,
                ..Default::default()
            },
            ForecastConfig {
                optimizer: OptimizerConfig {
                    max_iterations: 0,
                    tolerance: 1e-8,
                },
                ..Default::default()
            },
        ];

        for config in cases {
            assert!(
                matches!(config.validate(), Err(ConfigError::Validation(_))),
                "expected validation failure for {:?}",
                config
            );
        }
    }

    #[test]
    fn test_confidence_level_to_multiplier() {
        let config = ForecastConfig::default().with_confidence_level(0.95).unwrap();
        assert_relative_eq!(config.confidence_multiplier, 1.959964, epsilon = 1e-5);

        let config = ForecastConfig::default().with_confidence_level(0.80).unwrap();
        assert_relative_eq!(config.confidence_multiplier, 1.281552, epsilon = 1e-5);

        assert!(ForecastConfig::default().with_confidence_level(1.0).is_err());
    }

    #[test]
    fn test_from_missing_file() {
        let result = ForecastConfig::from_file("/nonexistent/turnout.toml");
        assert!(matches!(result, Err(ConfigError::Io(_, _))));
    }
}
