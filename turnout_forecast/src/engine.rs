//! Forecast engine: fit, extrapolate and bound one training set

use tracing::{debug, warn};

use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::intervals::{self, ClampRange, ForecastPoint};
use crate::metrics::{fit_accuracy, FitAccuracy};
use crate::models::holt::HoltLinear;
use crate::models::{ForecastModel, TrainedForecastModel};
use crate::prep::TrainingSet;

/// Forecast of one entity/metric pair
#[derive(Debug, Clone, PartialEq)]
pub struct PairForecast {
    /// One point per configured forecast period
    pub points: Vec<ForecastPoint>,
    /// Population standard deviation of the in-sample residuals
    pub residual_std: f64,
    /// In-sample accuracy of the fitted model
    pub accuracy: FitAccuracy,
}

/// Fits a model per training set and turns it into bounded forecast points
#[derive(Debug, Clone)]
pub struct ForecastEngine<M: ForecastModel = HoltLinear> {
    model: M,
    forecast_periods: Vec<i32>,
    confidence_multiplier: f64,
    clamp: ClampRange,
}

impl ForecastEngine<HoltLinear> {
    /// Create the Holt engine described by `config`
    pub fn from_config(config: &ForecastConfig) -> Result<Self> {
        config.validate()?;
        let model = HoltLinear::estimated(config.optimizer.build()?);
        Self::new(model, config)
    }
}

impl<M: ForecastModel> ForecastEngine<M> {
    /// Create an engine around `model`, taking horizon and interval settings from `config`
    pub fn new(model: M, config: &ForecastConfig) -> Result<Self> {
        if config.forecast_periods.is_empty() {
            return Err(ForecastError::ValidationError(
                "At least one forecast period is required".to_string(),
            ));
        }

        Ok(Self {
            model,
            forecast_periods: config.forecast_periods.clone(),
            confidence_multiplier: config.confidence_multiplier,
            clamp: config.clamp_range()?,
        })
    }

    /// Number of forecast steps
    pub fn horizon(&self) -> usize {
        self.forecast_periods.len()
    }

    /// Periods the forecast points are aligned with
    pub fn forecast_periods(&self) -> &[i32] {
        &self.forecast_periods
    }

    /// The untrained model
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Fit the model on `training` and produce one bounded point per forecast period.
    ///
    /// Step `i` (1-based) gets bounds `estimate ± z * residual_std * sqrt(i)`,
    /// each clamped independently.
    pub fn forecast(&self, training: &TrainingSet) -> Result<PairForecast> {
        if let (Some(last), Some(first)) = (training.last_period(), self.forecast_periods.first()) {
            if *first <= last {
                warn!(
                    entity = training.entity(),
                    metric = training.metric(),
                    last_training_period = last,
                    first_forecast_period = *first,
                    "forecast periods overlap training data"
                );
            }
        }

        let trained = self.model.train(training)?;
        let forecast = trained.forecast(self.horizon())?;
        let residual_std = intervals::residual_std(trained.residuals())?;
        let accuracy = fit_accuracy(training.values(), trained.fitted_values())?;

        let points: Vec<ForecastPoint> = self
            .forecast_periods
            .iter()
            .zip(forecast.values())
            .enumerate()
            .map(|(i, (&period, &estimate))| {
                intervals::forecast_point(
                    period,
                    estimate,
                    i + 1,
                    residual_std,
                    self.confidence_multiplier,
                    &self.clamp,
                )
            })
            .collect();

        debug!(
            entity = training.entity(),
            metric = training.metric(),
            model = trained.name(),
            residual_std,
            rmse = accuracy.rmse,
            "forecast complete"
        );

        Ok(PairForecast {
            points,
            residual_std,
            accuracy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn training(start: i32, values: &[f64]) -> TrainingSet {
        let points: Vec<(i32, f64)> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + i as i32, *v))
            .collect();
        TrainingSet::new("Alpha", "overall_avg", &points)
    }

    fn engine() -> ForecastEngine {
        ForecastEngine::from_config(&ForecastConfig::default()).unwrap()
    }

    #[test]
    fn test_points_align_with_forecast_periods() {
        let values: Vec<f64> = (0..10).map(|i| 60_000.0 + 250.0 * i as f64).collect();
        let forecast = engine().forecast(&training(2015, &values)).unwrap();

        let periods: Vec<i32> = forecast.points.iter().map(|p| p.period).collect();
        assert_eq!(periods, vec![2025, 2026, 2027, 2028, 2029]);
    }

    #[test]
    fn test_noisy_series_bounds_are_ordered_and_widen() {
        let mut rng = StdRng::seed_from_u64(42);
        let noise = Normal::new(0.0, 900.0).unwrap();
        let values: Vec<f64> = (0..18)
            .map(|i| 62_000.0 + 150.0 * i as f64 + noise.sample(&mut rng))
            .collect();

        let forecast = engine().forecast(&training(2006, &values)).unwrap();
        assert!(forecast.residual_std > 0.0);

        for point in &forecast.points {
            assert!(point.lower <= point.estimate && point.estimate <= point.upper);
            assert!((0.0..=200_000.0).contains(&point.lower));
            assert!((0.0..=200_000.0).contains(&point.upper));
        }
        let widths: Vec<f64> = forecast.points.iter().map(|p| p.upper - p.lower).collect();
        assert!(widths.windows(2).all(|w| w[1] >= w[0]));

        // Unclamped width at step one is 2 * z * residual_std
        assert_relative_eq!(widths[0], 2.0 * 1.96 * forecast.residual_std, epsilon = 1e-6);
    }

    #[test]
    fn test_bounds_clamped_near_zero() {
        let values = [900.0, 400.0, 1_500.0, 200.0, 1_100.0, 300.0];
        let forecast = engine().forecast(&training(2019, &values)).unwrap();

        for point in &forecast.points {
            assert!(point.lower >= 0.0);
            assert!(point.upper <= 200_000.0);
            assert!(point.lower <= point.upper);
        }
    }

    #[test]
    fn test_custom_horizon_and_multiplier() {
        let config = ForecastConfig {
            forecast_periods: vec![2030, 2031],
            confidence_multiplier: 1.0,
            ..Default::default()
        };
        let engine = ForecastEngine::from_config(&config).unwrap();
        assert_eq!(engine.horizon(), 2);

        let values = [10_000.0, 10_400.0, 10_100.0, 10_900.0, 11_000.0];
        let forecast = engine.forecast(&training(2020, &values)).unwrap();
        assert_eq!(forecast.points.len(), 2);

        let first = forecast.points[0];
        assert_relative_eq!(first.upper - first.estimate, forecast.residual_std, epsilon = 1e-6);
    }

    #[test]
    fn test_fit_failure_propagates() {
        let values = [1.0, f64::NAN, 3.0];
        let result = engine().forecast(&training(2020, &values));
        assert!(matches!(result, Err(ForecastError::ModelFitFailure(_))));
    }
}
