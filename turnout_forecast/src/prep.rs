//! Training-set preparation
//!
//! Turns one raw [`Series`] into the points the model is fitted on: excluded
//! seasons are removed first, then missing values are dropped. A pair with
//! fewer usable points than the configured threshold is not forecast.

use std::collections::BTreeSet;

use crate::config::ForecastConfig;
use crate::data::Series;
use crate::pipeline::SkipReason;

/// Chronological values a model is fitted on
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    entity: String,
    metric: String,
    periods: Vec<i32>,
    values: Vec<f64>,
}

impl TrainingSet {
    /// Build a training set from (period, value) pairs already in period order
    pub fn new(entity: impl Into<String>, metric: impl Into<String>, points: &[(i32, f64)]) -> Self {
        Self {
            entity: entity.into(),
            metric: metric.into(),
            periods: points.iter().map(|(p, _)| *p).collect(),
            values: points.iter().map(|(_, v)| *v).collect(),
        }
    }

    /// Entity the values belong to
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Metric the values measure
    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Training periods
    pub fn periods(&self) -> &[i32] {
        &self.periods
    }

    /// Training values, aligned with `periods`
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Last period used for training
    pub fn last_period(&self) -> Option<i32> {
        self.periods.last().copied()
    }

    /// Number of training points
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no points survived preparation
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Filters series into training sets and decides forecast eligibility
#[derive(Debug, Clone)]
pub struct TimeSeriesPreparer {
    excluded_periods: BTreeSet<i32>,
    min_points: usize,
}

impl TimeSeriesPreparer {
    /// Create a preparer excluding `excluded_periods` and requiring `min_points`
    pub fn new(excluded_periods: BTreeSet<i32>, min_points: usize) -> Self {
        Self {
            excluded_periods,
            min_points,
        }
    }

    /// Create a preparer from run configuration
    pub fn from_config(config: &ForecastConfig) -> Self {
        Self::new(config.excluded_periods.clone(), config.min_training_points)
    }

    /// Periods removed from training
    pub fn excluded_periods(&self) -> &BTreeSet<i32> {
        &self.excluded_periods
    }

    /// Minimum number of training points
    pub fn min_points(&self) -> usize {
        self.min_points
    }

    /// Remove excluded periods, then drop missing values
    pub fn training_set(&self, series: &Series) -> TrainingSet {
        let points: Vec<(i32, f64)> = series
            .points()
            .iter()
            .filter(|(period, _)| !self.excluded_periods.contains(period))
            .filter_map(|(period, value)| value.map(|v| (*period, v)))
            .collect();

        TrainingSet::new(series.entity(), series.metric(), &points)
    }

    /// Prepare a training set, or say why the pair cannot be forecast
    pub fn prepare(&self, series: &Series) -> Result<TrainingSet, SkipReason> {
        let training = self.training_set(series);
        if training.len() < self.min_points {
            return Err(SkipReason::InsufficientData {
                needed: self.min_points,
                got: training.len(),
            });
        }

        Ok(training)
    }
}
