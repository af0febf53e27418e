//! Batch forecasting over every entity/metric pair of a table
//!
//! Each pair is prepared and forecast independently. Pairs that lack data or
//! whose model cannot be estimated are skipped and recorded; structural input
//! problems abort the whole run.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, instrument, warn};

use crate::config::ForecastConfig;
use crate::data::{AttendanceTable, Series};
use crate::engine::{ForecastEngine, PairForecast};
use crate::error::{ForecastError, Result};
use crate::output::{ResultTable, RunReport};
use crate::prep::TimeSeriesPreparer;

/// Why a pair produced no forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Fewer usable training points than required
    InsufficientData { needed: usize, got: usize },
    /// The model could not be estimated
    ModelFitFailure { message: String },
}

impl SkipReason {
    /// Stable name of the reason, used for report counts
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::InsufficientData { .. } => "insufficient_data",
            SkipReason::ModelFitFailure { .. } => "model_fit_failure",
        }
    }

    /// Convert a pair-level error into a skip reason.
    ///
    /// Returns the error back when it must abort the run.
    pub fn from_error(error: ForecastError) -> std::result::Result<Self, ForecastError> {
        if !error.is_pair_level() {
            return Err(error);
        }
        match error {
            ForecastError::InsufficientData { needed, got } => {
                Ok(SkipReason::InsufficientData { needed, got })
            }
            ForecastError::ModelFitFailure(message) => Ok(SkipReason::ModelFitFailure { message }),
            other => Err(other),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InsufficientData { needed, got } => {
                write!(f, "insufficient data: need {} training points, got {}", needed, got)
            }
            SkipReason::ModelFitFailure { message } => write!(f, "model fit failure: {}", message),
        }
    }
}

/// Result of evaluating one pair
#[derive(Debug, Clone, PartialEq)]
pub enum PairOutcome {
    Forecast(PairForecast),
    Skipped(SkipReason),
}

impl PairOutcome {
    pub fn is_forecast(&self) -> bool {
        matches!(self, PairOutcome::Forecast(_))
    }
}

/// An evaluated pair together with its full historical series
#[derive(Debug, Clone, PartialEq)]
pub struct PairResult {
    pub series: Series,
    pub outcome: PairOutcome,
}

/// Everything a batch run produces
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub pairs: Vec<PairResult>,
    pub table: ResultTable,
    pub report: RunReport,
}

/// Preparer and engine wired together for a whole table
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    config: ForecastConfig,
    preparer: TimeSeriesPreparer,
    engine: ForecastEngine,
}

impl ForecastPipeline {
    /// Create a pipeline from validated configuration
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        let preparer = TimeSeriesPreparer::from_config(&config);
        let engine = ForecastEngine::from_config(&config)?;

        Ok(Self {
            config,
            preparer,
            engine,
        })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Prepare and forecast a single series.
    ///
    /// Pair-level failures become [`PairOutcome::Skipped`]; any other error
    /// is returned.
    pub fn forecast_pair(&self, series: &Series) -> Result<PairOutcome> {
        let training = match self.preparer.prepare(series) {
            Ok(training) => training,
            Err(reason) => return Ok(PairOutcome::Skipped(reason)),
        };

        match self.engine.forecast(&training) {
            Ok(forecast) => Ok(PairOutcome::Forecast(forecast)),
            Err(error) => SkipReason::from_error(error).map(PairOutcome::Skipped),
        }
    }

    /// Forecast every entity × metric pair of `table` and assemble the output
    #[instrument(skip_all, fields(records = table.len(), entities = table.entities().len()))]
    pub fn run(&self, table: &AttendanceTable) -> Result<BatchOutput> {
        table.require_metrics(&self.config.metrics)?;

        let pairs: Vec<(&str, &str)> = table
            .entities()
            .iter()
            .flat_map(|entity| {
                self.config
                    .metrics
                    .iter()
                    .map(move |metric| (entity.as_str(), metric.as_str()))
            })
            .collect();

        let results = self.evaluate(table, &pairs)?;

        let output = ResultTable::from_pairs(&results, self.config.emit_history_for_skipped);
        let report = RunReport::new(
            &results,
            table.entities().len(),
            &self.config.metrics,
            &output,
        );

        info!(
            pairs = report.pairs_total,
            forecast = report.pairs_forecast,
            skipped = report.pairs_skipped,
            rows = report.rows_written,
            "forecast run complete"
        );

        Ok(BatchOutput {
            pairs: results,
            table: output,
            report,
        })
    }

    fn evaluate(&self, table: &AttendanceTable, pairs: &[(&str, &str)]) -> Result<Vec<PairResult>> {
        if self.config.parallel {
            #[cfg(feature = "parallel")]
            {
                use rayon::prelude::*;
                return pairs
                    .par_iter()
                    .map(|(entity, metric)| self.evaluate_pair(table, entity, metric))
                    .collect();
            }

            #[cfg(not(feature = "parallel"))]
            warn!("parallel evaluation requested but the `parallel` feature is disabled; running sequentially");
        }

        pairs
            .iter()
            .map(|(entity, metric)| self.evaluate_pair(table, entity, metric))
            .collect()
    }

    fn evaluate_pair(&self, table: &AttendanceTable, entity: &str, metric: &str) -> Result<PairResult> {
        let series = table.series(entity, metric)?;
        let outcome = self.forecast_pair(&series)?;

        if let PairOutcome::Skipped(reason) = &outcome {
            warn!(entity, metric, %reason, "skipping pair");
        }

        Ok(PairResult { series, outcome })
    }
}
