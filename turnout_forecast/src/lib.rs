//! # Turnout Forecast
//!
//! Five-season attendance forecasts per team and metric.
//!
//! ## Features
//!
//! - Historical attendance loading from CSV (one row per team and season)
//! - Training-set preparation with excluded seasons and a sufficiency threshold
//! - Holt's additive-trend smoothing with estimated parameters and initial state
//! - Widening confidence bounds clamped to a plausible attendance range
//! - Combined historical + forecast output table and a JSON run report
//! - Dashboard view helpers for filtering one team and metric
//!
//! ## Quick Start
//!
//! ```no_run
//! use turnout_forecast::{AttendanceTable, DashboardView, ForecastConfig, ForecastPipeline};
//!
//! let config = ForecastConfig::default();
//! let table = AttendanceTable::from_csv("attendance.csv", &config.metrics)?;
//!
//! let output = ForecastPipeline::new(config)?.run(&table)?;
//! output.table.write_csv("forecasts.csv")?;
//!
//! let view = DashboardView::new(&output.table);
//! if let Some(series) = view.select("Alpha", "home_avg") {
//!     println!("{} forecast seasons", series.forecast.len());
//! }
//! # Ok::<(), turnout_forecast::ForecastError>(())
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod intervals;
pub mod metrics;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod prep;
pub mod view;

// Re-export commonly used types
pub use crate::config::{ConfigError, ForecastConfig, OptimizerConfig};
pub use crate::data::{AttendanceTable, Observation, SeasonRecord, Series};
pub use crate::engine::{ForecastEngine, PairForecast};
pub use crate::error::{ForecastError, Result};
pub use crate::intervals::{ClampRange, ForecastPoint};
pub use crate::metrics::FitAccuracy;
pub use crate::models::holt::HoltLinear;
pub use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
pub use crate::output::{ResultRow, ResultTable, RowType, RunReport};
pub use crate::pipeline::{BatchOutput, ForecastPipeline, PairOutcome, PairResult, SkipReason};
pub use crate::prep::{TimeSeriesPreparer, TrainingSet};
pub use crate::view::{DashboardView, SeriesView};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
