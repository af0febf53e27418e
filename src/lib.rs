//! # Turnout
//!
//! Workspace facade for the attendance forecasting libraries and the
//! `turnout` command line tool.
//!
//! ## Example
//!
//! ```
//! use turnout_workspace::AppConfig;
//!
//! let config: AppConfig = r#"
//!     [logging]
//!     level = "debug"
//!
//!     [forecast]
//!     forecast_periods = [2025, 2026, 2027]
//! "#
//! .parse()
//! .unwrap();
//!
//! assert_eq!(config.forecast.horizon(), 3);
//! ```

pub mod app_config;
pub mod logging;

pub use app_config::{AppConfig, AppError, LogFormat, LogLevel, LoggingConfig};
pub use logging::init_logging;

// Re-export the workspace libraries
pub use turnout_forecast;
pub use turnout_math;
