//! Tracing subscriber setup for the command line tool

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app_config::{AppError, LogFormat, LoggingConfig};

/// Install the global subscriber described by `config`.
///
/// `RUST_LOG`, when set and valid, replaces the configured level and filter.
pub fn init_logging(config: &LoggingConfig) -> Result<(), AppError> {
    let filter = build_env_filter(config, std::env::var("RUST_LOG").ok().as_deref());
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    result.map_err(|e| AppError::Logging(e.to_string()))
}

/// Build the filter from the configured level, optional extra directives and
/// an optional `RUST_LOG` override.
pub fn build_env_filter(config: &LoggingConfig, rust_log: Option<&str>) -> EnvFilter {
    let base_level = config.level.as_str();

    if let Some(env_filter) = rust_log {
        EnvFilter::try_new(env_filter).unwrap_or_else(|_| EnvFilter::new(base_level))
    } else if let Some(filter) = &config.filter {
        let combined = format!("{},{}", base_level, filter);
        EnvFilter::try_new(combined).unwrap_or_else(|_| EnvFilter::new(base_level))
    } else {
        EnvFilter::new(base_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::LogLevel;

    #[test]
    fn test_filter_uses_configured_level() {
        let config = LoggingConfig {
            level: LogLevel::Warn,
            ..Default::default()
        };
        assert_eq!(build_env_filter(&config, None).to_string(), "warn");
    }

    #[test]
    fn test_filter_appends_directives() {
        let config = LoggingConfig {
            filter: Some("turnout_forecast=debug".to_string()),
            ..Default::default()
        };
        let filter = build_env_filter(&config, None).to_string();
        assert!(filter.contains("turnout_forecast=debug"));
        assert!(filter.contains("info"));
    }

    #[test]
    fn test_rust_log_overrides_config() {
        let config = LoggingConfig {
            level: LogLevel::Error,
            filter: Some("turnout_math=trace".to_string()),
            ..Default::default()
        };
        let filter = build_env_filter(&config, Some("debug")).to_string();
        assert_eq!(filter, "debug");
    }
}
