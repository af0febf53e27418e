//! Attendance forecasting from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Forecast every team and metric of an acquisition CSV
//! turnout forecast --input data/attendance.csv --output data/forecasts.csv
//! turnout forecast --input data/attendance.csv --output data/forecasts.csv \
//!     --config turnout.toml --report data/report.json
//!
//! # Inspect one team and metric of a forecast table
//! turnout show --forecasts data/forecasts.csv --team Alpha --metric home_avg
//!
//! # Write the default configuration
//! turnout init-config --output turnout.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use turnout_forecast::{AttendanceTable, DashboardView, ForecastPipeline, ResultTable, SeriesView};
use turnout_workspace::{init_logging, AppConfig, AppError, LoggingConfig};

#[derive(Parser)]
#[command(name = "turnout")]
#[command(about = "Five-season attendance forecasts per team and metric")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast every team and metric of an attendance table
    Forecast {
        /// Acquisition CSV (team, season and one column per metric)
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV; replaced if it exists
        #[arg(short, long)]
        output: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write a JSON run report to this path
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
    /// Print one team and metric from a forecast table
    Show {
        /// Forecast CSV written by `turnout forecast`
        #[arg(short, long)]
        forecasts: PathBuf,

        /// Team to show
        #[arg(short, long)]
        team: String,

        /// Metric column to show
        #[arg(short, long, default_value = "overall_avg")]
        metric: String,
    },
    /// Write the default configuration as TOML
    InitConfig {
        /// Destination file
        #[arg(short, long, default_value = "turnout.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Commands::Forecast {
            input,
            output,
            config,
            report,
        } => {
            let config = AppConfig::load(config.as_deref())?;
            init_logging(&config.logging)?;
            forecast(config, &input, &output, report.as_deref())
        }
        Commands::Show {
            forecasts,
            team,
            metric,
        } => {
            init_logging(&LoggingConfig::default())?;
            show(&forecasts, &team, &metric)
        }
        Commands::InitConfig { output, force } => init_config(&output, force),
    }
}

fn forecast(config: AppConfig, input: &Path, output: &Path, report: Option<&Path>) -> Result<(), AppError> {
    info!(input = %input.display(), "loading attendance table");
    let table = AttendanceTable::from_csv(input, &config.forecast.metrics)?;

    let batch = ForecastPipeline::new(config.forecast)?.run(&table)?;

    batch.table.write_csv(output)?;
    info!(output = %output.display(), rows = batch.table.len(), "wrote forecasts");

    if let Some(path) = report {
        batch.report.write_json(path)?;
        info!(report = %path.display(), "wrote run report");
    }

    println!(
        "{} pairs forecast, {} skipped, {} rows written to {}",
        batch.report.pairs_forecast,
        batch.report.pairs_skipped,
        batch.table.len(),
        output.display()
    );
    Ok(())
}

fn show(forecasts: &Path, team: &str, metric: &str) -> Result<(), AppError> {
    let table = ResultTable::read_csv(forecasts)?;
    let view = DashboardView::new(&table);

    let series = view
        .select(team, metric)
        .ok_or_else(|| AppError::SelectionNotFound {
            entity: team.to_string(),
            metric: metric.to_string(),
        })?;

    print!("{}", render(&series));
    Ok(())
}

fn render(series: &SeriesView<'_>) -> String {
    let cell = |value: Option<f64>| value.map(|v| format!("{:.0}", v)).unwrap_or_else(|| "-".to_string());

    let mut out = format!("{}\n", series.title());
    out.push_str(&format!(
        "{:<8} {:<11} {:>12} {:>12} {:>12}\n",
        "season", "type", "attendance", "lower", "upper"
    ));
    for row in series.historical.iter().chain(series.forecast.iter()) {
        let kind = if row.is_forecast() { "forecast" } else { "historical" };
        out.push_str(&format!(
            "{:<8} {:<11} {:>12} {:>12} {:>12}\n",
            row.period,
            kind,
            cell(row.value),
            cell(row.lower),
            cell(row.upper)
        ));
    }
    out
}

fn init_config(output: &Path, force: bool) -> Result<(), AppError> {
    if output.exists() && !force {
        return Err(AppError::AlreadyExists(output.to_path_buf()));
    }

    let text = AppConfig::default().to_toml_string()?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, text)?;

    println!("Wrote default configuration to {}", output.display());
    Ok(())
}
