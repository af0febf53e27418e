use turnout_forecast::models::holt::HoltLinear;
use turnout_forecast::models::{ForecastModel, TrainedForecastModel};
use turnout_forecast::{
    AttendanceTable, DashboardView, ForecastConfig, ForecastPipeline, Observation, TrainingSet,
};
use turnout_math::NelderMead;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Turnout: Basic Forecasting Example");
    println!("==================================\n");

    // Fit a single series directly
    println!("Training a Holt model on one series...");
    let points: Vec<(i32, f64)> = (2006..=2024)
        .filter(|season| *season != 2020)
        .map(|season| (season, sample_attendance(season, 62_000.0, 350.0)))
        .collect();
    let training = TrainingSet::new("Alpha", "home_avg", &points);

    let trained = HoltLinear::estimated(NelderMead::default()).train(&training)?;
    println!(
        "alpha = {:.3}, beta = {:.3}, final level = {:.0}, final trend = {:.1}",
        trained.params().alpha,
        trained.params().beta,
        trained.level(),
        trained.trend()
    );
    println!("Next 5 seasons: {:?}\n", trained.forecast(5)?.values());

    // Run the full pipeline on a small league
    println!("Running the batch pipeline...");
    let config = ForecastConfig::default();
    let table = AttendanceTable::from_observations(config.metrics.clone(), create_sample_league())?;
    let output = ForecastPipeline::new(config)?.run(&table)?;

    println!(
        "{} pairs forecast, {} skipped, {} rows\n",
        output.report.pairs_forecast,
        output.report.pairs_skipped,
        output.table.len()
    );

    // Look at one team the way the dashboard does
    let view = DashboardView::new(&output.table);
    if let Some(series) = view.select("Alpha", "overall_avg") {
        println!("{}", series.title());
        for row in &series.forecast {
            println!(
                "  {}: {:.0} ({:.0} to {:.0})",
                row.period,
                row.value.unwrap_or_default(),
                row.lower.unwrap_or_default(),
                row.upper.unwrap_or_default()
            );
        }
    }

    Ok(())
}

/// Deterministic attendance with a trend and a mild alternating pattern
fn sample_attendance(season: i32, base: f64, trend: f64) -> f64 {
    let offset = (season - 2006) as f64;
    let wobble = (offset * 1.3).sin() * 800.0;
    base + trend * offset + wobble
}

/// Three teams over 2006-2024 with 2020 missing
fn create_sample_league() -> Vec<Observation> {
    let teams = [("Alpha", 62_000.0, 350.0), ("Beta", 55_000.0, -120.0), ("Gamma", 70_000.0, 40.0)];
    let mut observations = Vec::new();

    for (team, base, trend) in teams {
        for season in 2006..=2024 {
            let home = (season != 2020).then(|| sample_attendance(season, base, trend));
            let road = home.map(|v| v - 3_500.0);
            let overall = home.zip(road).map(|(h, r)| (h + r) / 2.0);

            for (metric, value) in [("home_avg", home), ("road_avg", road), ("overall_avg", overall)] {
                observations.push(Observation {
                    entity: team.to_string(),
                    period: season,
                    metric: metric.to_string(),
                    value,
                });
            }
        }
    }

    observations
}
