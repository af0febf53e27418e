use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};
use turnout_forecast::{
    AttendanceTable, DashboardView, ForecastConfig, ForecastPipeline, PairOutcome, ResultTable,
    RowType, SkipReason,
};

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Three teams over 2006-2024:
/// - Alpha rises 500 per played season from 50000, with 2020 missing
/// - Beta has only two usable home seasons
/// - Gamma is flat at 65000
fn create_sample_data() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "team,season,home_avg,road_avg,overall_avg").unwrap();

    for season in 2006..=2024 {
        let played = if season < 2020 { season - 2006 } else { season - 2007 };
        let alpha = (season != 2020).then(|| 50_000.0 + 500.0 * played as f64);
        writeln!(
            file,
            "Alpha,{},{},{},{}",
            season,
            cell(alpha.map(|v| v + 4_000.0)),
            cell(alpha.map(|v| v - 4_000.0)),
            cell(alpha)
        )
        .unwrap();
    }

    for season in 2006..=2024 {
        let home = match season {
            2019 => Some(52_000.0),
            2020 => Some(9_000.0),
            2023 => Some(54_000.0),
            _ => None,
        };
        let wobble = if season % 2 == 0 { 600.0 } else { -600.0 };
        let road = 58_000.0 + 120.0 * (season - 2006) as f64 + wobble;
        writeln!(file, "Beta,{},{},{},{}", season, cell(home), road, road - 1_000.0).unwrap();
    }

    for season in 2006..=2024 {
        writeln!(file, "Gamma,{},65000,65000,65000", season).unwrap();
    }

    file
}

fn run_default() -> (AttendanceTable, turnout_forecast::BatchOutput) {
    let data_file = create_sample_data();
    let config = ForecastConfig::default();
    let table = AttendanceTable::from_csv(data_file.path(), &config.metrics).unwrap();
    let output = ForecastPipeline::new(config).unwrap().run(&table).unwrap();
    (table, output)
}

#[test]
fn test_trending_series_is_extrapolated() {
    let (_, output) = run_default();
    let view = DashboardView::new(&output.table);
    let alpha = view.select("Alpha", "overall_avg").unwrap();

    // Every season is reported, the excluded one with an empty value
    assert_eq!(alpha.historical.len(), 19);
    let covid = alpha.historical.iter().find(|r| r.period == 2020).unwrap();
    assert_eq!(covid.value, None);
    assert!(alpha.historical.iter().all(|r| r.lower.is_none() && r.upper.is_none()));

    let periods: Vec<i32> = alpha.forecast.iter().map(|r| r.period).collect();
    assert_eq!(periods, vec![2025, 2026, 2027, 2028, 2029]);

    let estimates: Vec<f64> = alpha.forecast.iter().map(|r| r.value.unwrap()).collect();
    assert!((estimates[0] - 59_000.0).abs() < 5.0, "first estimate {}", estimates[0]);
    for step in estimates.windows(2) {
        let growth = step[1] - step[0];
        assert!((growth - 500.0).abs() < 5.0, "growth {}", growth);
    }

    let band = alpha.band();
    let widths: Vec<f64> = band
        .upper
        .iter()
        .zip(band.lower.iter())
        .map(|(u, l)| u - l)
        .collect();
    assert!(widths.windows(2).all(|w| w[1] >= w[0]));
    for row in &alpha.forecast {
        let (lower, upper) = (row.lower.unwrap(), row.upper.unwrap());
        assert!((0.0..=200_000.0).contains(&lower));
        assert!((0.0..=200_000.0).contains(&upper));
        assert!(lower <= row.value.unwrap() && row.value.unwrap() <= upper);
    }

    let pair = output
        .pairs
        .iter()
        .find(|p| p.series.entity() == "Alpha" && p.series.metric() == "overall_avg")
        .unwrap();
    match &pair.outcome {
        PairOutcome::Forecast(forecast) => assert!(forecast.accuracy.mape < 5.0),
        other => panic!("expected a forecast, got {:?}", other),
    }
}

#[test]
fn test_noisy_series_bounds_widen_with_horizon() {
    let (_, output) = run_default();
    let view = DashboardView::new(&output.table);
    let band = view.select("Beta", "road_avg").unwrap().band();

    let widths: Vec<f64> = band
        .upper
        .iter()
        .zip(band.lower.iter())
        .map(|(u, l)| u - l)
        .collect();
    assert!(widths[0] > 0.0);
    assert!(widths.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn test_short_series_is_skipped_without_rows() {
    let (table, output) = run_default();
    let view = DashboardView::new(&output.table);

    // 2020 is excluded, leaving two usable home seasons
    assert!(view.select("Beta", "home_avg").is_none());
    assert!(view.select("Beta", "road_avg").is_some());
    assert!(view.select("Beta", "overall_avg").is_some());

    assert_eq!(output.report.pairs_total, 9);
    assert_eq!(output.report.pairs_skipped, 1);
    let skipped = &output.report.skipped[0];
    assert_eq!((skipped.entity.as_str(), skipped.metric.as_str()), ("Beta", "home_avg"));
    assert_eq!(skipped.reason, SkipReason::InsufficientData { needed: 3, got: 2 });

    // The input is not altered by the run
    let home = table.series("Beta", "home_avg").unwrap();
    assert_eq!(home.observed_count(), 3);
}

#[test]
fn test_flat_series_collapses_bounds() {
    let (_, output) = run_default();
    let view = DashboardView::new(&output.table);
    let gamma = view.select("Gamma", "home_avg").unwrap();

    for row in &gamma.forecast {
        let estimate = row.value.unwrap();
        assert!((estimate - 65_000.0).abs() < 1.0);
        assert!((row.upper.unwrap() - estimate).abs() < 1.0);
        assert!((estimate - row.lower.unwrap()).abs() < 1.0);
    }
}

#[test]
fn test_history_for_skipped_pairs_opt_in() {
    let data_file = create_sample_data();
    let config = ForecastConfig {
        emit_history_for_skipped: true,
        ..Default::default()
    };
    let table = AttendanceTable::from_csv(data_file.path(), &config.metrics).unwrap();
    let output = ForecastPipeline::new(config).unwrap().run(&table).unwrap();

    let view = DashboardView::new(&output.table);
    let beta_home = view.select("Beta", "home_avg").unwrap();
    assert_eq!(beta_home.historical.len(), 19);
    assert!(beta_home.forecast.is_empty());
    assert!(beta_home.band().periods.is_empty());
}

#[test]
fn test_output_round_trips_through_csv() {
    let (_, output) = run_default();
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("forecasts.csv");

    output.table.write_csv(&path).unwrap();
    let restored = ResultTable::read_csv(&path).unwrap();

    assert_eq!(restored.len(), output.table.len());
    assert_eq!(restored.forecast_count(), 8 * 5);
    // 8 forecast pairs, 19 seasons each, plus their forecasts
    assert_eq!(restored.len(), 8 * (19 + 5));

    let view = DashboardView::new(&restored);
    assert_eq!(view.entities(), vec!["Alpha", "Beta", "Gamma"]);
    assert_eq!(view.metrics(), vec!["home_avg", "road_avg", "overall_avg"]);
    assert!(restored
        .rows()
        .iter()
        .filter(|r| r.row_type == RowType::Historical)
        .all(|r| r.lower.is_none()));

    // A second run replaces the file instead of appending
    output.table.write_csv(&path).unwrap();
    assert_eq!(ResultTable::read_csv(&path).unwrap().len(), output.table.len());
}

#[test]
fn test_report_written_as_json() {
    let (_, output) = run_default();
    let dir = tempdir().unwrap();
    let path = dir.path().join("report.json");

    output.report.write_json(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(value["pairs_forecast"], 8);
    assert_eq!(value["skipped_by_reason"]["insufficient_data"], 1);
    assert_eq!(value["skipped"][0]["reason"]["kind"], "insufficient_data");
}
