//! Dashboard-side view over the output table
//!
//! The dashboard lists teams, lets the user pick a metric, and charts the
//! historical line, the forecast line and the confidence ribbon for that
//! selection. This module does the filtering and grouping behind that.

use std::collections::BTreeSet;

use crate::output::{ResultRow, ResultTable, RowType};

/// Human-readable label of a metric column
pub fn metric_label(metric: &str) -> String {
    match metric {
        "home_avg" => "Home Attendance".to_string(),
        "road_avg" => "Road Attendance".to_string(),
        "overall_avg" => "Overall Attendance".to_string(),
        other => other.to_string(),
    }
}

/// Read-only view over the rows of an output table
#[derive(Debug, Clone, Copy)]
pub struct DashboardView<'a> {
    rows: &'a [ResultRow],
}

impl<'a> DashboardView<'a> {
    pub fn new(table: &'a ResultTable) -> Self {
        Self { rows: table.rows() }
    }

    /// Entities present in the table, sorted
    pub fn entities(&self) -> Vec<&'a str> {
        self.rows
            .iter()
            .map(|r| r.entity.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Metrics present in the table, in order of first appearance
    pub fn metrics(&self) -> Vec<&'a str> {
        let mut metrics: Vec<&str> = Vec::new();
        for row in self.rows {
            if !metrics.contains(&row.metric.as_str()) {
                metrics.push(&row.metric);
            }
        }
        metrics
    }

    /// Rows of one entity and metric, split by type and sorted by season.
    ///
    /// Returns `None` when the table has no rows for the pair.
    pub fn select(&self, entity: &str, metric: &str) -> Option<SeriesView<'a>> {
        let mut selected: Vec<&'a ResultRow> = self
            .rows
            .iter()
            .filter(|r| r.entity == entity && r.metric == metric)
            .collect();
        if selected.is_empty() {
            return None;
        }
        selected.sort_by_key(|r| r.period);

        let (forecast, historical): (Vec<_>, Vec<_>) = selected
            .into_iter()
            .partition(|r| r.row_type == RowType::Forecast);

        Some(SeriesView {
            entity: entity.to_string(),
            metric: metric.to_string(),
            label: metric_label(metric),
            historical,
            forecast,
        })
    }
}

/// One entity/metric selection
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesView<'a> {
    pub entity: String,
    pub metric: String,
    pub label: String,
    pub historical: Vec<&'a ResultRow>,
    pub forecast: Vec<&'a ResultRow>,
}

/// Confidence ribbon of a forecast
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub periods: Vec<i32>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Band {
    /// Closed outline of the ribbon: upper bounds forward, then lower bounds back
    pub fn outline(&self) -> Vec<(i32, f64)> {
        let forward = self.periods.iter().copied().zip(self.upper.iter().copied());
        let back = self
            .periods
            .iter()
            .copied()
            .zip(self.lower.iter().copied())
            .rev();
        forward.chain(back).collect()
    }
}

impl SeriesView<'_> {
    /// Forecast rows that carry both bounds, as a ribbon
    pub fn band(&self) -> Band {
        let mut band = Band {
            periods: Vec::with_capacity(self.forecast.len()),
            lower: Vec::with_capacity(self.forecast.len()),
            upper: Vec::with_capacity(self.forecast.len()),
        };

        for row in &self.forecast {
            if let (Some(lower), Some(upper)) = (row.lower, row.upper) {
                band.periods.push(row.period);
                band.lower.push(lower);
                band.upper.push(upper);
            }
        }

        band
    }

    /// Chart title, e.g. "Alpha: Home Attendance"
    pub fn title(&self) -> String {
        format!("{}: {}", self.entity, self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intervals::ForecastPoint;
    use pretty_assertions::assert_eq;

    fn table() -> ResultTable {
        let point = |period, estimate| ForecastPoint {
            period,
            estimate,
            lower: estimate - 100.0,
            upper: estimate + 100.0,
        };
        ResultTable::new(vec![
            ResultRow::forecast("Zeta", "road_avg", &point(2026, 500.0)),
            ResultRow::historical("Zeta", "road_avg", 2024, Some(300.0)),
            ResultRow::forecast("Zeta", "road_avg", &point(2025, 400.0)),
            ResultRow::historical("Zeta", "road_avg", 2020, None),
            ResultRow::historical("Alpha", "home_avg", 2024, Some(900.0)),
        ])
    }

    #[test]
    fn test_entities_and_metrics() {
        let table = table();
        let view = DashboardView::new(&table);
        assert_eq!(view.entities(), vec!["Alpha", "Zeta"]);
        assert_eq!(view.metrics(), vec!["road_avg", "home_avg"]);
    }

    #[test]
    fn test_select_splits_and_sorts() {
        let table = table();
        let view = DashboardView::new(&table);
        let series = view.select("Zeta", "road_avg").unwrap();

        let historical: Vec<i32> = series.historical.iter().map(|r| r.period).collect();
        let forecast: Vec<i32> = series.forecast.iter().map(|r| r.period).collect();
        assert_eq!(historical, vec![2020, 2024]);
        assert_eq!(forecast, vec![2025, 2026]);
        assert_eq!(series.label, "Road Attendance");

        let band = series.band();
        assert_eq!(band.periods, vec![2025, 2026]);
        assert_eq!(band.lower, vec![300.0, 400.0]);
        assert_eq!(
            band.outline(),
            vec![(2025, 500.0), (2026, 600.0), (2026, 400.0), (2025, 300.0)]
        );

        assert!(view.select("Zeta", "home_avg").is_none());
    }

    #[test]
    fn test_metric_label_falls_back_to_name() {
        assert_eq!(metric_label("overall_avg"), "Overall Attendance");
        assert_eq!(metric_label("capacity_pct"), "capacity_pct");
    }
}
