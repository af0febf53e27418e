//! Historical attendance data handling
//!
//! The acquisition side delivers one row per team and season with a numeric
//! column per tracked metric. [`AttendanceTable`] validates that contract and
//! hands out per-(team, metric) [`Series`].

use crate::error::{ForecastError, Result};
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::path::Path;

/// Name of the entity column in the input table
pub const ENTITY_COLUMN: &str = "team";
/// Name of the period column in the input table
pub const PERIOD_COLUMN: &str = "season";

/// One recorded measurement for one entity, metric and period
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub entity: String,
    pub period: i32,
    pub metric: String,
    pub value: Option<f64>,
}

/// All tracked metric values of one entity in one period
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonRecord {
    pub entity: String,
    pub period: i32,
    /// Values aligned with the table's metric list; `None` when missing
    pub values: Vec<Option<f64>>,
}

/// Period-ordered values of one metric for one entity
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    entity: String,
    metric: String,
    points: Vec<(i32, Option<f64>)>,
}

impl Series {
    /// Create a series, sorting points by period.
    ///
    /// NaN values are treated as missing. Two points for the same period are
    /// rejected.
    pub fn new(
        entity: impl Into<String>,
        metric: impl Into<String>,
        mut points: Vec<(i32, Option<f64>)>,
    ) -> Result<Self> {
        let entity = entity.into();
        points.sort_by_key(|(period, _)| *period);

        if let Some(w) = points.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(ForecastError::DuplicateRecord {
                entity,
                period: w[0].0,
            });
        }

        for (_, value) in points.iter_mut() {
            if value.is_some_and(f64::is_nan) {
                *value = None;
            }
        }

        Ok(Self {
            entity,
            metric: metric.into(),
            points,
        })
    }

    /// Entity the series belongs to
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Metric the series measures
    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// (period, value) pairs in period order
    pub fn points(&self) -> &[(i32, Option<f64>)] {
        &self.points
    }

    /// Number of periods, missing ones included
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the series has no periods
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of periods with a recorded value
    pub fn observed_count(&self) -> usize {
        self.points.iter().filter(|(_, v)| v.is_some()).count()
    }
}

/// Validated historical attendance table
#[derive(Debug, Clone)]
pub struct AttendanceTable {
    metrics: Vec<String>,
    entities: Vec<String>,
    records: Vec<SeasonRecord>,
}

impl AttendanceTable {
    /// Build a table from season records.
    ///
    /// Entities keep the order of their first appearance. Empty input,
    /// blank entity names, value vectors that do not match `metrics` and
    /// duplicate (entity, period) records are rejected.
    pub fn new(metrics: Vec<String>, records: Vec<SeasonRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(ForecastError::EmptyInput);
        }

        let mut entities = Vec::new();
        let mut seen_entities = HashSet::new();
        let mut seen_keys = HashSet::with_capacity(records.len());

        for (row, record) in records.iter().enumerate() {
            if record.entity.trim().is_empty() {
                return Err(ForecastError::MalformedRow {
                    row,
                    message: "entity name is blank".to_string(),
                });
            }
            if record.values.len() != metrics.len() {
                return Err(ForecastError::MalformedRow {
                    row,
                    message: format!(
                        "expected {} metric values, found {}",
                        metrics.len(),
                        record.values.len()
                    ),
                });
            }
            if !seen_keys.insert((record.entity.as_str(), record.period)) {
                return Err(ForecastError::DuplicateRecord {
                    entity: record.entity.clone(),
                    period: record.period,
                });
            }
            if seen_entities.insert(record.entity.as_str()) {
                entities.push(record.entity.clone());
            }
        }

        Ok(Self {
            metrics,
            entities,
            records,
        })
    }

    /// Build a table from individual observations.
    ///
    /// Observations for the same entity and period are merged into one
    /// record; metrics without an observation are missing.
    pub fn from_observations(
        metrics: Vec<String>,
        observations: impl IntoIterator<Item = Observation>,
    ) -> Result<Self> {
        let index: HashMap<&str, usize> = metrics
            .iter()
            .enumerate()
            .map(|(i, m)| (m.as_str(), i))
            .collect();

        let mut order: Vec<(String, i32)> = Vec::new();
        let mut merged: HashMap<(String, i32), Vec<Option<f64>>> = HashMap::new();

        for (row, obs) in observations.into_iter().enumerate() {
            let slot = *index.get(obs.metric.as_str()).ok_or_else(|| {
                ForecastError::MalformedRow {
                    row,
                    message: format!("metric '{}' is not tracked", obs.metric),
                }
            })?;

            let key = (obs.entity.clone(), obs.period);
            let values = merged.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                vec![None; metrics.len()]
            });
            if values[slot].is_some() {
                return Err(ForecastError::DuplicateRecord {
                    entity: obs.entity,
                    period: obs.period,
                });
            }
            values[slot] = obs.value;
        }

        let records = order
            .into_iter()
            .map(|key| {
                let values = merged.remove(&key).unwrap_or_default();
                SeasonRecord {
                    entity: key.0,
                    period: key.1,
                    values,
                }
            })
            .collect();

        Self::new(metrics, records)
    }

    /// Load a table from the acquisition CSV, requiring every metric in `metrics`
    pub fn from_csv<P: AsRef<Path>>(path: P, metrics: &[String]) -> Result<Self> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(&df, metrics)
    }

    /// Build a table from an existing DataFrame
    pub fn from_dataframe(df: &DataFrame, metrics: &[String]) -> Result<Self> {
        let column_names = df.get_column_names();
        for required in [ENTITY_COLUMN, PERIOD_COLUMN] {
            if !column_names.contains(&required) {
                return Err(ForecastError::MissingColumn(required.to_string()));
            }
        }
        for metric in metrics {
            if !column_names.contains(&metric.as_str()) {
                return Err(ForecastError::MissingMetricColumn(metric.clone()));
            }
        }
        if df.height() == 0 {
            return Err(ForecastError::EmptyInput);
        }

        let entity_series = df.column(ENTITY_COLUMN)?.cast(&DataType::Utf8)?;
        let entities = entity_series.utf8()?;
        let period_series = df
            .column(PERIOD_COLUMN)?
            .strict_cast(&DataType::Int64)
            .map_err(|e| ForecastError::MalformedRow {
                row: 0,
                message: format!("'{}' is not integral: {}", PERIOD_COLUMN, e),
            })?;
        let periods = period_series.i64()?;

        let mut metric_values = Vec::with_capacity(metrics.len());
        for metric in metrics {
            let values = df
                .column(metric)?
                .strict_cast(&DataType::Float64)
                .map_err(|e| ForecastError::MalformedRow {
                    row: 0,
                    message: format!("'{}' is not numeric: {}", metric, e),
                })?;
            metric_values.push(values.f64()?.into_iter().collect::<Vec<Option<f64>>>());
        }

        let mut records = Vec::with_capacity(df.height());
        for (row, (entity, period)) in entities.into_iter().zip(periods.into_iter()).enumerate() {
            let entity = entity.ok_or_else(|| ForecastError::MalformedRow {
                row,
                message: format!("'{}' is empty", ENTITY_COLUMN),
            })?;
            let period = period.ok_or_else(|| ForecastError::MalformedRow {
                row,
                message: format!("'{}' is empty", PERIOD_COLUMN),
            })?;
            let period = i32::try_from(period).map_err(|_| ForecastError::MalformedRow {
                row,
                message: format!("season {} is out of range", period),
            })?;

            let values = metric_values
                .iter()
                .map(|column| column[row].filter(|v| !v.is_nan()))
                .collect();

            records.push(SeasonRecord {
                entity: entity.to_string(),
                period,
                values,
            });
        }

        Self::new(metrics.to_vec(), records)
    }

    /// Tracked metric names, in column order
    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    /// Entities in order of first appearance
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    /// All season records as loaded
    pub fn records(&self) -> &[SeasonRecord] {
        &self.records
    }

    /// Number of season records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check that every metric in `required` is tracked by this table
    pub fn require_metrics(&self, required: &[String]) -> Result<()> {
        match required.iter().find(|m| !self.metrics.contains(m)) {
            Some(missing) => Err(ForecastError::MissingMetricColumn(missing.clone())),
            None => Ok(()),
        }
    }

    /// Period-ordered series of `metric` for `entity`
    pub fn series(&self, entity: &str, metric: &str) -> Result<Series> {
        let slot = self
            .metrics
            .iter()
            .position(|m| m == metric)
            .ok_or_else(|| ForecastError::MissingMetricColumn(metric.to_string()))?;

        let points: BTreeMap<i32, Option<f64>> = self
            .records
            .iter()
            .filter(|r| r.entity == entity)
            .map(|r| (r.period, r.values[slot]))
            .collect();

        Series::new(entity, metric, points.into_iter().collect())
    }

    /// Flatten the table into one observation per entity, period and metric
    pub fn observations(&self) -> impl Iterator<Item = Observation> + '_ {
        self.records.iter().flat_map(move |record| {
            self.metrics
                .iter()
                .zip(record.values.iter())
                .map(move |(metric, value)| Observation {
                    entity: record.entity.clone(),
                    period: record.period,
                    metric: metric.clone(),
                    value: *value,
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn metrics() -> Vec<String> {
        vec!["home_avg".to_string(), "road_avg".to_string()]
    }

    fn record(entity: &str, period: i32, home: Option<f64>, road: Option<f64>) -> SeasonRecord {
        SeasonRecord {
            entity: entity.to_string(),
            period,
            values: vec![home, road],
        }
    }

    #[test]
    fn test_series_sorts_and_drops_nan() {
        let series = Series::new(
            "Alpha",
            "home_avg",
            vec![(2008, Some(3.0)), (2006, Some(f64::NAN)), (2007, Some(2.0))],
        )
        .unwrap();

        assert_eq!(
            series.points(),
            &[(2006, None), (2007, Some(2.0)), (2008, Some(3.0))]
        );
        assert_eq!(series.observed_count(), 2);
    }

    #[test]
    fn test_series_rejects_duplicate_period() {
        let result = Series::new("Alpha", "home_avg", vec![(2006, Some(1.0)), (2006, None)]);
        assert!(matches!(
            result,
            Err(ForecastError::DuplicateRecord { period: 2006, .. })
        ));
    }

    #[test]
    fn test_table_entities_in_first_appearance_order() {
        let table = AttendanceTable::new(
            metrics(),
            vec![
                record("Gamma", 2006, Some(1.0), None),
                record("Alpha", 2006, Some(1.0), None),
                record("Gamma", 2007, Some(1.0), None),
            ],
        )
        .unwrap();

        assert_eq!(table.entities(), &["Gamma".to_string(), "Alpha".to_string()]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_table_rejects_structural_defects() {
        assert!(matches!(
            AttendanceTable::new(metrics(), vec![]),
            Err(ForecastError::EmptyInput)
        ));
        assert!(matches!(
            AttendanceTable::new(metrics(), vec![record(" ", 2006, None, None)]),
            Err(ForecastError::MalformedRow { row: 0, .. })
        ));
        assert!(matches!(
            AttendanceTable::new(
                metrics(),
                vec![record("Alpha", 2006, None, None), record("Alpha", 2006, None, None)]
            ),
            Err(ForecastError::DuplicateRecord { .. })
        ));

        let short = SeasonRecord {
            entity: "Alpha".to_string(),
            period: 2006,
            values: vec![Some(1.0)],
        };
        assert!(matches!(
            AttendanceTable::new(metrics(), vec![short]),
            Err(ForecastError::MalformedRow { .. })
        ));
    }

    #[test]
    fn test_series_extraction() {
        let table = AttendanceTable::new(
            metrics(),
            vec![
                record("Alpha", 2007, Some(61_000.0), Some(58_000.0)),
                record("Beta", 2006, Some(40_000.0), None),
                record("Alpha", 2006, Some(60_000.0), None),
            ],
        )
        .unwrap();

        let series = table.series("Alpha", "road_avg").unwrap();
        assert_eq!(series.entity(), "Alpha");
        assert_eq!(series.metric(), "road_avg");
        assert_eq!(series.points(), &[(2006, None), (2007, Some(58_000.0))]);

        assert!(matches!(
            table.series("Alpha", "overall_avg"),
            Err(ForecastError::MissingMetricColumn(m)) if m == "overall_avg"
        ));
        assert!(table.series("Nobody", "home_avg").unwrap().is_empty());
    }

    #[test]
    fn test_observation_round_trip() {
        let table = AttendanceTable::new(
            metrics(),
            vec![
                record("Alpha", 2006, Some(60_000.0), None),
                record("Alpha", 2007, Some(61_000.0), Some(58_000.0)),
            ],
        )
        .unwrap();

        let observations: Vec<Observation> = table.observations().collect();
        assert_eq!(observations.len(), 4);

        let rebuilt = AttendanceTable::from_observations(metrics(), observations).unwrap();
        assert_eq!(rebuilt.records(), table.records());
    }

    #[test]
    fn test_from_observations_rejects_untracked_metric() {
        let obs = Observation {
            entity: "Alpha".to_string(),
            period: 2006,
            metric: "overall_avg".to_string(),
            value: Some(1.0),
        };
        assert!(matches!(
            AttendanceTable::from_observations(metrics(), vec![obs]),
            Err(ForecastError::MalformedRow { .. })
        ));
    }

    #[test]
    fn test_require_metrics() {
        let table =
            AttendanceTable::new(metrics(), vec![record("Alpha", 2006, None, None)]).unwrap();
        assert!(table.require_metrics(&metrics()).is_ok());
        assert!(matches!(
            table.require_metrics(&["overall_avg".to_string()]),
            Err(ForecastError::MissingMetricColumn(_))
        ));
    }
}
