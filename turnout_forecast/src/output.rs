//! Combined historical + forecast output table and run report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use crate::error::Result;
use crate::intervals::ForecastPoint;
use crate::pipeline::{PairOutcome, PairResult, SkipReason};

/// Kind of row in the output table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowType {
    Historical,
    Forecast,
}

/// One row of the output table.
///
/// Field names on disk follow the dashboard's CSV contract
/// (`team, season, attendance, type, metric, lower, upper`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "team")]
    pub entity: String,
    #[serde(rename = "season")]
    pub period: i32,
    /// Measured value, or the point estimate on forecast rows
    #[serde(rename = "attendance")]
    pub value: Option<f64>,
    #[serde(rename = "type")]
    pub row_type: RowType,
    pub metric: String,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl ResultRow {
    /// Historical row; never carries bounds
    pub fn historical(entity: &str, metric: &str, period: i32, value: Option<f64>) -> Self {
        Self {
            entity: entity.to_string(),
            period,
            value,
            row_type: RowType::Historical,
            metric: metric.to_string(),
            lower: None,
            upper: None,
        }
    }

    /// Forecast row with its clamped bounds
    pub fn forecast(entity: &str, metric: &str, point: &ForecastPoint) -> Self {
        Self {
            entity: entity.to_string(),
            period: point.period,
            value: Some(point.estimate),
            row_type: RowType::Forecast,
            metric: metric.to_string(),
            lower: Some(point.lower),
            upper: Some(point.upper),
        }
    }

    pub fn is_forecast(&self) -> bool {
        self.row_type == RowType::Forecast
    }
}

/// Flattened rows of a run, in pair order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn new(rows: Vec<ResultRow>) -> Self {
        Self { rows }
    }

    /// Assemble the rows of evaluated pairs.
    ///
    /// Forecast pairs contribute one historical row per season of the entity
    /// followed by their forecast rows. Skipped pairs contribute nothing
    /// unless `history_for_skipped` is set.
    pub fn from_pairs(pairs: &[PairResult], history_for_skipped: bool) -> Self {
        let mut rows = Vec::new();

        for pair in pairs {
            let (entity, metric) = (pair.series.entity(), pair.series.metric());
            let forecast = match &pair.outcome {
                PairOutcome::Forecast(forecast) => Some(forecast),
                PairOutcome::Skipped(_) if history_for_skipped => None,
                PairOutcome::Skipped(_) => continue,
            };

            rows.extend(
                pair.series
                    .points()
                    .iter()
                    .map(|(period, value)| ResultRow::historical(entity, metric, *period, *value)),
            );
            if let Some(forecast) = forecast {
                rows.extend(
                    forecast
                        .points
                        .iter()
                        .map(|point| ResultRow::forecast(entity, metric, point)),
                );
            }
        }

        Self { rows }
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of forecast rows
    pub fn forecast_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_forecast()).count()
    }

    /// Write the table as CSV, replacing any existing file and creating
    /// missing parent directories
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        self.to_writer(File::create(path)?)
    }

    /// Write the table as CSV to any writer
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a table previously written by [`ResultTable::write_csv`]
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    /// Read a CSV table from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let rows = reader
            .deserialize()
            .collect::<std::result::Result<Vec<ResultRow>, _>>()?;
        Ok(Self { rows })
    }
}

/// A pair that produced no forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPair {
    pub entity: String,
    pub metric: String,
    pub reason: SkipReason,
}

/// Summary of one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub entities: usize,
    pub metrics: Vec<String>,
    pub pairs_total: usize,
    pub pairs_forecast: usize,
    pub pairs_skipped: usize,
    /// Skip counts keyed by reason kind
    pub skipped_by_reason: BTreeMap<String, usize>,
    pub rows_written: usize,
    pub skipped: Vec<SkippedPair>,
}

impl RunReport {
    /// Summarise evaluated pairs and the table assembled from them
    pub fn new(pairs: &[PairResult], entities: usize, metrics: &[String], table: &ResultTable) -> Self {
        let skipped: Vec<SkippedPair> = pairs
            .iter()
            .filter_map(|pair| match &pair.outcome {
                PairOutcome::Skipped(reason) => Some(SkippedPair {
                    entity: pair.series.entity().to_string(),
                    metric: pair.series.metric().to_string(),
                    reason: reason.clone(),
                }),
                PairOutcome::Forecast(_) => None,
            })
            .collect();

        let mut skipped_by_reason = BTreeMap::new();
        for skip in &skipped {
            *skipped_by_reason
                .entry(skip.reason.kind().to_string())
                .or_insert(0) += 1;
        }

        Self {
            generated_at: Utc::now(),
            entities,
            metrics: metrics.to_vec(),
            pairs_total: pairs.len(),
            pairs_forecast: pairs.len() - skipped.len(),
            pairs_skipped: skipped.len(),
            skipped_by_reason,
            rows_written: table.len(),
            skipped,
        }
    }

    /// Write the report as pretty-printed JSON
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
