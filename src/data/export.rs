//! Observation export to CSV or Parquet

use crate::window::Observation;
use arrow::array::{ArrayRef, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Parquet,
}

impl ExportFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

/// Export schema; decimals are stored as strings to keep precision
pub fn observation_schema() -> Schema {
    let decimal = |name: &str, nullable: bool| Field::new(name, DataType::Utf8, nullable);
    Schema::new(vec![
        Field::new(
            "observed_at",
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            false,
        ),
        Field::new("instrument", DataType::Utf8, false),
        decimal("price", true),
        decimal("change_24h_pct", true),
        decimal("volume_24h", true),
        decimal("volume_usd", false),
        decimal("high_24h", true),
        decimal("low_24h", true),
        decimal("open_interest_usd", true),
        decimal("funding_rate_pct", true),
    ])
}

fn optional_column<F>(observations: &[Observation], field: F) -> ArrayRef
where
    F: Fn(&Observation) -> Option<Decimal>,
{
    let values: Vec<Option<String>> = observations
        .iter()
        .map(|o| field(o).map(|d| d.to_string()))
        .collect();
    Arc::new(StringArray::from(values))
}

/// Build one record batch from observations in the given order
pub fn observation_batch(observations: &[Observation]) -> Result<RecordBatch, ArrowError> {
    let timestamps: Vec<i64> = observations
        .iter()
        .map(|o| o.observed_at.timestamp_micros())
        .collect();
    let instruments: Vec<&str> = observations.iter().map(|o| o.instrument_id.as_str()).collect();
    let volumes: Vec<String> = observations.iter().map(|o| o.volume.to_string()).collect();

    RecordBatch::try_new(
        Arc::new(observation_schema()),
        vec![
            Arc::new(TimestampMicrosecondArray::from(timestamps).with_timezone("UTC")) as ArrayRef,
            Arc::new(StringArray::from(instruments)) as ArrayRef,
            optional_column(observations, |o| o.context.price),
            optional_column(observations, |o| o.context.change_24h_pct),
            optional_column(observations, |o| o.context.volume_24h),
            Arc::new(StringArray::from(
                volumes.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            )) as ArrayRef,
            optional_column(observations, |o| o.context.high_24h),
            optional_column(observations, |o| o.context.low_24h),
            optional_column(observations, |o| o.context.open_interest_usd),
            optional_column(observations, |o| o.context.funding_rate_pct),
        ],
    )
}

/// Writes observation sets to timestamped files
#[derive(Debug, Clone)]
pub struct SnapshotExporter {
    output_dir: PathBuf,
    format: ExportFormat,
}

impl SnapshotExporter {
    /// Create an exporter
    pub fn new(output_dir: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
        }
    }

    /// Output format
    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// File path for a prefix and timestamp
    pub fn file_path(&self, prefix: &str, timestamp: DateTime<Utc>) -> PathBuf {
        let filename = format!(
            "{}_{}.{}",
            prefix,
            timestamp.format("%Y%m%d_%H%M%S"),
            self.format.extension()
        );
        self.output_dir.join(filename)
    }

    /// Write observations sorted by volume, largest first
    ///
    /// Returns the written path, or `None` when there is nothing to write.
    pub fn export(
        &self,
        prefix: &str,
        observations: &[Observation],
        timestamp: DateTime<Utc>,
    ) -> anyhow::Result<Option<PathBuf>> {
        if observations.is_empty() {
            return Ok(None);
        }

        fs::create_dir_all(&self.output_dir)?;

        let mut sorted = observations.to_vec();
        sorted.sort_by(|a, b| b.volume.cmp(&a.volume));
        let batch = observation_batch(&sorted)?;

        let path = self.file_path(prefix, timestamp);
        match self.format {
            ExportFormat::Csv => write_csv(&path, &batch)?,
            ExportFormat::Parquet => write_parquet(&path, &batch)?,
        }

        tracing::info!(path = ?path, rows = sorted.len(), "Exported observations");
        Ok(Some(path))
    }
}

fn write_csv(path: &Path, batch: &RecordBatch) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut writer = arrow::csv::Writer::new(file);
    writer.write(batch)?;
    Ok(())
}

fn write_parquet(path: &Path, batch: &RecordBatch) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}
