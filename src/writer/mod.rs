//! # Feature Table Writer
//!
//! Writes a [`SampleRecord`] as a five-column table (`mz`, `rt`, `intensity`,
//! `charge`, `sample_id`), one row per normalized feature. The container is
//! picked from the output extension: `.feather`, `.arrow` and `.ipc` give an
//! Arrow IPC file, anything else Parquet.
//!
//! Parquet output is ZSTD-compressed with column statistics and carries the
//! sample id, layout version and run parameters in its key-value footer. Arrow
//! IPC output stores the same keys as schema metadata.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int32Array, StringArray};
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use log::{info, warn};
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::format::KeyValue;

use crate::config::PipelineParams;
use crate::features::SampleRecord;

pub mod schema;

pub use schema::{create_feature_schema, feature_columns, metadata_keys, FORMAT_VERSION};

/// Errors that can occur while writing a feature table
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error building Arrow arrays or writing IPC
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// Error writing Parquet
    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    /// Parameters could not be serialized for the footer
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Output container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Apache Parquet
    #[default]
    Parquet,
    /// Arrow IPC file (Feather v2)
    ArrowIpc,
}

impl OutputFormat {
    /// Pick the container from a file extension
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
        match extension.as_deref() {
            Some("feather" | "arrow" | "ipc") => Self::ArrowIpc,
            _ => Self::Parquet,
        }
    }

    /// Conventional file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Parquet => "parquet",
            Self::ArrowIpc => "feather",
        }
    }
}

/// Configuration for the feature table writer
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// ZSTD compression level
    pub compression_level: i32,
    /// Maximum rows per Parquet row group
    pub row_group_size: usize,
    /// Whether to write column statistics
    pub write_statistics: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compression_level: 3,
            row_group_size: 100_000,
            write_statistics: true,
        }
    }
}

impl WriterConfig {
    fn to_writer_properties(&self, metadata: &HashMap<String, String>) -> WriterProperties {
        let compression =
            Compression::ZSTD(ZstdLevel::try_new(self.compression_level).unwrap_or_default());

        let statistics = if self.write_statistics {
            EnabledStatistics::Chunk
        } else {
            EnabledStatistics::None
        };

        let mut kv_metadata: Vec<KeyValue> = metadata
            .iter()
            .map(|(k, v)| KeyValue {
                key: k.clone(),
                value: Some(v.clone()),
            })
            .collect();
        kv_metadata.sort_by(|a, b| a.key.cmp(&b.key));

        WriterProperties::builder()
            .set_compression(compression)
            .set_statistics_enabled(statistics)
            .set_max_row_group_size(self.row_group_size)
            .set_key_value_metadata(Some(kv_metadata))
            .build()
    }
}

/// Statistics from a completed write
#[derive(Debug, Clone, PartialEq)]
pub struct WriterStats {
    /// Container written
    pub format: OutputFormat,
    /// Feature rows written
    pub rows_written: usize,
    /// Size of the output file in bytes (0 for in-memory targets)
    pub file_size_bytes: u64,
}

impl std::fmt::Display for WriterStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Wrote {} features as {} ({} bytes)",
            self.rows_written,
            self.format.extension(),
            self.file_size_bytes
        )
    }
}

/// Writer for per-sample feature tables
#[derive(Debug, Clone, Default)]
pub struct FeatureTableWriter {
    config: WriterConfig,
    params: Option<PipelineParams>,
}

impl FeatureTableWriter {
    /// Create a writer with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom configuration
    pub fn with_config(mut self, config: WriterConfig) -> Self {
        self.config = config;
        self
    }

    /// Record the run parameters in the output metadata
    pub fn with_params(mut self, params: PipelineParams) -> Self {
        self.params = Some(params);
        self
    }

    /// Write a record to `path`, choosing the container from its extension.
    ///
    /// A partially written file is removed when writing fails.
    pub fn write_file<P: AsRef<Path>>(
        &self,
        path: P,
        record: &SampleRecord,
    ) -> Result<WriterStats, WriterError> {
        let path = path.as_ref();
        let format = OutputFormat::from_path(path);

        let result = File::create(path)
            .map_err(WriterError::from)
            .and_then(|file| self.write(BufWriter::new(file), record, format));

        match result {
            Ok(mut stats) => {
                stats.file_size_bytes = std::fs::metadata(path)?.len();
                info!("{} to {}", stats, path.display());
                Ok(stats)
            }
            Err(e) => {
                if path.exists() {
                    if let Err(remove_err) = std::fs::remove_file(path) {
                        warn!("Failed to remove partial output {}: {}", path.display(), remove_err);
                    }
                }
                Err(e)
            }
        }
    }

    /// Write a record to any writer in the given container
    pub fn write<W: Write + Send>(
        &self,
        writer: W,
        record: &SampleRecord,
        format: OutputFormat,
    ) -> Result<WriterStats, WriterError> {
        let metadata = self.metadata(record)?;
        match format {
            OutputFormat::Parquet => self.write_parquet(writer, record, &metadata),
            OutputFormat::ArrowIpc => write_ipc(writer, record, metadata),
        }?;
        Ok(WriterStats {
            format,
            rows_written: record.len(),
            file_size_bytes: 0,
        })
    }

    fn write_parquet<W: Write + Send>(
        &self,
        writer: W,
        record: &SampleRecord,
        metadata: &HashMap<String, String>,
    ) -> Result<(), WriterError> {
        let schema = schema::create_feature_schema_arc();
        let props = self.config.to_writer_properties(metadata);
        let mut arrow_writer = ArrowWriter::try_new(writer, schema.clone(), Some(props))?;
        arrow_writer.write(&record_batch(schema, record)?)?;
        arrow_writer.close()?;
        Ok(())
    }

    fn metadata(&self, record: &SampleRecord) -> Result<HashMap<String, String>, WriterError> {
        let mut metadata = HashMap::new();
        metadata.insert(metadata_keys::SAMPLE_ID.to_string(), record.sample_id.clone());
        metadata.insert(
            metadata_keys::FORMAT_VERSION.to_string(),
            FORMAT_VERSION.to_string(),
        );
        metadata.insert(
            metadata_keys::CREATED.to_string(),
            chrono::Utc::now().to_rfc3339(),
        );
        if let Some(params) = &self.params {
            metadata.insert(
                metadata_keys::PARAMS.to_string(),
                serde_json::to_string(params)?,
            );
        }
        Ok(metadata)
    }
}

fn write_ipc<W: Write>(
    writer: W,
    record: &SampleRecord,
    metadata: HashMap<String, String>,
) -> Result<(), WriterError> {
    let schema = Arc::new(create_feature_schema(metadata));
    let mut ipc_writer = FileWriter::try_new(writer, &schema)?;
    ipc_writer.write(&record_batch(schema, record)?)?;
    ipc_writer.finish()?;
    Ok(())
}

fn record_batch(
    schema: Arc<arrow::datatypes::Schema>,
    record: &SampleRecord,
) -> Result<RecordBatch, WriterError> {
    let features = &record.features;
    let arrays: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from_iter_values(features.iter().map(|f| f.mz_bin))),
        Arc::new(Float64Array::from_iter_values(features.iter().map(|f| f.rt_bin))),
        Arc::new(Float64Array::from_iter_values(features.iter().map(|f| f.intensity))),
        Arc::new(Int32Array::from_iter_values(features.iter().map(|f| f.charge))),
        Arc::new(StringArray::from_iter_values(
            std::iter::repeat(record.sample_id.as_str()).take(features.len()),
        )),
    ];
    Ok(RecordBatch::try_new(schema, arrays)?)
}

#[cfg(test)]
mod tests;
