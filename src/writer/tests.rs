use std::fs::File;

use arrow::array::{Array, Float64Array, Int32Array, StringArray};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::{FileReader, SerializedFileReader};

use super::*;
use crate::features::NormalizedFeature;

fn record() -> SampleRecord {
    SampleRecord {
        sample_id: "QC 01".to_string(),
        features: vec![
            NormalizedFeature {
                mz_bin: 100.0,
                rt_bin: 30.0,
                intensity: 250_000.0,
                charge: 1,
            },
            NormalizedFeature {
                mz_bin: 150.5,
                rt_bin: 60.0,
                intensity: 750_000.0,
                charge: 2,
            },
        ],
    }
}

fn params() -> PipelineParams {
    PipelineParams {
        mass_error_ppm: 5.0,
        min_intensity: 1000.0,
        mz_bin_size: 0.005,
        rt_bin_size: 5.0,
        use_gpu: false,
    }
}

#[test]
fn test_output_format_from_path() {
    assert_eq!(OutputFormat::from_path(Path::new("a.parquet")), OutputFormat::Parquet);
    assert_eq!(OutputFormat::from_path(Path::new("a.feather")), OutputFormat::ArrowIpc);
    assert_eq!(OutputFormat::from_path(Path::new("a.ARROW")), OutputFormat::ArrowIpc);
    assert_eq!(OutputFormat::from_path(Path::new("a.ipc")), OutputFormat::ArrowIpc);
    assert_eq!(OutputFormat::from_path(Path::new("features")), OutputFormat::Parquet);
}

#[test]
fn test_write_parquet_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sample.parquet");

    let stats = FeatureTableWriter::new()
        .with_params(params())
        .write_file(&path, &record())?;
    assert_eq!(stats.rows_written, 2);
    assert_eq!(stats.format, OutputFormat::Parquet);
    assert!(stats.file_size_bytes > 0);

    let reader = SerializedFileReader::new(File::open(&path)?)?;
    let file_metadata = reader.metadata().file_metadata();
    assert_eq!(file_metadata.num_rows(), 2);
    let kv = file_metadata.key_value_metadata().cloned().unwrap_or_default();
    let lookup = |key: &str| {
        kv.iter()
            .find(|entry| entry.key == key)
            .and_then(|entry| entry.value.clone())
    };
    assert_eq!(lookup(metadata_keys::SAMPLE_ID).as_deref(), Some("QC 01"));
    assert_eq!(lookup(metadata_keys::FORMAT_VERSION).as_deref(), Some(FORMAT_VERSION));
    let stored: PipelineParams = serde_json::from_str(&lookup(metadata_keys::PARAMS).unwrap_or_default())?;
    assert_eq!(stored, params());

    let mut batches = ParquetRecordBatchReaderBuilder::try_new(File::open(&path)?)?.build()?;
    let batch = batches.next().unwrap()?;
    let schema = batch.schema();
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    assert_eq!(names, vec!["mz", "rt", "intensity", "charge", "sample_id"]);

    let mz = batch.column(0).as_any().downcast_ref::<Float64Array>().unwrap();
    let charge = batch.column(3).as_any().downcast_ref::<Int32Array>().unwrap();
    let sample = batch.column(4).as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(mz.value(1), 150.5);
    assert_eq!(charge.value(1), 2);
    assert_eq!(sample.value(0), "QC 01");
    assert_eq!(sample.value(1), "QC 01");
    Ok(())
}

#[test]
fn test_write_ipc_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sample.feather");

    let stats = FeatureTableWriter::new().write_file(&path, &record())?;
    assert_eq!(stats.format, OutputFormat::ArrowIpc);

    let reader = arrow::ipc::reader::FileReader::try_new(File::open(&path)?, None)?;
    assert_eq!(
        reader.schema().metadata().get(metadata_keys::SAMPLE_ID).map(String::as_str),
        Some("QC 01")
    );
    let batches: Vec<RecordBatch> = reader.collect::<Result<_, _>>()?;
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].num_rows(), 2);
    let intensity = batches[0]
        .column(2)
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert_eq!(intensity.value(0), 250_000.0);
    Ok(())
}

#[test]
fn test_empty_record() -> Result<(), Box<dyn std::error::Error>> {
    let empty = SampleRecord {
        sample_id: "blank".to_string(),
        features: Vec::new(),
    };
    let mut buffer = Vec::new();
    let stats = FeatureTableWriter::new().write(&mut buffer, &empty, OutputFormat::Parquet)?;
    assert_eq!(stats.rows_written, 0);
    assert!(!buffer.is_empty());
    Ok(())
}

#[test]
fn test_failed_write_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing_dir").join("out.parquet");
    assert!(FeatureTableWriter::new().write_file(&path, &record()).is_err());
    assert!(!path.exists());
}
