//! # mzbin - Single-Sample LC-MS Feature Tables
//!
//! `mzbin` turns one mzML acquisition into a compact, comparable feature
//! table: features are detected in the MS1 data, snapped onto a fixed
//! m/z x retention-time grid, and scaled so that every sample sums to the same
//! total intensity.
//!
//! ## Pipeline
//!
//! ```text
//! mzML ──► sample id (`<sample id>` or file stem)
//!   │
//!   └──► Experiment (MS1, RT-sorted) ──► FeatureDetector ──► bin_features ──► normalize_tic
//!                                                                                   │
//!                                                  SampleRecord ◄────────────────────┘
//!                                                       │
//!                                      FeatureTableWriter (Parquet / Arrow IPC)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mzbin::prelude::*;
//!
//! let params = PipelineParams::from_file("params.json")?;
//! let pipeline = FeaturePipeline::new(params.clone())?;
//!
//! if let Some(record) = pipeline.process("QC_01.mzML") {
//!     FeatureTableWriter::new()
//!         .with_params(params)
//!         .write_file("QC_01.parquet", &record)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Detectors
//!
//! Any [`detection::FeatureDetector`] can replace the built-in engine,
//! including plain functions and closures:
//!
//! ```rust
//! use mzbin::prelude::*;
//!
//! let detector = |_: &Experiment, _: &DetectionParams| -> Result<DetectionOutput, DetectionError> {
//!     Ok(DetectionOutput {
//!         features: vec![RawFeature::new(181.0707, 62.0, 5.0e4, 1)],
//!         traces: vec![FeatureTrace::default()],
//!     })
//! };
//! let params = PipelineParams::from_json_str(
//!     r#"{"mass_error_ppm": 5, "min_intensity": 1000, "mz_bin_size": 0.005, "rt_bin_size": 5}"#,
//! )?;
//! let record = FeaturePipeline::with_detector(params, detector)?
//!     .process_experiment("S1".to_string(), &Experiment::default())?;
//! assert_eq!(record.features[0].intensity, 1.0e6);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod binning;
pub mod config;
pub mod detection;
pub mod experiment;
pub mod features;
pub mod identifier;
pub mod mzml;
pub mod normalize;
pub mod pipeline;
pub mod writer;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::binning::{bin_features, BinningError};
    pub use crate::config::{ConfigError, PipelineParams, DEFAULT_CONFIG_FILE};
    pub use crate::detection::{
        DetectionError, DetectionOutput, DetectionParams, FeatureDetector, FeatureTrace,
        MetaboDetector,
    };
    pub use crate::experiment::{Experiment, ScanSpectrum};
    pub use crate::features::{BinnedFeature, NormalizedFeature, RawFeature, SampleRecord};
    pub use crate::identifier::decode_mzml_id;
    pub use crate::mzml::{get_sample_id, MzMLError, MzMLStreamer};
    pub use crate::normalize::{normalize_tic, TIC_TARGET};
    pub use crate::pipeline::{BatchSummary, FeaturePipeline, ProcessingError};
    pub use crate::writer::{FeatureTableWriter, OutputFormat, WriterConfig, WriterError};
}
