//! # Feature Pipeline
//!
//! Turns one mzML file into a [`SampleRecord`]:
//!
//! 1. resolve the sample id (falling back to the file stem)
//! 2. load MS1 spectra sorted by retention time
//! 3. run the [`FeatureDetector`]
//! 4. bin features onto the m/z x RT grid
//! 5. TIC-normalize the bins
//!
//! Parameters are validated when the pipeline is built, so a bad grid or
//! tolerance is a [`ConfigError`] before any file is opened.
//!
//! [`FeaturePipeline::process`] is fail-soft: any error is logged with the
//! file path and the file is skipped. [`FeaturePipeline::try_process`]
//! returns the error instead.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use log::{error, info};

use crate::binning::{bin_features, BinningError};
use crate::config::{ConfigError, PipelineParams};
use crate::detection::{DetectionError, FeatureDetector, MetaboDetector};
use crate::experiment::Experiment;
use crate::features::SampleRecord;
use crate::mzml::{get_sample_id, MzMLError};
use crate::normalize::normalize_tic;

mod batch;

pub use batch::{find_mzml_files, BatchSummary};

/// Sample id used when neither metadata nor file name yields one
pub const UNKNOWN_SAMPLE_ID: &str = "unknown";

/// Errors that abort processing of a single file
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    /// Error loading spectra
    #[error("mzML error: {0}")]
    MzMLError(#[from] MzMLError),

    /// Error reported by the detector
    #[error("Detection error: {0}")]
    DetectionError(#[from] DetectionError),

    /// The detector panicked
    #[error("Detector panicked: {0}")]
    DetectorPanicked(String),

    /// Invalid bin grid
    #[error("Binning error: {0}")]
    BinningError(#[from] BinningError),
}

/// Single-sample feature extraction pipeline
pub struct FeaturePipeline<D = MetaboDetector> {
    params: PipelineParams,
    detector: D,
}

impl FeaturePipeline<MetaboDetector> {
    /// Create a pipeline with the built-in detector
    pub fn new(params: PipelineParams) -> Result<Self, ConfigError> {
        Self::with_detector(params, MetaboDetector::default())
    }
}

impl<D: FeatureDetector> FeaturePipeline<D> {
    /// Create a pipeline around a custom detector.
    ///
    /// Fails if `params` does not pass [`PipelineParams::validate`].
    pub fn with_detector(params: PipelineParams, detector: D) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params, detector })
    }

    /// Run parameters
    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Process one file, logging and swallowing any failure.
    ///
    /// Returns `None` when the file was skipped; nothing partial is returned.
    pub fn process<P: AsRef<Path>>(&self, path: P) -> Option<SampleRecord> {
        let path = path.as_ref();
        match self.try_process(path) {
            Ok(record) => Some(record),
            Err(e) => {
                error!("Error processing {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Process one file, returning the first error
    pub fn try_process<P: AsRef<Path>>(&self, path: P) -> Result<SampleRecord, ProcessingError> {
        let path = path.as_ref();
        info!("Processing {}", path.display());

        let sample_id = get_sample_id(path).unwrap_or_else(|| fallback_sample_id(path));
        let experiment = Experiment::load(path)?;
        self.process_experiment(sample_id, &experiment)
    }

    /// Run detection, binning and normalization on a loaded experiment
    pub fn process_experiment(
        &self,
        sample_id: String,
        experiment: &Experiment,
    ) -> Result<SampleRecord, ProcessingError> {
        let params = self.params.detection_params();
        let output = panic::catch_unwind(AssertUnwindSafe(|| {
            self.detector.detect(experiment, &params)
        }))
        .map_err(|payload| ProcessingError::DetectorPanicked(panic_message(payload.as_ref())))??;
        info!("Detected {} features", output.features.len());

        let binned = bin_features(
            &output.features,
            self.params.mz_bin_size,
            self.params.rt_bin_size,
        )?;
        info!("Produced {} bins", binned.len());

        Ok(SampleRecord {
            sample_id,
            features: normalize_tic(&binned),
        })
    }
}

/// Sample id derived from the file name without its extension
pub fn fallback_sample_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| UNKNOWN_SAMPLE_ID.to_string())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
