//! # Feature Detection
//!
//! The pipeline talks to feature detection through [`FeatureDetector`], so a
//! numerical engine can be swapped in without touching binning or
//! normalization, and tests can feed synthetic feature sets.
//!
//! [`MetaboDetector`] is the built-in engine. It runs three stages over the
//! MS1 scans of an [`Experiment`]:
//!
//! 1. [`mass_trace`]: link peaks of near-constant m/z across adjacent scans
//! 2. [`elution`]: split traces into single elution peaks and drop traces of
//!    implausible width
//! 3. [`feature_finder`]: group co-eluting isotope traces into charged
//!    features, discarding traces that found no isotope partner

pub mod elution;
pub mod feature_finder;
pub mod mass_trace;

use log::{debug, info};

use crate::experiment::Experiment;
use crate::features::RawFeature;

pub use elution::{ElutionConfig, WidthFiltering};
pub use feature_finder::FeatureFinderConfig;
pub use mass_trace::{MassTrace, MassTraceConfig};

/// Parameters supplied to a detector for one run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    /// Mass tolerance in ppm
    pub mass_error_ppm: f64,
    /// Noise floor for peaks and minimum feature intensity
    pub min_intensity: f64,
    /// GPU acceleration hint; engines without GPU support ignore it
    pub use_gpu: bool,
}

/// Chromatogram of a detected feature's monoisotopic trace
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTrace {
    /// Retention times in seconds
    pub rt: Vec<f64>,
    /// Intensities at each retention time
    pub intensity: Vec<f64>,
}

/// Everything a detector reports for one experiment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionOutput {
    /// Detected features, in detector order
    pub features: Vec<RawFeature>,
    /// One chromatogram per feature, parallel to `features`
    pub traces: Vec<FeatureTrace>,
}

/// Errors reported by a feature detector
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    /// Parameters the engine cannot work with
    #[error("Invalid detection parameter: {0}")]
    InvalidParameter(String),

    /// Input experiment violates an engine precondition
    #[error("Invalid experiment: {0}")]
    InvalidExperiment(String),

    /// Failure inside the engine
    #[error("Detection engine failure: {0}")]
    Engine(String),
}

/// A feature detection engine
pub trait FeatureDetector {
    /// Detect features in an RT-sorted experiment
    fn detect(
        &self,
        experiment: &Experiment,
        params: &DetectionParams,
    ) -> Result<DetectionOutput, DetectionError>;
}

impl<F> FeatureDetector for F
where
    F: Fn(&Experiment, &DetectionParams) -> Result<DetectionOutput, DetectionError>,
{
    fn detect(
        &self,
        experiment: &Experiment,
        params: &DetectionParams,
    ) -> Result<DetectionOutput, DetectionError> {
        self(experiment, params)
    }
}

/// Built-in mass-trace / elution-peak / isotope-grouping detector
#[derive(Debug, Clone, Default)]
pub struct MetaboDetector {
    /// Mass trace stage settings
    pub mass_traces: MassTraceConfig,
    /// Elution peak stage settings
    pub elution: ElutionConfig,
    /// Feature assembly settings
    pub feature_finder: FeatureFinderConfig,
}

impl MetaboDetector {
    /// Detector with default stage settings
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeatureDetector for MetaboDetector {
    fn detect(
        &self,
        experiment: &Experiment,
        params: &DetectionParams,
    ) -> Result<DetectionOutput, DetectionError> {
        if !(params.mass_error_ppm.is_finite() && params.mass_error_ppm > 0.0) {
            return Err(DetectionError::InvalidParameter(format!(
                "mass_error_ppm must be positive, got {}",
                params.mass_error_ppm
            )));
        }
        check_sorted(experiment)?;
        if params.use_gpu {
            debug!("GPU acceleration requested; the built-in detector runs on the CPU");
        }

        let traces = mass_trace::detect_mass_traces(
            experiment,
            params.mass_error_ppm,
            params.min_intensity,
            &self.mass_traces,
        );
        info!("Detected {} mass traces", traces.len());

        let peaks = elution::split_elution_peaks(traces, &self.elution);
        info!("Split into {} elution peaks", peaks.len());

        let output = feature_finder::assemble_features(
            &peaks,
            params.mass_error_ppm,
            params.min_intensity,
            &self.feature_finder,
        );
        info!("Assembled {} features", output.features.len());

        Ok(output)
    }
}

fn check_sorted(experiment: &Experiment) -> Result<(), DetectionError> {
    let spectra = experiment.spectra();
    if spectra
        .windows(2)
        .any(|w| w[0].retention_time > w[1].retention_time)
    {
        return Err(DetectionError::InvalidExperiment(
            "spectra are not sorted by retention time".to_string(),
        ));
    }
    if let Some(spectrum) = spectra
        .iter()
        .find(|s| s.mz.windows(2).any(|w| w[0] > w[1]))
    {
        return Err(DetectionError::InvalidExperiment(format!(
            "peaks of spectrum {} are not sorted by m/z",
            spectrum.native_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
