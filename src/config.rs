//! Pipeline parameter files
//!
//! Parameters come from a flat JSON document (`params.json` by default) or,
//! for files ending in `.toml`, a flat TOML table:
//!
//! ```json
//! {
//!   "mass_error_ppm": 5.0,
//!   "min_intensity": 1000.0,
//!   "mz_bin_size": 0.005,
//!   "rt_bin_size": 5.0,
//!   "use_gpu": false
//! }
//! ```
//!
//! Every key except `use_gpu` is required. Loading validates the values, so a
//! [`PipelineParams`] that exists is safe to hand to the pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::detection::DetectionParams;

/// Default parameter file name
pub const DEFAULT_CONFIG_FILE: &str = "params.json";

/// Default m/z bin width
pub const DEFAULT_MZ_BIN_SIZE: f64 = 0.005;

/// Default retention-time bin width in seconds
pub const DEFAULT_RT_BIN_SIZE: f64 = 5.0;

/// Errors raised while loading or validating parameters
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Parameter file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON syntax error or missing/mistyped key
    #[error("Invalid JSON parameters: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML syntax error or missing/mistyped key
    #[error("Invalid TOML parameters: {0}")]
    Toml(#[from] toml::de::Error),

    /// A parameter value is out of range
    #[error("Invalid value for {key}: {value} ({reason})")]
    InvalidValue {
        /// Parameter name
        key: &'static str,
        /// Offending value
        value: f64,
        /// What is required
        reason: &'static str,
    },
}

/// Parameters for one run of the feature pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineParams {
    /// Instrument mass accuracy in ppm
    pub mass_error_ppm: f64,
    /// Noise floor; peaks and features below it are ignored
    pub min_intensity: f64,
    /// m/z grid spacing
    pub mz_bin_size: f64,
    /// Retention-time grid spacing in seconds
    pub rt_bin_size: f64,
    /// Ask the detector for GPU acceleration where it has any
    #[serde(default)]
    pub use_gpu: bool,
}

impl PipelineParams {
    /// Load and validate parameters from a file.
    ///
    /// `.toml` files are parsed as TOML; everything else as JSON.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    /// Parse and validate a JSON parameter document
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let params: Self = serde_json::from_str(content)?;
        params.validate()?;
        Ok(params)
    }

    /// Parse and validate a TOML parameter document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let params: Self = toml::from_str(content)?;
        params.validate()?;
        Ok(params)
    }

    /// Check that every value is usable.
    ///
    /// Bin sizes and the mass tolerance must be finite and positive; the
    /// intensity floor must be finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("mass_error_ppm", self.mass_error_ppm)?;
        require_positive("mz_bin_size", self.mz_bin_size)?;
        require_positive("rt_bin_size", self.rt_bin_size)?;
        if !self.min_intensity.is_finite() || self.min_intensity < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "min_intensity",
                value: self.min_intensity,
                reason: "must be a finite, non-negative number",
            });
        }
        Ok(())
    }

    /// Parameters forwarded to the feature detector
    pub fn detection_params(&self) -> DetectionParams {
        DetectionParams {
            mass_error_ppm: self.mass_error_ppm,
            min_intensity: self.min_intensity,
            use_gpu: self.use_gpu,
        }
    }
}

fn require_positive(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key,
            value,
            reason: "must be a finite, positive number",
        })
    }
}
