//! Feature records passed between pipeline stages

use serde::{Deserialize, Serialize};

/// A feature as reported by a detector, before binning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawFeature {
    /// Monoisotopic m/z
    pub mz: f64,
    /// Retention time in seconds
    pub rt: f64,
    /// Feature intensity
    pub intensity: f64,
    /// Charge state, 0 when unknown
    pub charge: i32,
}

impl RawFeature {
    /// Create a raw feature
    pub fn new(mz: f64, rt: f64, intensity: f64, charge: i32) -> Self {
        Self {
            mz,
            rt,
            intensity,
            charge,
        }
    }
}

/// All raw features falling into one m/z x RT grid cell, aggregated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinnedFeature {
    /// m/z bin centre (a multiple of the m/z bin size)
    pub mz_bin: f64,
    /// RT bin centre (a multiple of the RT bin size)
    pub rt_bin: f64,
    /// Summed intensity of the contributing features
    pub intensity: f64,
    /// Most frequent charge among the contributing features
    pub charge: i32,
}

/// A binned feature after total-intensity normalization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFeature {
    /// m/z bin centre
    pub mz_bin: f64,
    /// RT bin centre
    pub rt_bin: f64,
    /// Intensity scaled to the sample total
    pub intensity: f64,
    /// Charge state
    pub charge: i32,
}

impl NormalizedFeature {
    pub(crate) fn from_binned(feature: &BinnedFeature, intensity: f64) -> Self {
        Self {
            mz_bin: feature.mz_bin,
            rt_bin: feature.rt_bin,
            intensity,
            charge: feature.charge,
        }
    }
}

/// Final output for one input file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Sample identifier written alongside every feature row
    pub sample_id: String,
    /// Normalized features, ordered by (m/z bin, RT bin)
    pub features: Vec<NormalizedFeature>,
}

impl SampleRecord {
    /// Number of feature rows
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the record holds no features
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Sum of all feature intensities
    pub fn total_intensity(&self) -> f64 {
        self.features.iter().map(|f| f.intensity).sum()
    }
}
