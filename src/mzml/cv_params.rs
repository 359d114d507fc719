//! Controlled Vocabulary (CV) parameter handling for mzML
//!
//! mzML describes spectra with PSI-MS ontology terms. Only the terms the
//! feature pipeline reads are mapped here.

use serde::{Deserialize, Serialize};

/// A controlled vocabulary parameter from mzML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CvParam {
    /// Accession number (e.g., "MS:1000511")
    pub accession: String,

    /// Human-readable name
    pub name: String,

    /// Optional value
    pub value: Option<String>,

    /// Unit accession
    pub unit_accession: Option<String>,
}

impl CvParam {
    /// Get the value as f64 if possible
    pub fn value_as_f64(&self) -> Option<f64> {
        self.value.as_ref()?.trim().parse().ok()
    }

    /// Get the value as i64 if possible
    pub fn value_as_i64(&self) -> Option<i64> {
        self.value.as_ref()?.trim().parse().ok()
    }
}

/// MS CV accessions read by the spectrum streamer
#[allow(non_snake_case)]
pub mod MS_CV_ACCESSIONS {
    /// MS level
    pub const MS_LEVEL: &str = "MS:1000511";

    /// Centroid spectrum
    pub const CENTROID_SPECTRUM: &str = "MS:1000127";

    /// Profile spectrum
    pub const PROFILE_SPECTRUM: &str = "MS:1000128";

    /// Scan start time (retention time)
    pub const SCAN_START_TIME: &str = "MS:1000016";

    /// 32-bit float
    pub const FLOAT_32_BIT: &str = "MS:1000521";

    /// 64-bit float
    pub const FLOAT_64_BIT: &str = "MS:1000523";

    /// zlib compression
    pub const ZLIB_COMPRESSION: &str = "MS:1000574";

    /// No compression
    pub const NO_COMPRESSION: &str = "MS:1000576";

    /// m/z array
    pub const MZ_ARRAY: &str = "MS:1000514";

    /// Intensity array
    pub const INTENSITY_ARRAY: &str = "MS:1000515";

    /// Unit: second
    pub const UNIT_SECOND: &str = "UO:0000010";

    /// Unit: minute
    pub const UNIT_MINUTE: &str = "UO:0000031";

    /// Unit: millisecond
    pub const UNIT_MILLISECOND: &str = "UO:0000028";
}

/// Convert a `scan start time` value to seconds using its unit accession
pub fn normalize_retention_time(value: f64, unit_accession: Option<&str>) -> f64 {
    match unit_accession {
        Some(MS_CV_ACCESSIONS::UNIT_MINUTE) => value * 60.0,
        Some(MS_CV_ACCESSIONS::UNIT_MILLISECOND) => value / 1000.0,
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cv_param_value_parsing() {
        let param = CvParam {
            accession: MS_CV_ACCESSIONS::MS_LEVEL.to_string(),
            name: "ms level".to_string(),
            value: Some(" 2 ".to_string()),
            ..Default::default()
        };

        assert_eq!(param.value_as_i64(), Some(2));
        assert_eq!(param.value_as_f64(), Some(2.0));
    }

    #[test]
    fn test_flag_param_has_no_value() {
        let param = CvParam {
            accession: MS_CV_ACCESSIONS::CENTROID_SPECTRUM.to_string(),
            ..Default::default()
        };
        assert_eq!(param.value_as_f64(), None);
    }

    #[test]
    fn test_normalize_retention_time() {
        assert_eq!(normalize_retention_time(1.5, Some(MS_CV_ACCESSIONS::UNIT_MINUTE)), 90.0);
        assert_eq!(normalize_retention_time(1500.0, Some(MS_CV_ACCESSIONS::UNIT_MILLISECOND)), 1.5);
        assert_eq!(normalize_retention_time(42.0, Some(MS_CV_ACCESSIONS::UNIT_SECOND)), 42.0);
        assert_eq!(normalize_retention_time(42.0, None), 42.0);
    }
}
