//! Data models for parsed mzML spectra

/// A single spectrum from an mzML file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MzMLSpectrum {
    /// Spectrum index (0-based)
    pub index: i64,

    /// Native spectrum ID from the file
    pub id: String,

    /// Default array length (number of peaks)
    pub default_array_length: usize,

    /// MS level (1 for MS1, 2 for MS2, etc.)
    pub ms_level: i16,

    /// `Some(true)` for centroid, `Some(false)` for profile data, `None`
    /// when the file does not say
    pub centroided: Option<bool>,

    /// Retention time in seconds
    pub retention_time: Option<f64>,

    /// m/z array (decoded)
    pub mz_array: Vec<f64>,

    /// Intensity array (decoded)
    pub intensity_array: Vec<f64>,
}

impl MzMLSpectrum {
    /// Number of peaks
    pub fn peak_count(&self) -> usize {
        self.mz_array.len()
    }
}
