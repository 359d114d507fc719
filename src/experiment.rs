//! In-memory LC-MS experiment handed to feature detection
//!
//! Only MS1 spectra are kept: features are precursor-level objects, and
//! fragment scans would otherwise be linked into mass traces. Detection
//! expects centroided peaks; MS1 spectra flagged as profile data are kept
//! but counted and reported.

use std::io::BufRead;
use std::path::Path;

use log::{debug, info, warn};

use crate::mzml::{MzMLError, MzMLSpectrum, MzMLStreamer};

/// One MS1 scan with its centroided peaks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanSpectrum {
    /// Native spectrum ID
    pub native_id: String,
    /// Retention time in seconds
    pub retention_time: f64,
    /// m/z values
    pub mz: Vec<f64>,
    /// Intensities, parallel to `mz`
    pub intensity: Vec<f64>,
}

impl ScanSpectrum {
    /// Create a scan from parallel peak arrays
    pub fn new(native_id: impl Into<String>, retention_time: f64, mz: Vec<f64>, intensity: Vec<f64>) -> Self {
        Self {
            native_id: native_id.into(),
            retention_time,
            mz,
            intensity,
        }
    }

    /// Number of peaks
    pub fn peak_count(&self) -> usize {
        self.mz.len()
    }

    /// Reorder peaks by ascending m/z
    pub fn sort_peaks(&mut self) {
        if self.mz.windows(2).all(|w| w[0] <= w[1]) {
            return;
        }
        let mut peaks: Vec<(f64, f64)> = self
            .mz
            .iter()
            .copied()
            .zip(self.intensity.iter().copied())
            .collect();
        peaks.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (mz, intensity): (Vec<f64>, Vec<f64>) = peaks.into_iter().unzip();
        self.mz = mz;
        self.intensity = intensity;
    }

    fn try_from_mzml(spectrum: MzMLSpectrum) -> Result<Self, MzMLError> {
        let retention_time = spectrum.retention_time.filter(|rt| rt.is_finite()).ok_or_else(|| {
            MzMLError::InvalidStructure(format!(
                "Spectrum {} has no valid scan start time",
                spectrum.id
            ))
        })?;
        Ok(Self {
            native_id: spectrum.id,
            retention_time,
            mz: spectrum.mz_array,
            intensity: spectrum.intensity_array,
        })
    }
}

/// MS1 spectra of one run
#[derive(Debug, Clone, Default)]
pub struct Experiment {
    spectra: Vec<ScanSpectrum>,
    profile_spectra: usize,
}

impl Experiment {
    /// Load the MS1 spectra of an mzML file, sorted by retention time with
    /// peaks sorted by m/z.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MzMLError> {
        let path = path.as_ref();
        let experiment = Self::from_streamer(MzMLStreamer::open(path)?)?;
        info!(
            "Loaded {} MS1 spectra ({} peaks) from {}",
            experiment.len(),
            experiment.peak_count(),
            path.display()
        );
        Ok(experiment)
    }

    /// Load from any buffered mzML source
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, MzMLError> {
        Self::from_streamer(MzMLStreamer::new(reader)?)
    }

    fn from_streamer<R: BufRead>(streamer: MzMLStreamer<R>) -> Result<Self, MzMLError> {
        let mut spectra = Vec::new();
        let mut skipped = 0usize;
        let mut profile_spectra = 0usize;
        for spectrum in streamer.spectra() {
            let spectrum = spectrum?;
            if spectrum.ms_level != 1 {
                skipped += 1;
                continue;
            }
            if spectrum.centroided == Some(false) {
                profile_spectra += 1;
            }
            spectra.push(ScanSpectrum::try_from_mzml(spectrum)?);
        }
        debug!("Skipped {} MSn spectra", skipped);
        if profile_spectra > 0 {
            warn!(
                "{} of {} MS1 spectra are profile data; feature detection expects centroided peaks",
                profile_spectra,
                spectra.len()
            );
        }

        let mut experiment = Self {
            spectra,
            profile_spectra,
        };
        experiment.sort_spectra(true);
        Ok(experiment)
    }

    /// Build an experiment from already-decoded scans (unsorted)
    pub fn from_spectra(spectra: Vec<ScanSpectrum>) -> Self {
        Self {
            spectra,
            profile_spectra: 0,
        }
    }

    /// Sort spectra by retention time, and optionally each spectrum's peaks
    /// by m/z. The sort is stable, so scans with equal RT keep file order.
    pub fn sort_spectra(&mut self, sort_peaks: bool) {
        self.spectra
            .sort_by(|a, b| a.retention_time.total_cmp(&b.retention_time));
        if sort_peaks {
            self.spectra.iter_mut().for_each(ScanSpectrum::sort_peaks);
        }
    }

    /// All spectra in current order
    pub fn spectra(&self) -> &[ScanSpectrum] {
        &self.spectra
    }

    /// Number of spectra
    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    /// Whether the experiment holds no spectra
    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }

    /// Number of loaded MS1 spectra flagged as profile data
    pub fn profile_spectrum_count(&self) -> usize {
        self.profile_spectra
    }

    /// Total number of peaks across all spectra
    pub fn peak_count(&self) -> usize {
        self.spectra.iter().map(ScanSpectrum::peak_count).sum()
    }
}
