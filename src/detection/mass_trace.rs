//! Mass trace detection
//!
//! Peaks are visited from most to least intense. Each unvisited peak seeds a
//! trace that is extended scan by scan in both directions, always taking the
//! closest unvisited peak within the mass tolerance of the running
//! intensity-weighted centroid. Extension stops after more than
//! `max_missing_scans` consecutive scans without a match.

use crate::experiment::Experiment;

/// Mass trace detection settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassTraceConfig {
    /// Minimum number of peaks in a trace
    pub min_scans: usize,
    /// Consecutive scans without a matching peak before extension stops
    pub max_missing_scans: usize,
}

impl Default for MassTraceConfig {
    fn default() -> Self {
        Self {
            min_scans: 3,
            max_missing_scans: 3,
        }
    }
}

/// Peaks of one ion followed across consecutive scans
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MassTrace {
    /// Retention times in seconds, ascending
    pub rt: Vec<f64>,
    /// m/z of each peak
    pub mz: Vec<f64>,
    /// Intensity of each peak
    pub intensity: Vec<f64>,
}

impl MassTrace {
    /// Number of peaks
    pub fn len(&self) -> usize {
        self.rt.len()
    }

    /// Whether the trace has no peaks
    pub fn is_empty(&self) -> bool {
        self.rt.is_empty()
    }

    /// Intensity-weighted mean m/z
    pub fn centroid_mz(&self) -> f64 {
        let total = self.total_intensity();
        if total > 0.0 {
            self.mz
                .iter()
                .zip(&self.intensity)
                .map(|(mz, int)| mz * int)
                .sum::<f64>()
                / total
        } else {
            self.mz.iter().sum::<f64>() / self.mz.len().max(1) as f64
        }
    }

    /// Index of the most intense peak (first one on ties)
    pub fn apex_index(&self) -> usize {
        let mut apex = 0;
        for (i, &int) in self.intensity.iter().enumerate() {
            if int > self.intensity[apex] {
                apex = i;
            }
        }
        apex
    }

    /// Retention time of the apex
    pub fn apex_rt(&self) -> f64 {
        self.rt.get(self.apex_index()).copied().unwrap_or(f64::NAN)
    }

    /// Intensity of the apex
    pub fn apex_intensity(&self) -> f64 {
        self.intensity
            .get(self.apex_index())
            .copied()
            .unwrap_or(0.0)
    }

    /// Sum of peak intensities
    pub fn total_intensity(&self) -> f64 {
        self.intensity.iter().sum()
    }

    /// First and last retention time
    pub fn rt_range(&self) -> (f64, f64) {
        match (self.rt.first(), self.rt.last()) {
            (Some(&start), Some(&end)) => (start, end),
            _ => (f64::NAN, f64::NAN),
        }
    }

    /// Full width at half maximum, in seconds.
    ///
    /// Measured between the outermost points of the contiguous run around the
    /// apex whose intensity is at least half the apex intensity.
    pub fn fwhm(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let apex = self.apex_index();
        let half = self.intensity[apex] / 2.0;

        let mut left = apex;
        while left > 0 && self.intensity[left - 1] >= half {
            left -= 1;
        }
        let mut right = apex;
        while right + 1 < self.len() && self.intensity[right + 1] >= half {
            right += 1;
        }
        self.rt[right] - self.rt[left]
    }

    /// Sub-trace covering `range`
    pub fn slice(&self, range: std::ops::Range<usize>) -> Self {
        Self {
            rt: self.rt[range.clone()].to_vec(),
            mz: self.mz[range.clone()].to_vec(),
            intensity: self.intensity[range].to_vec(),
        }
    }

    fn push(&mut self, rt: f64, mz: f64, intensity: f64) {
        self.rt.push(rt);
        self.mz.push(mz);
        self.intensity.push(intensity);
    }
}

/// Running intensity-weighted m/z centroid
struct Centroid {
    weighted_sum: f64,
    weight: f64,
    fallback: f64,
}

impl Centroid {
    fn new(mz: f64, intensity: f64) -> Self {
        Self {
            weighted_sum: mz * intensity,
            weight: intensity,
            fallback: mz,
        }
    }

    fn add(&mut self, mz: f64, intensity: f64) {
        self.weighted_sum += mz * intensity;
        self.weight += intensity;
    }

    fn value(&self) -> f64 {
        if self.weight > 0.0 {
            self.weighted_sum / self.weight
        } else {
            self.fallback
        }
    }
}

/// Build mass traces from an experiment whose spectra are sorted by RT and
/// whose peaks are sorted by m/z.
///
/// Peaks with intensity below `noise_threshold` (or not above zero) never
/// join a trace. Traces are returned in seed order, most intense first.
pub fn detect_mass_traces(
    experiment: &Experiment,
    mass_error_ppm: f64,
    noise_threshold: f64,
    config: &MassTraceConfig,
) -> Vec<MassTrace> {
    let spectra = experiment.spectra();
    let usable = |intensity: f64| intensity > 0.0 && intensity >= noise_threshold;

    let mut seeds: Vec<(usize, usize)> = spectra
        .iter()
        .enumerate()
        .flat_map(|(scan, spectrum)| {
            spectrum
                .intensity
                .iter()
                .enumerate()
                .filter(|&(_, &int)| usable(int))
                .map(move |(peak, _)| (scan, peak))
        })
        .collect();
    seeds.sort_by(|a, b| {
        let ia = spectra[a.0].intensity[a.1];
        let ib = spectra[b.0].intensity[b.1];
        ib.total_cmp(&ia).then(a.cmp(b))
    });

    let mut visited: Vec<Vec<bool>> = spectra
        .iter()
        .map(|s| vec![false; s.peak_count()])
        .collect();
    let mut traces = Vec::new();

    for (seed_scan, seed_peak) in seeds {
        if visited[seed_scan][seed_peak] {
            continue;
        }
        visited[seed_scan][seed_peak] = true;

        let seed_mz = spectra[seed_scan].mz[seed_peak];
        let seed_intensity = spectra[seed_scan].intensity[seed_peak];
        let mut centroid = Centroid::new(seed_mz, seed_intensity);

        let mut backward: Vec<(usize, usize)> = Vec::new();
        let mut forward: Vec<(usize, usize)> = Vec::new();

        for direction in [Direction::Forward, Direction::Backward] {
            let mut misses = 0;
            let mut scan = seed_scan;
            while misses <= config.max_missing_scans {
                scan = match direction.step(scan, spectra.len()) {
                    Some(next) => next,
                    None => break,
                };
                let spectrum = &spectra[scan];
                let matched = closest_peak(
                    &spectrum.mz,
                    &spectrum.intensity,
                    &visited[scan],
                    centroid.value(),
                    mass_error_ppm,
                    usable,
                );
                match matched {
                    Some(peak) => {
                        visited[scan][peak] = true;
                        centroid.add(spectrum.mz[peak], spectrum.intensity[peak]);
                        match direction {
                            Direction::Forward => forward.push((scan, peak)),
                            Direction::Backward => backward.push((scan, peak)),
                        }
                        misses = 0;
                    }
                    None => misses += 1,
                }
            }
        }

        let count = backward.len() + 1 + forward.len();
        if count < config.min_scans {
            // Released peaks may still join a later, weaker trace
            for &(scan, peak) in backward.iter().chain(&forward) {
                visited[scan][peak] = false;
            }
            continue;
        }

        let mut trace = MassTrace::default();
        for &(scan, peak) in backward
            .iter()
            .rev()
            .chain(std::iter::once(&(seed_scan, seed_peak)))
            .chain(&forward)
        {
            let spectrum = &spectra[scan];
            trace.push(
                spectrum.retention_time,
                spectrum.mz[peak],
                spectrum.intensity[peak],
            );
        }
        traces.push(trace);
    }

    traces
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn step(self, scan: usize, len: usize) -> Option<usize> {
        match self {
            Direction::Forward => (scan + 1 < len).then_some(scan + 1),
            Direction::Backward => scan.checked_sub(1),
        }
    }
}

/// Closest unvisited, usable peak within tolerance of `target`
fn closest_peak(
    mz: &[f64],
    intensity: &[f64],
    visited: &[bool],
    target: f64,
    mass_error_ppm: f64,
    usable: impl Fn(f64) -> bool,
) -> Option<usize> {
    let tolerance = target.abs() * mass_error_ppm * 1e-6;
    let low = target - tolerance;
    let high = target + tolerance;

    let start = mz.partition_point(|&m| m < low);
    let mut best: Option<(usize, f64)> = None;
    for (i, &m) in mz.iter().enumerate().skip(start) {
        if m > high {
            break;
        }
        if visited[i] || !usable(intensity[i]) {
            continue;
        }
        let distance = (m - target).abs();
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((i, distance));
        }
    }
    best.map(|(i, _)| i)
}
