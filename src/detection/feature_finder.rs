//! Isotope grouping of elution peaks into features
//!
//! Peaks are taken as monoisotopic candidates from most to least intense. For
//! each charge in the configured range the finder looks for consecutive
//! isotope peaks at `mz + k * 1.003355 / z` that apex inside the candidate's
//! elution window. The charge explaining the most isotopes wins; ties go to
//! the lower charge.

use super::mass_trace::MassTrace;
use super::{DetectionOutput, FeatureTrace};
use crate::features::RawFeature;

/// Mass difference between 13C and 12C
pub const C13_MASS_DIFFERENCE: f64 = 1.003_354_837_8;

/// Feature assembly settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureFinderConfig {
    /// Lowest charge tried
    pub charge_lower_bound: i32,
    /// Highest charge tried
    pub charge_upper_bound: i32,
    /// Maximum isotope peaks after the monoisotopic one
    pub max_isotopes: usize,
    /// Drop peaks without any isotope partner instead of reporting them with
    /// charge 0
    pub remove_single_traces: bool,
}

impl Default for FeatureFinderConfig {
    fn default() -> Self {
        Self {
            charge_lower_bound: 1,
            charge_upper_bound: 3,
            max_isotopes: 5,
            remove_single_traces: true,
        }
    }
}

/// Group elution peaks into features.
///
/// Feature intensity is the summed intensity of all member peaks; features
/// below `min_intensity` are dropped. Position and chromatogram come from the
/// monoisotopic peak.
pub fn assemble_features(
    peaks: &[MassTrace],
    mass_error_ppm: f64,
    min_intensity: f64,
    config: &FeatureFinderConfig,
) -> DetectionOutput {
    let centroids: Vec<f64> = peaks.iter().map(MassTrace::centroid_mz).collect();

    let mut by_mz: Vec<usize> = (0..peaks.len()).collect();
    by_mz.sort_by(|&a, &b| centroids[a].total_cmp(&centroids[b]));
    let sorted_mz: Vec<f64> = by_mz.iter().map(|&i| centroids[i]).collect();

    let mut by_intensity: Vec<usize> = (0..peaks.len()).collect();
    by_intensity.sort_by(|&a, &b| {
        peaks[b]
            .apex_intensity()
            .total_cmp(&peaks[a].apex_intensity())
            .then(centroids[a].total_cmp(&centroids[b]))
    });

    let mut assigned = vec![false; peaks.len()];
    let mut output = DetectionOutput::default();

    for mono in by_intensity {
        if assigned[mono] {
            continue;
        }
        let (rt_start, rt_end) = peaks[mono].rt_range();

        let mut best_charge = 0;
        let mut best_isotopes: Vec<usize> = Vec::new();
        for charge in config.charge_lower_bound.max(1)..=config.charge_upper_bound {
            let mut isotopes: Vec<usize> = Vec::new();
            for k in 1..=config.max_isotopes {
                let target = centroids[mono] + k as f64 * C13_MASS_DIFFERENCE / f64::from(charge);
                let tolerance = target * mass_error_ppm * 1e-6;
                let start = sorted_mz.partition_point(|&m| m < target - tolerance);

                let candidate = by_mz[start..]
                    .iter()
                    .zip(&sorted_mz[start..])
                    .take_while(|&(_, &m)| m <= target + tolerance)
                    .filter(|&(&j, _)| {
                        j != mono && !assigned[j] && !isotopes.contains(&j) && {
                            let apex = peaks[j].apex_rt();
                            apex >= rt_start && apex <= rt_end
                        }
                    })
                    .min_by(|a, b| (a.1 - target).abs().total_cmp(&(b.1 - target).abs()))
                    .map(|(&j, _)| j);

                match candidate {
                    Some(j) => isotopes.push(j),
                    None => break,
                }
            }
            if isotopes.len() > best_isotopes.len() {
                best_charge = charge;
                best_isotopes = isotopes;
            }
        }

        if best_isotopes.is_empty() && config.remove_single_traces {
            continue;
        }

        let intensity = peaks[mono].total_intensity()
            + best_isotopes
                .iter()
                .map(|&j| peaks[j].total_intensity())
                .sum::<f64>();
        if intensity < min_intensity {
            continue;
        }

        assigned[mono] = true;
        for &j in &best_isotopes {
            assigned[j] = true;
        }

        output.features.push(RawFeature::new(
            centroids[mono],
            peaks[mono].apex_rt(),
            intensity,
            best_charge,
        ));
        output.traces.push(FeatureTrace {
            rt: peaks[mono].rt.clone(),
            intensity: peaks[mono].intensity.clone(),
        });
    }

    output
}
