//! Total-intensity (TIC) normalization

use log::debug;

use crate::features::{BinnedFeature, NormalizedFeature};

/// Summed intensity of every normalized sample
pub const TIC_TARGET: f64 = 1_000_000.0;

/// Scale intensities so that they sum to [`TIC_TARGET`].
///
/// A sample whose total intensity is not positive has no scaling factor; its
/// intensities pass through unchanged.
pub fn normalize_tic(features: &[BinnedFeature]) -> Vec<NormalizedFeature> {
    let total: f64 = features.iter().map(|f| f.intensity).sum();
    if total > 0.0 {
        features
            .iter()
            .map(|f| NormalizedFeature::from_binned(f, f.intensity / total * TIC_TARGET))
            .collect()
    } else {
        debug!("Total intensity is {}, skipping normalization", total);
        features
            .iter()
            .map(|f| NormalizedFeature::from_binned(f, f.intensity))
            .collect()
    }
}
