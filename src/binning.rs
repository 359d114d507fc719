//! # Feature Binning
//!
//! Detected features are snapped onto a fixed m/z x RT grid so that near
//! duplicates merge and samples share coordinates:
//!
//! ```text
//! mz_bin = round(mz / mz_bin_size) * mz_bin_size
//! rt_bin = round(rt / rt_bin_size) * rt_bin_size
//! ```
//!
//! `round` is half away from zero ([`f64::round`]). Features landing in the
//! same cell are summed; the cell's charge is the most frequent contributing
//! charge, ties going to the charge seen first in input order. The output is
//! ordered by (m/z bin, RT bin).

use std::collections::HashMap;

use log::debug;

use crate::features::{BinnedFeature, RawFeature};

/// Errors raised before binning starts
#[derive(Debug, thiserror::Error)]
pub enum BinningError {
    /// Bin width is zero, negative or not finite
    #[error("Invalid {axis} bin size: {size} (must be a finite, positive number)")]
    InvalidBinSize {
        /// "m/z" or "RT"
        axis: &'static str,
        /// Offending width
        size: f64,
    },
}

/// Snap a coordinate onto the grid
#[inline]
pub fn bin_value(value: f64, bin_size: f64) -> f64 {
    (value / bin_size).round() * bin_size
}

/// Accumulator for one grid cell
struct Cell {
    mz_bin: f64,
    rt_bin: f64,
    intensity: f64,
    // (charge, count) in first-seen order
    charges: Vec<(i32, usize)>,
}

impl Cell {
    fn add(&mut self, intensity: f64, charge: i32) {
        self.intensity += intensity;
        match self.charges.iter_mut().find(|(c, _)| *c == charge) {
            Some((_, count)) => *count += 1,
            None => self.charges.push((charge, 1)),
        }
    }

    fn mode_charge(&self) -> i32 {
        let mut best: Option<(i32, usize)> = None;
        for &(charge, count) in &self.charges {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((charge, count));
            }
        }
        best.map_or(0, |(charge, _)| charge)
    }
}

/// Grid key; -0.0 and 0.0 share a cell
fn key(value: f64) -> u64 {
    (value + 0.0).to_bits()
}

/// Bin and aggregate raw features.
///
/// # Errors
///
/// Returns [`BinningError::InvalidBinSize`] when either bin size is not a
/// finite, positive number. Nothing is binned in that case.
///
/// # Example
///
/// ```
/// use mzbin::binning::bin_features;
/// use mzbin::features::RawFeature;
///
/// let features = [
///     RawFeature::new(100.0012, 31.0, 3.0, 1),
///     RawFeature::new(100.0011, 29.0, 7.0, 1),
/// ];
/// let binned = bin_features(&features, 0.005, 5.0).unwrap();
/// assert_eq!(binned.len(), 1);
/// assert_eq!(binned[0].intensity, 10.0);
/// ```
pub fn bin_features(
    features: &[RawFeature],
    mz_bin_size: f64,
    rt_bin_size: f64,
) -> Result<Vec<BinnedFeature>, BinningError> {
    check_bin_size("m/z", mz_bin_size)?;
    check_bin_size("RT", rt_bin_size)?;

    let mut index: HashMap<(u64, u64), usize> = HashMap::with_capacity(features.len());
    let mut cells: Vec<Cell> = Vec::new();

    for feature in features {
        let mz_bin = bin_value(feature.mz, mz_bin_size);
        let rt_bin = bin_value(feature.rt, rt_bin_size);
        let slot = *index
            .entry((key(mz_bin), key(rt_bin)))
            .or_insert_with(|| {
                cells.push(Cell {
                    mz_bin: mz_bin + 0.0,
                    rt_bin: rt_bin + 0.0,
                    intensity: 0.0,
                    charges: Vec::new(),
                });
                cells.len() - 1
            });
        cells[slot].add(feature.intensity, feature.charge);
    }

    let mut binned: Vec<BinnedFeature> = cells
        .iter()
        .map(|cell| BinnedFeature {
            mz_bin: cell.mz_bin,
            rt_bin: cell.rt_bin,
            intensity: cell.intensity,
            charge: cell.mode_charge(),
        })
        .collect();
    binned.sort_by(|a, b| {
        a.mz_bin
            .total_cmp(&b.mz_bin)
            .then(a.rt_bin.total_cmp(&b.rt_bin))
    });

    debug!(
        "Binned {} features into {} cells",
        features.len(),
        binned.len()
    );
    Ok(binned)
}

fn check_bin_size(axis: &'static str, size: f64) -> Result<(), BinningError> {
    if size.is_finite() && size > 0.0 {
        Ok(())
    } else {
        Err(BinningError::InvalidBinSize { axis, size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_input() {
        assert!(bin_features(&[], 0.005, 5.0).unwrap().is_empty());
    }

    #[test]
    fn test_zero_bin_size_rejected() {
        let features = [RawFeature::new(100.0, 10.0, 1.0, 1)];
        assert!(matches!(
            bin_features(&features, 0.0, 5.0),
            Err(BinningError::InvalidBinSize { axis: "m/z", .. })
        ));
        assert!(matches!(
            bin_features(&features, 0.005, -5.0),
            Err(BinningError::InvalidBinSize { axis: "RT", .. })
        ));
        assert!(bin_features(&features, f64::NAN, 5.0).is_err());
    }

    #[test]
    fn test_intensities_sum_exactly() {
        let features = [
            RawFeature::new(200.0, 60.0, 3.0, 1),
            RawFeature::new(200.0, 60.0, 7.0, 1),
        ];
        let binned = bin_features(&features, 0.005, 5.0).unwrap();
        assert_eq!(binned.len(), 1);
        assert_eq!(binned[0].intensity, 10.0);
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(bin_value(2.5, 1.0), 3.0);
        assert_eq!(bin_value(3.5, 1.0), 4.0);
        assert_eq!(bin_value(-2.5, 1.0), -3.0);
        assert_eq!(bin_value(7.5, 5.0), 10.0);
        assert_eq!(bin_value(12.5, 5.0), 15.0);
        assert_eq!(bin_value(12.4, 5.0), 10.0);
    }

    #[test]
    fn test_bins_are_multiples_of_size() {
        let features = [RawFeature::new(123.4567, 47.3, 1.0, 0)];
        let binned = bin_features(&features, 0.01, 5.0).unwrap();
        assert_eq!(binned[0].mz_bin, 12346.0 * 0.01);
        assert_eq!(binned[0].rt_bin, 45.0);
    }

    #[test]
    fn test_charge_mode() {
        let features = [
            RawFeature::new(300.0, 10.0, 1.0, 1),
            RawFeature::new(300.0, 10.0, 1.0, 2),
            RawFeature::new(300.0, 10.0, 1.0, 2),
        ];
        let binned = bin_features(&features, 0.005, 5.0).unwrap();
        assert_eq!(binned[0].charge, 2);
    }

    #[test]
    fn test_charge_tie_goes_to_first_seen() {
        let features = [
            RawFeature::new(300.0, 10.0, 1.0, 3),
            RawFeature::new(300.0, 10.0, 1.0, 1),
            RawFeature::new(300.0, 10.0, 1.0, 1),
            RawFeature::new(300.0, 10.0, 1.0, 3),
        ];
        assert_eq!(bin_features(&features, 0.005, 5.0).unwrap()[0].charge, 3);

        let reversed: Vec<RawFeature> = features.iter().rev().copied().collect();
        assert_eq!(bin_features(&reversed, 0.005, 5.0).unwrap()[0].charge, 3);

        let swapped = [features[1], features[0], features[2], features[3]];
        assert_eq!(bin_features(&swapped, 0.005, 5.0).unwrap()[0].charge, 1);
    }

    #[test]
    fn test_output_sorted_and_unique() {
        let features = [
            RawFeature::new(500.0, 100.0, 1.0, 1),
            RawFeature::new(100.0, 200.0, 1.0, 1),
            RawFeature::new(100.0, 50.0, 1.0, 1),
            RawFeature::new(100.001, 51.0, 1.0, 1),
        ];
        let binned = bin_features(&features, 0.5, 5.0).unwrap();
        let cells: Vec<(f64, f64)> = binned.iter().map(|b| (b.mz_bin, b.rt_bin)).collect();
        assert_eq!(cells, vec![(100.0, 50.0), (100.0, 200.0), (500.0, 100.0)]);
        assert_eq!(binned[0].intensity, 2.0);
    }

    #[test]
    fn test_negative_zero_shares_cell() {
        let features = [
            RawFeature::new(100.0, -0.4, 1.0, 1),
            RawFeature::new(100.0, 0.4, 1.0, 1),
        ];
        let binned = bin_features(&features, 0.005, 5.0).unwrap();
        assert_eq!(binned.len(), 1);
        assert!(binned[0].rt_bin.is_sign_positive());
    }

    fn raw_feature() -> impl Strategy<Value = RawFeature> {
        (50.0f64..1500.0, 0.0f64..1800.0, 0u32..1000, 0i32..4).prop_map(
            |(mz, rt, intensity, charge)| RawFeature::new(mz, rt, f64::from(intensity), charge),
        )
    }

    proptest! {
        #[test]
        fn prop_permutation_gives_same_cells(
            (features, shuffled) in prop::collection::vec(raw_feature(), 0..60)
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
        ) {
            let a = bin_features(&features, 0.01, 5.0).unwrap();
            let b = bin_features(&shuffled, 0.01, 5.0).unwrap();
            let cells = |v: &[BinnedFeature]| -> Vec<(f64, f64, f64)> {
                v.iter().map(|f| (f.mz_bin, f.rt_bin, f.intensity)).collect()
            };
            prop_assert_eq!(cells(&a), cells(&b));
        }

        #[test]
        fn prop_total_intensity_preserved(features in prop::collection::vec(raw_feature(), 0..60)) {
            let binned = bin_features(&features, 0.005, 5.0).unwrap();
            let before: f64 = features.iter().map(|f| f.intensity).sum();
            let after: f64 = binned.iter().map(|f| f.intensity).sum();
            prop_assert_eq!(before, after);
        }

        #[test]
        fn prop_cells_unique(features in prop::collection::vec(raw_feature(), 0..60)) {
            let binned = bin_features(&features, 0.005, 5.0).unwrap();
            for pair in binned.windows(2) {
                prop_assert!((pair[0].mz_bin, pair[0].rt_bin) < (pair[1].mz_bin, pair[1].rt_bin));
            }
        }
    }
}
