//! Elution peak splitting and width filtering
//!
//! A mass trace may cover several chromatographic peaks of the same m/z
//! (isomers, in-source fragments). Traces are smoothed with a centred moving
//! average and cut at every valley that drops below `valley_ratio` times the
//! lower of the two neighbouring maxima.

use log::debug;

use super::mass_trace::MassTrace;

/// Peak width filtering mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidthFiltering {
    /// Keep every peak
    Off,
    /// Keep peaks whose FWHM lies between the 5th and 95th percentile of all
    /// peaks in the run
    Auto,
    /// Keep peaks whose FWHM (seconds) lies in a fixed range
    Fixed {
        /// Narrowest accepted FWHM
        min_fwhm: f64,
        /// Widest accepted FWHM
        max_fwhm: f64,
    },
}

/// Elution peak settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElutionConfig {
    /// Moving average window in scans (1 disables smoothing)
    pub smoothing_window: usize,
    /// Valley depth, relative to the lower neighbouring maximum, needed to split
    pub valley_ratio: f64,
    /// Minimum number of points in a split peak
    pub min_scans: usize,
    /// Width filtering mode
    pub width_filtering: WidthFiltering,
}

impl Default for ElutionConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 3,
            valley_ratio: 0.5,
            min_scans: 3,
            width_filtering: WidthFiltering::Auto,
        }
    }
}

/// Below this many peaks the automatic width filter keeps everything
const MIN_PEAKS_FOR_AUTO_WIDTH: usize = 20;

/// Split traces into single elution peaks and apply width filtering
pub fn split_elution_peaks(traces: Vec<MassTrace>, config: &ElutionConfig) -> Vec<MassTrace> {
    let mut peaks = Vec::with_capacity(traces.len());
    for trace in traces {
        let smoothed = smooth(&trace.intensity, config.smoothing_window);
        let mut start = 0;
        for cut in split_points(&smoothed, config.valley_ratio) {
            push_segment(&mut peaks, &trace, start..cut + 1, config.min_scans);
            start = cut + 1;
        }
        push_segment(&mut peaks, &trace, start..trace.len(), config.min_scans);
    }

    match config.width_filtering {
        WidthFiltering::Off => peaks,
        WidthFiltering::Fixed { min_fwhm, max_fwhm } => filter_width(peaks, min_fwhm, max_fwhm),
        WidthFiltering::Auto => {
            if peaks.len() < MIN_PEAKS_FOR_AUTO_WIDTH {
                return peaks;
            }
            let mut widths: Vec<f64> = peaks.iter().map(MassTrace::fwhm).collect();
            widths.sort_by(f64::total_cmp);
            let min_fwhm = percentile(&widths, 0.05);
            let max_fwhm = percentile(&widths, 0.95);
            debug!("Automatic FWHM window: {:.3}s to {:.3}s", min_fwhm, max_fwhm);
            filter_width(peaks, min_fwhm, max_fwhm)
        }
    }
}

fn push_segment(
    peaks: &mut Vec<MassTrace>,
    trace: &MassTrace,
    range: std::ops::Range<usize>,
    min_scans: usize,
) {
    if range.len() >= min_scans.max(1) {
        peaks.push(trace.slice(range));
    }
}

fn filter_width(peaks: Vec<MassTrace>, min_fwhm: f64, max_fwhm: f64) -> Vec<MassTrace> {
    let before = peaks.len();
    let kept: Vec<MassTrace> = peaks
        .into_iter()
        .filter(|peak| {
            let fwhm = peak.fwhm();
            fwhm >= min_fwhm && fwhm <= max_fwhm
        })
        .collect();
    debug!("Width filter removed {} of {} peaks", before - kept.len(), before);
    kept
}

/// Nearest-rank percentile of sorted values
fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    let rank = (fraction * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Centred moving average; the window shrinks at the edges
fn smooth(values: &[f64], window: usize) -> Vec<f64> {
    let half = window / 2;
    if half == 0 {
        return values.to_vec();
    }
    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(values.len());
            values[lo..hi].iter().sum::<f64>() / (hi - lo) as f64
        })
        .collect()
}

/// Indices of the valley points where a trace is cut. A valley point stays
/// with the peak to its left.
fn split_points(smoothed: &[f64], valley_ratio: f64) -> Vec<usize> {
    let maxima: Vec<usize> = (0..smoothed.len())
        .filter(|&i| {
            let rising = i == 0 || smoothed[i] > smoothed[i - 1];
            let not_falling = i + 1 == smoothed.len() || smoothed[i] >= smoothed[i + 1];
            rising && not_falling
        })
        .collect();

    let mut cuts = Vec::new();
    // The running left maximum carries over valleys too shallow to cut
    let mut left = match maxima.first() {
        Some(&first) => first,
        None => return cuts,
    };
    for &right in &maxima[1..] {
        let (valley, depth) = (left..=right)
            .map(|i| (i, smoothed[i]))
            .fold((left, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best });
        if depth < valley_ratio * smoothed[left].min(smoothed[right]) {
            cuts.push(valley);
            left = right;
        } else if smoothed[right] > smoothed[left] {
            left = right;
        }
    }
    cuts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(intensity: &[f64]) -> MassTrace {
        MassTrace {
            rt: (0..intensity.len()).map(|i| i as f64).collect(),
            mz: vec![150.0; intensity.len()],
            intensity: intensity.to_vec(),
        }
    }

    fn config() -> ElutionConfig {
        ElutionConfig {
            smoothing_window: 1,
            width_filtering: WidthFiltering::Off,
            ..ElutionConfig::default()
        }
    }

    #[test]
    fn test_single_peak_kept_whole() {
        let peaks = split_elution_peaks(vec![trace(&[1.0, 5.0, 10.0, 5.0, 1.0])], &config());
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].len(), 5);
    }

    #[test]
    fn test_deep_valley_splits() {
        let t = trace(&[1.0, 10.0, 20.0, 10.0, 1.0, 12.0, 30.0, 12.0, 2.0]);
        let peaks = split_elution_peaks(vec![t], &config());
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0].rt, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(peaks[1].rt, vec![5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_shallow_valley_kept() {
        let t = trace(&[1.0, 20.0, 15.0, 22.0, 1.0]);
        let peaks = split_elution_peaks(vec![t], &config());
        assert_eq!(peaks.len(), 1);
    }

    #[test]
    fn test_short_segments_dropped() {
        let t = trace(&[20.0, 1.0, 5.0, 10.0, 20.0, 10.0]);
        let peaks = split_elution_peaks(vec![t], &config());
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].rt, vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_fixed_width_filter() {
        let narrow = trace(&[1.0, 10.0, 1.0]);
        let wide = trace(&[5.0, 8.0, 10.0, 8.0, 5.0]);
        let config = ElutionConfig {
            width_filtering: WidthFiltering::Fixed {
                min_fwhm: 1.0,
                max_fwhm: 10.0,
            },
            ..config()
        };
        let peaks = split_elution_peaks(vec![narrow, wide], &config);
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].fwhm(), 4.0);
    }

    #[test]
    fn test_auto_width_needs_enough_peaks() {
        let config = ElutionConfig {
            width_filtering: WidthFiltering::Auto,
            ..config()
        };
        let peaks = split_elution_peaks(vec![trace(&[1.0, 10.0, 1.0])], &config);
        assert_eq!(peaks.len(), 1);
    }

    #[test]
    fn test_smooth() {
        assert_eq!(smooth(&[3.0, 6.0, 9.0], 3), vec![4.5, 6.0, 7.5]);
        assert_eq!(smooth(&[3.0, 6.0], 1), vec![3.0, 6.0]);
    }

    #[test]
    fn test_percentile() {
        let values: Vec<f64> = (1..=20).map(f64::from).collect();
        assert_eq!(percentile(&values, 0.05), 1.0);
        assert_eq!(percentile(&values, 0.95), 19.0);
    }
}
