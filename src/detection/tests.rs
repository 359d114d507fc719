use super::*;
use crate::experiment::ScanSpectrum;

fn params() -> DetectionParams {
    DetectionParams {
        mass_error_ppm: 5.0,
        min_intensity: 0.0,
        use_gpu: false,
    }
}

/// Gaussian-ish elution profile of a singly charged ion with two isotopes
fn synthetic_experiment() -> Experiment {
    let profile = [0.05, 0.2, 0.6, 1.0, 0.6, 0.2, 0.05];
    let mono = 250.1234;
    let spectra = profile
        .iter()
        .enumerate()
        .map(|(i, &scale)| {
            ScanSpectrum::new(
                format!("scan={}", i + 1),
                60.0 + 2.0 * i as f64,
                vec![
                    mono,
                    mono + feature_finder::C13_MASS_DIFFERENCE,
                    mono + 2.0 * feature_finder::C13_MASS_DIFFERENCE,
                ],
                vec![1.0e5 * scale, 2.5e4 * scale, 4.0e3 * scale],
            )
        })
        .collect();
    Experiment::from_spectra(spectra)
}

#[test]
fn test_metabo_detector_finds_envelope() {
    let detector = MetaboDetector::new();
    let output = detector.detect(&synthetic_experiment(), &params()).unwrap();

    assert_eq!(output.features.len(), 1);
    assert_eq!(output.traces.len(), 1);
    let feature = output.features[0];
    assert_eq!(feature.charge, 1);
    assert!((feature.mz - 250.1234).abs() < 1e-6);
    assert_eq!(feature.rt, 66.0);
}

#[test]
fn test_metabo_detector_empty_experiment() {
    let output = MetaboDetector::new()
        .detect(&Experiment::default(), &params())
        .unwrap();
    assert!(output.features.is_empty());
}

#[test]
fn test_metabo_detector_rejects_unsorted() {
    let experiment = Experiment::from_spectra(vec![
        ScanSpectrum::new("b", 2.0, vec![], vec![]),
        ScanSpectrum::new("a", 1.0, vec![], vec![]),
    ]);
    let err = MetaboDetector::new().detect(&experiment, &params()).unwrap_err();
    assert!(matches!(err, DetectionError::InvalidExperiment(_)));
}

#[test]
fn test_metabo_detector_rejects_bad_tolerance() {
    let bad = DetectionParams {
        mass_error_ppm: 0.0,
        ..params()
    };
    let err = MetaboDetector::new()
        .detect(&synthetic_experiment(), &bad)
        .unwrap_err();
    assert!(matches!(err, DetectionError::InvalidParameter(_)));
}

#[test]
fn test_closure_detector() {
    let detector = |_: &Experiment, p: &DetectionParams| -> Result<DetectionOutput, DetectionError> {
        Ok(DetectionOutput {
            features: vec![RawFeature::new(100.0, 10.0, p.min_intensity, 1)],
            traces: vec![FeatureTrace::default()],
        })
    };
    let output = detector.detect(&Experiment::default(), &params()).unwrap();
    assert_eq!(output.features.len(), 1);
}
