//! Synthetic mzML fixtures shared by the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use base64::Engine;

/// 13C - 12C mass difference used to lay out isotope envelopes
pub const ISOTOPE_SPACING: f64 = 1.003_354_837_8;

/// Number of MS1 scans in the synthetic run
pub const SCAN_COUNT: usize = 15;

/// Seconds between scans
pub const SCAN_INTERVAL: f64 = 2.0;

/// An isotope envelope eluting as a Gaussian
pub struct Compound {
    pub mono_mz: f64,
    pub charge: u32,
    pub apex_scan: usize,
    pub height: f64,
    /// Relative heights of the monoisotopic peak and its isotopes
    pub isotopes: &'static [f64],
}

/// Glucose-like singly charged ion and a doubly charged peptide-like ion
pub fn default_compounds() -> Vec<Compound> {
    vec![
        Compound {
            mono_mz: 181.0707,
            charge: 1,
            apex_scan: 7,
            height: 1.0e6,
            isotopes: &[1.0, 0.3, 0.05],
        },
        Compound {
            mono_mz: 500.25,
            charge: 2,
            apex_scan: 9,
            height: 5.0e5,
            isotopes: &[1.0, 0.6, 0.2],
        },
    ]
}

fn encode_f64(values: &[f64]) -> String {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn encode_f32(values: &[f32]) -> String {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Build an mzML document with the given compounds plus an isolated noise
/// ion at m/z 300 and one MS2 scan per three MS1 scans.
pub fn synthetic_mzml(sample_id: Option<&str>, compounds: &[Compound]) -> String {
    let mut spectra = String::new();
    let mut index = 0;

    for scan in 0..SCAN_COUNT {
        let mut peaks: Vec<(f64, f64)> = vec![(300.0, 2.0e4)];
        for compound in compounds {
            let distance = scan as f64 - compound.apex_scan as f64;
            let profile = (-distance * distance / 8.0).exp();
            for (k, relative) in compound.isotopes.iter().enumerate() {
                let mz = compound.mono_mz + k as f64 * ISOTOPE_SPACING / f64::from(compound.charge);
                peaks.push((mz, compound.height * relative * profile));
            }
        }
        peaks.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mz: Vec<f64> = peaks.iter().map(|p| p.0).collect();
        let intensity: Vec<f32> = peaks.iter().map(|p| p.1 as f32).collect();

        spectra.push_str(&format!(
            r#"
      <spectrum index="{index}" id="scan={scan_number}" defaultArrayLength="{len}">
        <cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="1"/>
        <cvParam cvRef="MS" accession="MS:1000127" name="centroid spectrum"/>
        <scanList count="1">
          <scan>
            <cvParam cvRef="MS" accession="MS:1000016" name="scan start time" value="{rt}" unitCvRef="UO" unitAccession="UO:0000010" unitName="second"/>
          </scan>
        </scanList>
        <binaryDataArrayList count="2">
          <binaryDataArray>
            <cvParam cvRef="MS" accession="MS:1000523" name="64-bit float"/>
            <cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>
            <cvParam cvRef="MS" accession="MS:1000514" name="m/z array"/>
            <binary>{mz}</binary>
          </binaryDataArray>
          <binaryDataArray>
            <cvParam cvRef="MS" accession="MS:1000521" name="32-bit float"/>
            <cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>
            <cvParam cvRef="MS" accession="MS:1000515" name="intensity array"/>
            <binary>{intensity}</binary>
          </binaryDataArray>
        </binaryDataArrayList>
      </spectrum>"#,
            index = index,
            scan_number = index + 1,
            len = mz.len(),
            rt = scan as f64 * SCAN_INTERVAL,
            mz = encode_f64(&mz),
            intensity = encode_f32(&intensity),
        ));
        index += 1;

        if scan % 3 == 0 {
            spectra.push_str(&format!(
                r#"
      <spectrum index="{index}" id="scan={scan_number}" defaultArrayLength="1">
        <cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="2"/>
        <scanList count="1">
          <scan>
            <cvParam cvRef="MS" accession="MS:1000016" name="scan start time" value="{rt}" unitAccession="UO:0000010"/>
          </scan>
        </scanList>
        <binaryDataArrayList count="2">
          <binaryDataArray>
            <cvParam cvRef="MS" accession="MS:1000523" name="64-bit float"/>
            <cvParam cvRef="MS" accession="MS:1000514" name="m/z array"/>
            <binary>{mz}</binary>
          </binaryDataArray>
          <binaryDataArray>
            <cvParam cvRef="MS" accession="MS:1000523" name="64-bit float"/>
            <cvParam cvRef="MS" accession="MS:1000515" name="intensity array"/>
            <binary>{intensity}</binary>
          </binaryDataArray>
        </binaryDataArrayList>
      </spectrum>"#,
                index = index,
                scan_number = index + 1,
                rt = scan as f64 * SCAN_INTERVAL + 0.5,
                mz = encode_f64(&[181.0707]),
                intensity = encode_f64(&[9.9e9]),
            ));
            index += 1;
        }
    }

    let sample_list = sample_id
        .map(|id| {
            format!(
                r#"
  <sampleList count="1">
    <sample id="{}" name="synthetic"/>
  </sampleList>"#,
                id
            )
        })
        .unwrap_or_default();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<mzML xmlns="http://psi.hupo.org/ms/mzml" version="1.1.0">{sample_list}
  <run id="synthetic_run">
    <spectrumList count="{count}">{spectra}
    </spectrumList>
  </run>
</mzML>
"#,
        sample_list = sample_list,
        count = index,
        spectra = spectra,
    )
}

/// Write a synthetic mzML file into `dir`
pub fn write_synthetic_mzml(dir: &Path, name: &str, sample_id: Option<&str>) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, synthetic_mzml(sample_id, &default_compounds()))
        .expect("failed to write fixture");
    path
}

/// Write a parameter file into `dir`
pub fn write_params(dir: &Path) -> PathBuf {
    let path = dir.join("params.json");
    std::fs::write(
        &path,
        r#"{
  "mass_error_ppm": 5.0,
  "min_intensity": 1000.0,
  "mz_bin_size": 0.005,
  "rt_bin_size": 5.0,
  "use_gpu": false
}"#,
    )
    .expect("failed to write params");
    path
}
