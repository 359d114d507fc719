use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};

use super::helpers::{get_attribute, parse_cv_param};
use super::{MzMLError, MzMLStreamer};
use crate::mzml::binary::{ArrayDescriptor, ArrayKind, BinaryDecoder};
use crate::mzml::cv_params::{normalize_retention_time, CvParam, MS_CV_ACCESSIONS};
use crate::mzml::models::MzMLSpectrum;

/// Where inside a `<spectrum>` the parser currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Spectrum,
    Scan,
    Precursor,
    BinaryArray,
}

/// Context for parsing binary data arrays
#[derive(Debug, Default)]
struct BinaryArrayContext {
    cv_params: Vec<CvParam>,
    array_length: Option<usize>,
    base64_data: String,
    in_binary: bool,
}

impl<R: BufRead> MzMLStreamer<R> {
    /// Read the next spectrum from the stream
    pub fn next_spectrum(&mut self) -> Result<Option<MzMLSpectrum>, MzMLError> {
        if self.spectrum_list_done {
            return Ok(None);
        }
        if !self.in_spectrum_list {
            self.seek_spectrum_list()?;
            if !self.in_spectrum_list {
                return Ok(None);
            }
        }

        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(ref e) if e.local_name().as_ref() == b"spectrum" => {
                    let spectrum = self.parse_spectrum(e, false)?;
                    self.current_spectrum_index += 1;
                    return Ok(Some(spectrum));
                }
                Event::Empty(ref e) if e.local_name().as_ref() == b"spectrum" => {
                    let spectrum = self.parse_spectrum(e, true)?;
                    self.current_spectrum_index += 1;
                    return Ok(Some(spectrum));
                }
                Event::End(ref e) if e.local_name().as_ref() == b"spectrumList" => {
                    self.in_spectrum_list = false;
                    self.spectrum_list_done = true;
                    return Ok(None);
                }
                Event::Eof => {
                    return Err(MzMLError::InvalidStructure(
                        "Unexpected EOF in spectrumList".to_string(),
                    ));
                }
                _ => {}
            }
            buf.clear();
        }
    }

    /// Skip ahead to the opening `<spectrumList>` tag
    fn seek_spectrum_list(&mut self) -> Result<(), MzMLError> {
        let decoder = self.reader.decoder();
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(ref e) if e.local_name().as_ref() == b"spectrumList" => {
                    self.spectrum_count =
                        get_attribute(e, "count", decoder)?.and_then(|c| c.parse().ok());
                    self.in_spectrum_list = true;
                    return Ok(());
                }
                Event::Empty(ref e) if e.local_name().as_ref() == b"spectrumList" => {
                    self.spectrum_count = Some(0);
                    self.spectrum_list_done = true;
                    return Ok(());
                }
                Event::Eof => {
                    self.spectrum_list_done = true;
                    return Ok(());
                }
                _ => {}
            }
            buf.clear();
        }
    }

    /// Parse a single spectrum element
    fn parse_spectrum(
        &mut self,
        start_event: &BytesStart,
        self_closing: bool,
    ) -> Result<MzMLSpectrum, MzMLError> {
        let decoder = self.reader.decoder();
        let mut spectrum = MzMLSpectrum {
            ms_level: 1,
            ..Default::default()
        };

        spectrum.index = get_attribute(start_event, "index", decoder)?
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.current_spectrum_index);
        spectrum.id = get_attribute(start_event, "id", decoder)?.unwrap_or_default();
        spectrum.default_array_length = get_attribute(start_event, "defaultArrayLength", decoder)?
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        if self_closing {
            return Ok(spectrum);
        }

        let mut section = Section::Spectrum;
        let mut current_array: Option<BinaryArrayContext> = None;
        let mut buf = Vec::new();

        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => match e.local_name().as_ref() {
                    b"cvParam" => {
                        let cv = parse_cv_param(e, decoder)?;
                        Self::route_cv_param(&mut spectrum, current_array.as_mut(), section, cv);
                    }
                    b"scan" => section = Section::Scan,
                    b"precursorList" | b"productList" => section = Section::Precursor,
                    b"binaryDataArray" => {
                        section = Section::BinaryArray;
                        current_array = Some(BinaryArrayContext {
                            array_length: get_attribute(e, "arrayLength", decoder)?
                                .and_then(|s| s.parse().ok()),
                            ..Default::default()
                        });
                    }
                    b"binary" => {
                        if let Some(ctx) = current_array.as_mut() {
                            ctx.in_binary = true;
                        }
                    }
                    _ => {}
                },
                Event::Empty(ref e) => {
                    if e.local_name().as_ref() == b"cvParam" {
                        let cv = parse_cv_param(e, decoder)?;
                        Self::route_cv_param(&mut spectrum, current_array.as_mut(), section, cv);
                    }
                }
                Event::Text(ref t) => {
                    if let Some(ctx) = current_array.as_mut().filter(|ctx| ctx.in_binary) {
                        ctx.base64_data.push_str(&t.unescape()?);
                    }
                }
                Event::End(ref e) => match e.local_name().as_ref() {
                    b"spectrum" => break,
                    b"scan" | b"precursorList" | b"productList" => section = Section::Spectrum,
                    b"binary" => {
                        if let Some(ctx) = current_array.as_mut() {
                            ctx.in_binary = false;
                        }
                    }
                    b"binaryDataArray" => {
                        section = Section::Spectrum;
                        if let Some(ctx) = current_array.take() {
                            Self::decode_binary_array(&mut spectrum, ctx)?;
                        }
                    }
                    _ => {}
                },
                Event::Eof => {
                    return Err(MzMLError::InvalidStructure(format!(
                        "Unexpected EOF in spectrum {}",
                        spectrum.id
                    )));
                }
                _ => {}
            }
            buf.clear();
        }

        if spectrum.mz_array.len() != spectrum.intensity_array.len() {
            return Err(MzMLError::InvalidStructure(format!(
                "Spectrum {} has {} m/z values but {} intensities",
                spectrum.id,
                spectrum.mz_array.len(),
                spectrum.intensity_array.len()
            )));
        }

        Ok(spectrum)
    }

    /// Send a CV param to the binary array, scan or spectrum it belongs to
    fn route_cv_param(
        spectrum: &mut MzMLSpectrum,
        current_array: Option<&mut BinaryArrayContext>,
        section: Section,
        cv: CvParam,
    ) {
        match section {
            Section::BinaryArray => {
                if let Some(ctx) = current_array {
                    ctx.cv_params.push(cv);
                }
            }
            Section::Scan => Self::apply_scan_cv_param(spectrum, &cv),
            Section::Spectrum => Self::apply_spectrum_cv_param(spectrum, &cv),
            Section::Precursor => {}
        }
    }

    /// Apply CV param to spectrum properties
    fn apply_spectrum_cv_param(spectrum: &mut MzMLSpectrum, cv: &CvParam) {
        match cv.accession.as_str() {
            MS_CV_ACCESSIONS::MS_LEVEL => {
                spectrum.ms_level = cv.value_as_i64().unwrap_or(1) as i16;
            }
            MS_CV_ACCESSIONS::CENTROID_SPECTRUM => spectrum.centroided = Some(true),
            MS_CV_ACCESSIONS::PROFILE_SPECTRUM => spectrum.centroided = Some(false),
            _ => {}
        }
    }

    /// Apply CV param to scan properties
    fn apply_scan_cv_param(spectrum: &mut MzMLSpectrum, cv: &CvParam) {
        match cv.accession.as_str() {
            MS_CV_ACCESSIONS::SCAN_START_TIME => {
                if let Some(val) = cv.value_as_f64() {
                    spectrum.retention_time =
                        Some(normalize_retention_time(val, cv.unit_accession.as_deref()));
                }
            }
            _ => Self::apply_spectrum_cv_param(spectrum, cv),
        }
    }

    /// Decode binary array and add to spectrum
    fn decode_binary_array(
        spectrum: &mut MzMLSpectrum,
        ctx: BinaryArrayContext,
    ) -> Result<(), MzMLError> {
        let descriptor = ArrayDescriptor::from_cv_params(&ctx.cv_params)?;
        let Some(kind) = descriptor.kind else {
            return Ok(());
        };

        let expected = ctx.array_length.unwrap_or(spectrum.default_array_length);
        let values = BinaryDecoder::decode(&ctx.base64_data, &descriptor, Some(expected))?;

        match kind {
            ArrayKind::Mz => spectrum.mz_array = values,
            ArrayKind::Intensity => spectrum.intensity_array = values,
        }
        Ok(())
    }
}
