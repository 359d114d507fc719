//! Streaming mzML parser using quick-xml
//!
//! Spectra are pulled one at a time from `<spectrumList>`, so memory use is
//! bounded by the largest single spectrum rather than the file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::Reader;

pub use error::MzMLError;
pub use iterators::SpectrumIterator;
pub use sample::{get_sample_id, read_sample_id};

mod error;
mod helpers;
mod iterators;
mod sample;
mod spectrum;


/// Default input buffer size for mzML parsing (64KB)
pub const DEFAULT_INPUT_BUFFER_SIZE: usize = 64 * 1024;

/// Streaming parser for mzML spectra
pub struct MzMLStreamer<R: BufRead> {
    reader: Reader<R>,
    in_spectrum_list: bool,
    spectrum_list_done: bool,
    spectrum_count: Option<usize>,
    current_spectrum_index: i64,
}

impl MzMLStreamer<BufReader<File>> {
    /// Open an mzML file for streaming with default buffer size (64KB)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MzMLError> {
        let file = File::open(path.as_ref())?;
        Self::new(BufReader::with_capacity(DEFAULT_INPUT_BUFFER_SIZE, file))
    }
}

impl<R: BufRead> MzMLStreamer<R> {
    /// Create a new streamer from a BufRead source
    pub fn new(reader: R) -> Result<Self, MzMLError> {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.config_mut().trim_text(true);

        Ok(Self {
            reader: xml_reader,
            in_spectrum_list: false,
            spectrum_list_done: false,
            spectrum_count: None,
            current_spectrum_index: 0,
        })
    }

    /// Spectrum count declared on `<spectrumList count="...">`, once seen
    pub fn spectrum_count(&self) -> Option<usize> {
        self.spectrum_count
    }

    /// Iterate over all spectra
    pub fn spectra(self) -> SpectrumIterator<R> {
        SpectrumIterator { streamer: self }
    }
}
