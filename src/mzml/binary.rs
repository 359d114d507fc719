//! Binary data array decoding for mzML
//!
//! A `<binary>` element holds Base64 text of little-endian floats, optionally
//! zlib-compressed. The array's `cvParam`s say which precision and compression
//! apply and whether it carries m/z or intensity values.

use std::io::Read;

use base64::prelude::*;
use byteorder::{ByteOrder, LittleEndian};
use flate2::read::ZlibDecoder;

use super::cv_params::{CvParam, MS_CV_ACCESSIONS};

/// MS-Numpress accessions; recognised only to report them as unsupported
const NUMPRESS_ACCESSIONS: [&str; 3] = ["MS:1002312", "MS:1002313", "MS:1002314"];

/// Compression applied to a binary array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionType {
    /// Raw bytes
    #[default]
    None,
    /// zlib stream
    Zlib,
}

/// Numerical precision of a binary array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinaryEncoding {
    /// 32-bit floating point (MS:1000521)
    Float32,
    /// 64-bit floating point (MS:1000523)
    #[default]
    Float64,
}

impl BinaryEncoding {
    /// Bytes per encoded value
    pub fn byte_size(&self) -> usize {
        match self {
            BinaryEncoding::Float32 => 4,
            BinaryEncoding::Float64 => 8,
        }
    }
}

/// What a binary array holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    /// m/z values
    Mz,
    /// Intensity values
    Intensity,
}

/// Encoding description collected from a `<binaryDataArray>`'s CV params
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayDescriptor {
    /// Float precision
    pub encoding: BinaryEncoding,
    /// Compression scheme
    pub compression: CompressionType,
    /// Array role, `None` for arrays the pipeline ignores
    pub kind: Option<ArrayKind>,
}

impl ArrayDescriptor {
    /// Build a descriptor from the CV params of one binary data array
    pub fn from_cv_params(cv_params: &[CvParam]) -> Result<Self, BinaryDecodeError> {
        let mut descriptor = ArrayDescriptor::default();
        for cv in cv_params {
            match cv.accession.as_str() {
                MS_CV_ACCESSIONS::FLOAT_32_BIT => descriptor.encoding = BinaryEncoding::Float32,
                MS_CV_ACCESSIONS::FLOAT_64_BIT => descriptor.encoding = BinaryEncoding::Float64,
                MS_CV_ACCESSIONS::ZLIB_COMPRESSION => descriptor.compression = CompressionType::Zlib,
                MS_CV_ACCESSIONS::NO_COMPRESSION => descriptor.compression = CompressionType::None,
                MS_CV_ACCESSIONS::MZ_ARRAY => descriptor.kind = Some(ArrayKind::Mz),
                MS_CV_ACCESSIONS::INTENSITY_ARRAY => descriptor.kind = Some(ArrayKind::Intensity),
                accession if NUMPRESS_ACCESSIONS.contains(&accession) => {
                    return Err(BinaryDecodeError::UnsupportedCompression(cv.name.clone()));
                }
                _ => {}
            }
        }
        Ok(descriptor)
    }
}

/// Errors that can occur during binary decoding
#[derive(Debug, thiserror::Error)]
pub enum BinaryDecodeError {
    /// Payload is not valid Base64
    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    /// zlib stream could not be inflated
    #[error("Decompression error: {0}")]
    DecompressionError(#[from] std::io::Error),

    /// Decoded byte count does not match the declared array length
    #[error("Invalid data length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected count
        expected: usize,
        /// Actual count
        actual: usize,
    },

    /// Compression scheme the decoder does not implement
    #[error("Unsupported compression: {0}")]
    UnsupportedCompression(String),
}

/// Decoder for mzML binary data arrays
pub struct BinaryDecoder;

impl BinaryDecoder {
    /// Decode Base64 text into `f64` values.
    ///
    /// Whitespace inside the payload (line-wrapped Base64) is ignored. When
    /// `expected_length` is given, the decoded value count must match it.
    pub fn decode(
        base64_data: &str,
        descriptor: &ArrayDescriptor,
        expected_length: Option<usize>,
    ) -> Result<Vec<f64>, BinaryDecodeError> {
        let compact: String = base64_data.split_ascii_whitespace().collect();
        if compact.is_empty() {
            return Ok(Vec::new());
        }

        let raw = BASE64_STANDARD.decode(compact.as_bytes())?;
        let bytes = match descriptor.compression {
            CompressionType::None => raw,
            CompressionType::Zlib => {
                let mut inflated = Vec::with_capacity(raw.len() * 4);
                ZlibDecoder::new(raw.as_slice()).read_to_end(&mut inflated)?;
                inflated
            }
        };

        let values = Self::bytes_to_floats(&bytes, descriptor.encoding)?;

        match expected_length {
            Some(expected) if values.len() != expected => Err(BinaryDecodeError::InvalidLength {
                expected,
                actual: values.len(),
            }),
            _ => Ok(values),
        }
    }

    fn bytes_to_floats(bytes: &[u8], encoding: BinaryEncoding) -> Result<Vec<f64>, BinaryDecodeError> {
        let width = encoding.byte_size();
        if bytes.len() % width != 0 {
            return Err(BinaryDecodeError::InvalidLength {
                expected: bytes.len() / width * width,
                actual: bytes.len(),
            });
        }

        let values = match encoding {
            BinaryEncoding::Float32 => bytes
                .chunks_exact(width)
                .map(|chunk| f64::from(LittleEndian::read_f32(chunk)))
                .collect(),
            BinaryEncoding::Float64 => bytes.chunks_exact(width).map(LittleEndian::read_f64).collect(),
        };
        Ok(values)
    }
}
