//! # mzML Reading
//!
//! Streaming access to the parts of an mzML document the feature pipeline
//! needs: the `<sample>` identifier and the spectra of the run.
//!
//! ```text
//! indexedmzML (optional wrapper)
//! └── mzML
//!     ├── sampleList
//!     │   └── sample @id          (escaped sample identifier)
//!     └── run
//!         └── spectrumList
//!             └── spectrum*
//!                 ├── cvParam*    (ms level, centroid/profile)
//!                 ├── scanList/scan/cvParam (scan start time)
//!                 └── binaryDataArrayList
//!                     └── binaryDataArray* (m/z, intensity)
//! ```

mod binary;
mod cv_params;
mod models;
pub mod streamer;

pub use binary::{ArrayDescriptor, ArrayKind, BinaryDecodeError, BinaryDecoder, BinaryEncoding, CompressionType};
pub use cv_params::{normalize_retention_time, CvParam, MS_CV_ACCESSIONS};
pub use models::MzMLSpectrum;
pub use streamer::{get_sample_id, read_sample_id, MzMLError, MzMLStreamer, SpectrumIterator};
