/// Errors that can occur during mzML parsing
#[derive(Debug, thiserror::Error)]
pub enum MzMLError {
    /// Error parsing XML
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// Malformed attribute on an element
    #[error("XML attribute error: {0}")]
    AttributeError(#[from] quick_xml::events::attributes::AttrError),

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error decoding binary data arrays
    #[error("Binary decode error: {0}")]
    BinaryError(#[from] crate::mzml::binary::BinaryDecodeError),

    /// Invalid mzML document structure
    #[error("Invalid mzML structure: {0}")]
    InvalidStructure(String),
}
