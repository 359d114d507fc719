use quick_xml::encoding::Decoder;
use quick_xml::events::BytesStart;

use super::MzMLError;
use crate::mzml::cv_params::CvParam;

/// Read an attribute value, unescaping XML entities
pub(super) fn get_attribute(
    element: &BytesStart,
    name: &str,
    decoder: Decoder,
) -> Result<Option<String>, MzMLError> {
    match element.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.decode_and_unescape_value(decoder)?.into_owned())),
        None => Ok(None),
    }
}

/// Build a [`CvParam`] from a `<cvParam>` element
pub(super) fn parse_cv_param(element: &BytesStart, decoder: Decoder) -> Result<CvParam, MzMLError> {
    Ok(CvParam {
        accession: get_attribute(element, "accession", decoder)?.unwrap_or_default(),
        name: get_attribute(element, "name", decoder)?.unwrap_or_default(),
        value: get_attribute(element, "value", decoder)?.filter(|v| !v.is_empty()),
        unit_accession: get_attribute(element, "unitAccession", decoder)?,
    })
}
