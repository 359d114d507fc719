//! Sample identifier lookup in mzML metadata
//!
//! The `<sample id="...">` attribute carries the instrument's sample name in
//! `_xHHHH`-escaped form. The first `<sample>` in the root element's
//! namespace wins; failing that, the first un-namespaced `<sample>`. The whole
//! document is read so that a malformed file is rejected even when the sample
//! element itself parsed cleanly.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use super::helpers::get_attribute;
use super::{MzMLError, DEFAULT_INPUT_BUFFER_SIZE};
use crate::identifier::decode_mzml_id;

/// Extract and decode the sample id of an mzML file.
///
/// Read and parse failures are logged with the file path and reported as
/// `None`; callers fall back to an identifier derived from the file name.
pub fn get_sample_id<P: AsRef<Path>>(path: P) -> Option<String> {
    let path = path.as_ref();
    let result = File::open(path)
        .map_err(MzMLError::from)
        .and_then(|file| read_sample_id(BufReader::with_capacity(DEFAULT_INPUT_BUFFER_SIZE, file)));

    match result {
        Ok(Some(sample_id)) => {
            debug!("Sample id for {}: {}", path.display(), sample_id);
            Some(sample_id)
        }
        Ok(None) => {
            debug!("No sample id in {}", path.display());
            None
        }
        Err(e) => {
            warn!("Error parsing {}: {}", path.display(), e);
            None
        }
    }
}

/// Parse a whole mzML document and return its decoded sample id.
///
/// Returns `Ok(None)` when no matching `<sample>` exists or the first match
/// has no `id` attribute.
pub fn read_sample_id<R: BufRead>(reader: R) -> Result<Option<String>, MzMLError> {
    let mut reader = NsReader::from_reader(reader);
    reader.config_mut().trim_text(true);
    let decoder = reader.decoder();

    let mut root_namespace: Option<Vec<u8>> = None;
    let mut depth: usize = 0;
    // Outer Option: element found; inner Option: it carried an id
    let mut in_root_namespace: Option<Option<String>> = None;
    let mut without_namespace: Option<Option<String>> = None;
    let mut buf = Vec::new();

    loop {
        let (namespace, event) = reader.read_resolved_event_into(&mut buf)?;
        let namespace = element_namespace(namespace)?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if depth == 0 {
                    if root_namespace.is_some() {
                        return Err(MzMLError::InvalidStructure(
                            "Multiple root elements".to_string(),
                        ));
                    }
                    root_namespace = Some(namespace.clone());
                }

                if e.local_name().as_ref() == b"sample" {
                    let root_ns = root_namespace.as_deref().unwrap_or_default();
                    if !root_ns.is_empty() && namespace == root_ns && in_root_namespace.is_none() {
                        in_root_namespace = Some(sample_id_attribute(e, decoder)?);
                    } else if namespace.is_empty() && without_namespace.is_none() {
                        without_namespace = Some(sample_id_attribute(e, decoder)?);
                    }
                }

                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Text(_) | Event::CData(_) if depth == 0 => {
                return Err(MzMLError::InvalidStructure(
                    "Text content outside the root element".to_string(),
                ));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if root_namespace.is_none() {
        return Err(MzMLError::InvalidStructure("No root element".to_string()));
    }
    if depth != 0 {
        return Err(MzMLError::InvalidStructure(format!(
            "Document ended with {} unclosed element(s)",
            depth
        )));
    }

    let encoded = match in_root_namespace {
        Some(found) => found,
        None => without_namespace.flatten(),
    };
    Ok(encoded.map(|id| decode_mzml_id(&id)))
}

/// Namespace URI of an element, empty when it has none
fn element_namespace(resolved: ResolveResult) -> Result<Vec<u8>, MzMLError> {
    match resolved {
        ResolveResult::Bound(Namespace(uri)) => Ok(uri.to_vec()),
        ResolveResult::Unbound => Ok(Vec::new()),
        ResolveResult::Unknown(prefix) => Err(MzMLError::InvalidStructure(format!(
            "Unbound namespace prefix: {}",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn sample_id_attribute(
    element: &BytesStart,
    decoder: quick_xml::encoding::Decoder,
) -> Result<Option<String>, MzMLError> {
    get_attribute(element, "id", decoder)
}
