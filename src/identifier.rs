//! Decoding of instrument-escaped identifiers
//!
//! Vendor converters write characters that are not allowed in XML `ID`
//! attributes as `_xHHHH`, where `HHHH` is the UTF-16 code unit in hex
//! (`urine_x0020_sample` is `urine sample`). Only that exact form is
//! recognised; there is no percent-decoding and no recursion.

/// Escape marker preceding four hex digits
const ESCAPE_MARKER: &str = "_x";

/// Number of hex digits following the marker
const HEX_DIGITS: usize = 4;

/// Decode `_xHHHH` escape sequences in an mzML identifier.
///
/// The scan runs left to right. When the four characters after a marker are
/// hex digits the whole six-character sequence is replaced by the decoded
/// character. Otherwise the marker is kept as literal text and scanning
/// resumes right after it, so `_x_x0041` still decodes its second marker.
/// Decoded output is never re-scanned.
///
/// Code units in the surrogate range (`D800`-`DFFF`) have no `char`
/// representation and are kept as literal text like any other invalid
/// sequence.
///
/// ```
/// use mzbin::identifier::decode_mzml_id;
///
/// assert_eq!(decode_mzml_id("urine_x0020_sample"), "urine sample");
/// assert_eq!(decode_mzml_id("file_xZZZZ_end"), "file_xZZZZ_end");
/// ```
pub fn decode_mzml_id(encoded: &str) -> String {
    let mut decoded = String::with_capacity(encoded.len());
    let mut cursor = 0;

    while let Some(offset) = encoded[cursor..].find(ESCAPE_MARKER) {
        let marker = cursor + offset;
        let digits_start = marker + ESCAPE_MARKER.len();

        match decode_escape(encoded, digits_start) {
            Some(ch) => {
                decoded.push_str(&encoded[cursor..marker]);
                decoded.push(ch);
                cursor = digits_start + HEX_DIGITS;
            }
            None => {
                decoded.push_str(&encoded[cursor..digits_start]);
                cursor = digits_start;
            }
        }
    }

    decoded.push_str(&encoded[cursor..]);
    decoded
}

/// Decode the four hex digits starting at `start`, if they are all present
/// and name a valid scalar value.
fn decode_escape(encoded: &str, start: usize) -> Option<char> {
    // Hex digits are ASCII, so a byte window never splits a multi-byte char
    // when it matches.
    let digits = encoded.as_bytes().get(start..start + HEX_DIGITS)?;
    if !digits.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let digits = std::str::from_utf8(digits).ok()?;
    let code = u32::from_str_radix(digits, 16).ok()?;
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_space() {
        assert_eq!(decode_mzml_id("urine_x0020_sample"), "urine sample");
    }

    #[test]
    fn test_invalid_hex_is_literal() {
        assert_eq!(decode_mzml_id("file_xZZZZ_end"), "file_xZZZZ_end");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(decode_mzml_id(""), "");
    }

    #[test]
    fn test_mixed_case_hex() {
        assert_eq!(decode_mzml_id("a_x002Fb_x002fc"), "a/b/c");
    }

    #[test]
    fn test_truncated_sequence_at_end() {
        assert_eq!(decode_mzml_id("sample_x00"), "sample_x00");
        assert_eq!(decode_mzml_id("sample_x"), "sample_x");
    }

    #[test]
    fn test_adjacent_markers_are_rescanned() {
        // First marker is followed by "_x00", which is not four hex digits
        assert_eq!(decode_mzml_id("_x_x0041"), "_xA");
    }

    #[test]
    fn test_consecutive_escapes() {
        assert_eq!(decode_mzml_id("_x0041_x0042_x0043"), "ABC");
    }

    #[test]
    fn test_decoded_output_not_rescanned() {
        // _x005F decodes to '_', which must not combine with the following "x0041"
        assert_eq!(decode_mzml_id("_x005Fx0041"), "_x0041");
    }

    #[test]
    fn test_surrogate_is_literal() {
        assert_eq!(decode_mzml_id("a_xD800b"), "a_xD800b");
    }

    #[test]
    fn test_non_ascii_text_preserved() {
        assert_eq!(decode_mzml_id("Probe_x0020_\u{e9}chantillon_x"), "Probe \u{e9}chantillon_x");
        assert_eq!(decode_mzml_id("_x\u{e9}\u{e9}\u{e9}\u{e9}"), "_x\u{e9}\u{e9}\u{e9}\u{e9}");
    }

    proptest! {
        /// Strings without an `_x` marker pass through untouched
        #[test]
        fn test_literal_strings_unchanged(s in "[a-zA-Z0-9 .-]{0,64}") {
            prop_assert_eq!(decode_mzml_id(&s), s);
        }

        /// Markers that are never followed by four hex digits stay literal
        #[test]
        fn test_marker_without_hex_unchanged(prefix in "[a-z]{0,8}", suffix in "[g-z]{0,8}") {
            let s = format!("{}_x{}", prefix, suffix);
            prop_assert_eq!(decode_mzml_id(&s), s);
        }
    }
}
