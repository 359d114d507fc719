#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: &str| {
    let decoded = mzbin::identifier::decode_mzml_id(input);
    // Decoding only ever shortens escapes
    assert!(decoded.chars().count() <= input.chars().count());
});
