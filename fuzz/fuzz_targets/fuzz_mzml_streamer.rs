#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Must never panic, whatever the input
    if let Ok(streamer) = mzbin::mzml::MzMLStreamer::new(Cursor::new(data)) {
        for spectrum in streamer.spectra().take(100) {
            if spectrum.is_err() {
                break;
            }
        }
    }

    let _ = mzbin::experiment::Experiment::from_reader(Cursor::new(data));
});
