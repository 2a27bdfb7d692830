//! Fuzz target for the survey parser.
//!
//! The parser must never panic on malformed input, whatever the delimiter.

#![no_main]

use libfuzzer_sys::fuzz_target;
use propensity::Parser;
use std::io::Write;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    if let Ok(mut temp_file) = tempfile::NamedTempFile::new() {
        if temp_file.write_all(data).is_ok() {
            let _ = Parser::new().parse_file(temp_file.path());
        }
    }
});
