//! Fuzz target for the analysis pipeline.
//!
//! Any table with its two header rows must produce a report: bad answers
//! are normalized or skipped, never fatal.

#![no_main]

use libfuzzer_sys::fuzz_target;
use propensity::{Parser, Propensity};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    let header = b"Willing to pay more?,Agree statements,Age\n,,\n";
    let mut bytes = header.to_vec();
    bytes.extend_from_slice(data);

    if let Ok(table) = Parser::new().parse_bytes(&bytes, b',') {
        let report = Propensity::new().analyze(&table);
        assert!(report.is_ok());
    }
});
