#![no_main]

//! Fuzz target for record parsing.
//!
//! Feeds arbitrary bytes through line classification, decoding, and
//! validation. None of these may panic, and any record that validates
//! must re-encode to something that validates again.

use libfuzzer_sys::fuzz_target;
use txrelay_core::ValidatedRecord;
use txrelay_ingest::{classify_line, Line};

fuzz_target!(|data: &[u8]| {
    fuzz_record_parsing(data);

    for raw in data.split_inclusive(|&b| b == b'\n') {
        if let Line::Candidate(candidate) = classify_line(raw) {
            fuzz_record_parsing(candidate);
        }
    }
});

fn fuzz_record_parsing(data: &[u8]) {
    let Ok(record) = ValidatedRecord::parse(data) else {
        return;
    };

    let encoded = match record.to_canonical_json() {
        Ok(encoded) => encoded,
        Err(e) => panic!("validated record failed to encode: {e}"),
    };

    match ValidatedRecord::parse(&encoded) {
        Ok(reparsed) => assert_eq!(reparsed.record(), record.record()),
        Err(e) => panic!("canonical encoding did not validate: {e}"),
    }
}
