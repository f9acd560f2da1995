//! Fuzz target for sidecar line parsing
//!
//! The parser should never panic, only return Ok or Err.

#![no_main]

use libfuzzer_sys::fuzz_target;
use r2index_checksum::sidecar::{parse_sidecar_line, sidecar_line};

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(entry) = parse_sidecar_line(line) {
        assert_eq!(entry.digest.len(), entry.algorithm.hex_len());
        assert!(!entry.filename.is_empty());

        // Re-rendering a parsed entry must parse to the same entry.
        let again = parse_sidecar_line(&sidecar_line(&entry.digest, &entry.filename))
            .expect("rendered sidecar line should parse");
        assert_eq!(again, entry);
    }
});
