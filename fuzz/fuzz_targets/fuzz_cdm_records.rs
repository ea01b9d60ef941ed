//! Fuzz target for CDM record batch parsing.
//!
//! Tests that JSON batch parsing handles arbitrary input without
//! panicking. Batches may come from untrusted upstream data sources.

#![no_main]

use ct_common::CdmRecord;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Try to parse as JSON - should never panic, only return an error
    let _ = serde_json::from_slice::<Vec<CdmRecord>>(data);
});
