//! Fuzz target for YAML configuration parsing.
//!
//! Tests that config parsing plus semantic validation handles arbitrary
//! input without panicking.

#![no_main]

use ct_config::{validate, Config};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(config) = Config::from_yaml(text) {
            // Validation must reject, never panic, on hostile values.
            let _ = validate(&config);
        }
    }
});
