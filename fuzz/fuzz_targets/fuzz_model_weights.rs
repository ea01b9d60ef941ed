//! Fuzz target for model weights parsing and shape validation.
//!
//! A malformed weights file must fail validation cleanly rather than panic
//! or reach the forward pass.

#![no_main]

use ct_core::forecast::SkipLstmWeights;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(weights) = serde_json::from_slice::<SkipLstmWeights>(data) {
        let _ = weights.validate();
    }
});
