//! Conjunction Triage Core Library
//!
//! This library turns a noisy stream of Conjunction Data Messages into one
//! temporal risk narrative per predicted encounter:
//! - Event grouping of raw CDM snapshots
//! - Time-aware feature sequence construction
//! - Collision probability forecasting with a masked skip-LSTM
//! - Monte Carlo dropout certainty estimation
//! - Risk interpretation (status, trend, hours-to-decision)
//!
//! The binary entry point is in `main.rs`.

pub mod assess;
pub mod events;
pub mod exit_codes;
pub mod forecast;
pub mod grouping;
pub mod logging;
pub mod pipeline;
pub mod sequence;
