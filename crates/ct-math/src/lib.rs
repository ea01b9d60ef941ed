//! Conjunction Triage math utilities.

pub mod math;

pub use math::activation::*;
pub use math::linalg::*;
pub use math::masked::*;
pub use math::transform::*;
