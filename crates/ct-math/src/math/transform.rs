//! Feature transforms with exact inverses.
//!
//! Collision probabilities span many decades (1e-30 to 1e-2), so models are
//! normally trained on log10 probability. Whichever transform a model was
//! trained with must be applied identically at inference; the inverse maps
//! the model output back to a raw probability before exposure.

use serde::{Deserialize, Serialize};

/// Floor applied before log-scaling a probability. Matches the training
/// preprocessor; a zero Pc maps to log10 = -30 rather than -inf.
pub const PC_LOG_FLOOR: f64 = 1e-30;

/// Floor in meters applied before log-scaling a miss distance.
pub const DISTANCE_LOG_FLOOR_M: f64 = 1e-3;

/// Probability scale a model consumes and emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbabilityTransform {
    /// log10(max(p, 1e-30)); the default for trained weights.
    #[default]
    Log10,
    /// Raw probability in [0, 1].
    Raw,
}

impl ProbabilityTransform {
    /// Map a raw probability into the model's scale.
    pub fn apply(&self, p: f64) -> f64 {
        match self {
            ProbabilityTransform::Log10 => p.max(PC_LOG_FLOOR).log10(),
            ProbabilityTransform::Raw => p,
        }
    }

    /// Map a model-scale value back to a raw probability in [0, 1].
    pub fn invert(&self, v: f64) -> f64 {
        match self {
            ProbabilityTransform::Log10 => clamp01(10f64.powf(v)),
            ProbabilityTransform::Raw => clamp01(v),
        }
    }
}

impl std::fmt::Display for ProbabilityTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbabilityTransform::Log10 => write!(f, "log10"),
            ProbabilityTransform::Raw => write!(f, "raw"),
        }
    }
}

/// log10-scaled miss distance, floored at 1 mm so a zero separation stays
/// finite.
pub fn log_miss_distance(meters: f64) -> f64 {
    meters.max(DISTANCE_LOG_FLOOR_M).log10()
}

/// Clamp to [0, 1]. NaN propagates.
pub fn clamp01(v: f64) -> f64 {
    if v.is_nan() {
        return f64::NAN;
    }
    v.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log10_round_trips_in_unit_interval() {
        let t = ProbabilityTransform::Log10;
        for p in [1e-8, 1e-6, 3.7e-4, 0.2, 0.999] {
            let back = t.invert(t.apply(p));
            assert!((back - p).abs() < 1e-12 * p.max(1.0), "p={p} back={back}");
        }
    }

    #[test]
    fn raw_round_trips_identically() {
        let t = ProbabilityTransform::Raw;
        assert_eq!(t.invert(t.apply(0.25)), 0.25);
    }

    #[test]
    fn zero_probability_stays_finite() {
        let v = ProbabilityTransform::Log10.apply(0.0);
        assert!(v.is_finite());
        assert_eq!(v, -30.0);
    }

    #[test]
    fn invert_clamps_to_unit_interval() {
        assert_eq!(ProbabilityTransform::Log10.invert(2.0), 1.0);
        assert_eq!(ProbabilityTransform::Raw.invert(-0.5), 0.0);
    }

    #[test]
    fn zero_distance_stays_finite() {
        let v = log_miss_distance(0.0);
        assert!(v.is_finite());
        assert_eq!(v, -3.0);
    }
}
