//! Monte Carlo dropout certainty estimation.
//!
//! Repeated stochastic forward passes with dropout left active approximate
//! a distribution over forecasts from a single trained model. The spread of
//! those samples maps to a bounded certainty score; aggregation is
//! order-independent, so concurrent scheduling of passes cannot change the
//! score.

use crate::forecast::{ForecastError, ForecastModel, ForecastResult};
use crate::sequence::FeatureSequence;
use ct_math::sample_std;
use rand::Rng;

/// Map sample spread to certainty: 1 / (1 + decay·σ).
///
/// Monotonic — more spread never yields more certainty — and saturating:
/// exactly 1.0 at zero spread, approaching 0.0 as spread grows.
pub fn certainty_from_spread(spread: f64, decay: f64) -> f64 {
    if spread.is_nan() {
        return f64::NAN;
    }
    1.0 / (1.0 + decay * spread.max(0.0))
}

/// Point forecast plus Monte Carlo certainty for one sequence.
///
/// Runs one deterministic pass for the forecast, then `passes` sampling
/// passes for the spread. Weights are read-only throughout.
pub fn run_forecast<R: Rng>(
    model: &ForecastModel,
    sequence: &FeatureSequence,
    passes: usize,
    certainty_decay: f64,
    rng: &mut R,
) -> Result<ForecastResult, ForecastError> {
    let forecast_probability = model.forecast(sequence)?;

    let mut samples = Vec::with_capacity(passes);
    for _ in 0..passes {
        samples.push(model.sample(sequence, rng)?);
    }

    let spread = sample_std(&samples);
    let certainty = certainty_from_spread(spread, certainty_decay);
    if !certainty.is_finite() {
        return Err(ForecastError::NonFinite);
    }

    Ok(ForecastResult {
        forecast_probability,
        samples,
        certainty,
    })
}
