//! Collision probability forecasting.
//!
//! The forecast model is an explicit, passed-in handle (weights + dropout
//! rate) threaded through every call rather than process-global state, so
//! tests can swap in fixed weights deterministically. The single-pass point
//! forecast runs with dropout disabled; Monte Carlo sampling enables it via
//! an explicit mode, never a global toggle.

pub mod lstm;
pub mod uncertainty;

pub use lstm::{LstmLayer, SkipLstmWeights};
pub use uncertainty::{certainty_from_spread, run_forecast};

use crate::sequence::FeatureSequence;
use ct_config::ModelConfig;
use ct_math::ProbabilityTransform;
use lstm::{forward, ForwardMode};
use rand::rngs::StdRng;
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or running the forecast model.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("weights file error: {0}")]
    WeightsIo(String),

    #[error("invalid model weights: {0}")]
    InvalidWeights(String),

    #[error("transform mismatch: weights trained on {trained}, configured {configured}")]
    TransformMismatch { trained: String, configured: String },

    #[error("model produced non-finite output")]
    NonFinite,
}

/// Per-event forecast output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ForecastResult {
    /// Best single estimate of the collision probability at TCA, raw scale.
    pub forecast_probability: f64,
    /// Monte Carlo dropout samples, raw scale.
    pub samples: Vec<f64>,
    /// Inverse-dispersion certainty in [0, 1]; 1.0 means zero spread.
    pub certainty: f64,
}

/// A validated model handle: trained weights plus the sampling dropout rate.
///
/// Read-only after construction; sampling changes dropout masks per pass but
/// never the weights.
#[derive(Debug, Clone)]
pub struct ForecastModel {
    weights: SkipLstmWeights,
    dropout: f64,
}

impl ForecastModel {
    /// Validate weights against the configured shape and transform.
    pub fn new(weights: SkipLstmWeights, config: &ModelConfig) -> Result<Self, ForecastError> {
        weights.validate().map_err(ForecastError::InvalidWeights)?;
        if weights.hidden_size != config.hidden_size || weights.num_layers() != config.num_layers
        {
            return Err(ForecastError::InvalidWeights(format!(
                "weights are {} layers of width {}, config expects {} layers of width {}",
                weights.num_layers(),
                weights.hidden_size,
                config.num_layers,
                config.hidden_size
            )));
        }
        if weights.transform != config.probability_transform {
            return Err(ForecastError::TransformMismatch {
                trained: weights.transform.to_string(),
                configured: config.probability_transform.to_string(),
            });
        }
        Ok(ForecastModel {
            weights,
            dropout: config.dropout,
        })
    }

    /// Load weights from a JSON file and validate against the config.
    pub fn from_weights_file(path: &Path, config: &ModelConfig) -> Result<Self, ForecastError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ForecastError::WeightsIo(format!("{}: {e}", path.display())))?;
        let weights: SkipLstmWeights = serde_json::from_str(&text)
            .map_err(|e| ForecastError::WeightsIo(format!("{}: {e}", path.display())))?;
        Self::new(weights, config)
    }

    /// The probability scale this model consumes and emits internally.
    pub fn transform(&self) -> ProbabilityTransform {
        self.weights.transform
    }

    /// Deterministic point forecast, returned as a raw probability.
    pub fn forecast(&self, sequence: &FeatureSequence) -> Result<f64, ForecastError> {
        self.check_sequence(sequence)?;
        let out = forward::<StdRng>(&self.weights, sequence, ForwardMode::Deterministic);
        if !out.is_finite() {
            return Err(ForecastError::NonFinite);
        }
        Ok(self.weights.transform.invert(out))
    }

    /// One stochastic pass with dropout active, returned as a raw
    /// probability. Used by the uncertainty estimator.
    pub fn sample<R: Rng>(
        &self,
        sequence: &FeatureSequence,
        rng: &mut R,
    ) -> Result<f64, ForecastError> {
        self.check_sequence(sequence)?;
        let out = forward(
            &self.weights,
            sequence,
            ForwardMode::Sampling {
                rate: self.dropout,
                rng,
            },
        );
        if !out.is_finite() {
            return Err(ForecastError::NonFinite);
        }
        Ok(self.weights.transform.invert(out))
    }

    /// Forward-only validation loss: mean squared error in the trained
    /// scale against known outcome probabilities. Used to compare
    /// configurations; not a runtime contract. Returns 0.0 for an empty
    /// holdout set.
    pub fn evaluate(
        &self,
        holdout: &[(FeatureSequence, f64)],
    ) -> Result<f64, ForecastError> {
        if holdout.is_empty() {
            return Ok(0.0);
        }
        let mut total = 0.0;
        for (sequence, target) in holdout {
            self.check_sequence(sequence)?;
            let out = forward::<StdRng>(&self.weights, sequence, ForwardMode::Deterministic);
            if !out.is_finite() {
                return Err(ForecastError::NonFinite);
            }
            let target_scaled = self.weights.transform.apply(*target);
            total += (out - target_scaled) * (out - target_scaled);
        }
        Ok(total / holdout.len() as f64)
    }

    fn check_sequence(&self, sequence: &FeatureSequence) -> Result<(), ForecastError> {
        if sequence.transform() != self.weights.transform {
            return Err(ForecastError::TransformMismatch {
                trained: self.weights.transform.to_string(),
                configured: sequence.transform().to_string(),
            });
        }
        Ok(())
    }
}
