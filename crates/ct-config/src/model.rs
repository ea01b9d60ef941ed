//! Model shape and preprocessing configuration.

use ct_math::ProbabilityTransform;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_sequence_length() -> usize {
    5
}

fn default_hidden_size() -> usize {
    64
}

fn default_num_layers() -> usize {
    2
}

fn default_dropout() -> f64 {
    0.2
}

fn default_mc_passes() -> usize {
    20
}

/// Shape and preprocessing parameters the trained weights expect.
///
/// `probability_transform` must match the transform the weights were trained
/// with; the weights file carries its own transform tag and the two are
/// cross-checked at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Fixed feature-sequence length fed to the network.
    #[serde(default = "default_sequence_length")]
    pub sequence_length: usize,

    /// Recurrent hidden width.
    #[serde(default = "default_hidden_size")]
    pub hidden_size: usize,

    /// Stacked recurrent layers.
    #[serde(default = "default_num_layers")]
    pub num_layers: usize,

    /// Inter-layer dropout rate, active only in sampling mode.
    #[serde(default = "default_dropout")]
    pub dropout: f64,

    /// Monte Carlo dropout passes for the certainty estimate.
    #[serde(default = "default_mc_passes")]
    pub mc_passes: usize,

    /// Probability scale the model consumes and emits.
    #[serde(default)]
    pub probability_transform: ProbabilityTransform,

    /// Path to the trained weights JSON. `None` means the caller supplies
    /// weights programmatically (tests, embedding).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights_path: Option<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            sequence_length: default_sequence_length(),
            hidden_size: default_hidden_size(),
            num_layers: default_num_layers(),
            dropout: default_dropout(),
            mc_passes: default_mc_passes(),
            probability_transform: ProbabilityTransform::default(),
            weights_path: None,
        }
    }
}
