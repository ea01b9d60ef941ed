//! Masked skip-LSTM weights and forward pass.
//!
//! The recurrent path summarizes the encounter's trajectory; a skip path
//! feeds the final (most recent, always unpadded) feature vector straight to
//! the output head, where a learned sigmoid gate blends the latest observed
//! probability with the recurrent trend estimate. Padded steps never update
//! the recurrent state.

use crate::sequence::{FeatureSequence, FEATURES_PER_STEP, FEATURE_PROBABILITY};
use ct_math::{add_assign, dot, sigmoid, tanh, Matrix, ProbabilityTransform};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Weights for one recurrent layer. Gate rows are stacked in the order
/// input, forget, cell, output: `w_ih` is (4·hidden × in), `w_hh` is
/// (4·hidden × hidden), `bias` has 4·hidden entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmLayer {
    pub w_ih: Matrix,
    pub w_hh: Matrix,
    pub bias: Vec<f64>,
}

/// Trained skip-LSTM weights, as serialized in the weights file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkipLstmWeights {
    /// Probability scale the network was trained on. Must match the
    /// configured sequence transform; checked at model construction.
    pub transform: ProbabilityTransform,
    pub input_size: usize,
    pub hidden_size: usize,
    pub layers: Vec<LstmLayer>,
    /// Trend head: final hidden state → model-scale estimate.
    pub w_trend: Vec<f64>,
    pub b_trend: f64,
    /// Blending gate over [final hidden state, final feature vector].
    pub w_gate: Vec<f64>,
    pub b_gate: f64,
}

impl SkipLstmWeights {
    /// Check every shape against the declared sizes and reject non-finite
    /// entries. Runs once at model construction, so the forward pass can
    /// index without re-checking.
    pub fn validate(&self) -> Result<(), String> {
        if self.input_size != FEATURES_PER_STEP {
            return Err(format!(
                "input_size: expected {FEATURES_PER_STEP}, got {}",
                self.input_size
            ));
        }
        if self.hidden_size == 0 {
            return Err("hidden_size must be at least 1".to_string());
        }
        if self.layers.is_empty() {
            return Err("at least one recurrent layer is required".to_string());
        }
        let h = self.hidden_size;
        for (i, layer) in self.layers.iter().enumerate() {
            let in_width = if i == 0 { self.input_size } else { h };
            layer.w_ih.check_shape(4 * h, in_width, &format!("layers[{i}].w_ih"))?;
            layer.w_hh.check_shape(4 * h, h, &format!("layers[{i}].w_hh"))?;
            check_vec(&layer.bias, 4 * h, &format!("layers[{i}].bias"))?;
        }
        check_vec(&self.w_trend, h, "w_trend")?;
        check_vec(&self.w_gate, h + self.input_size, "w_gate")?;
        if !self.b_trend.is_finite() || !self.b_gate.is_finite() {
            return Err("head biases contain non-finite entries".to_string());
        }
        Ok(())
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Small uniform random initialization, for tests and smoke runs where
    /// no trained weights file is at hand. Deterministic per seed.
    pub fn seeded(
        hidden_size: usize,
        num_layers: usize,
        transform: ProbabilityTransform,
        seed: u64,
    ) -> Self {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let scale = 1.0 / (hidden_size.max(1) as f64).sqrt();
        let mut uniform = |n: usize| -> Vec<f64> {
            (0..n)
                .map(|_| (rng.random::<f64>() * 2.0 - 1.0) * scale)
                .collect()
        };

        let mut layers = Vec::with_capacity(num_layers);
        for i in 0..num_layers {
            let in_width = if i == 0 { FEATURES_PER_STEP } else { hidden_size };
            layers.push(LstmLayer {
                w_ih: Matrix::new(4 * hidden_size, in_width, uniform(4 * hidden_size * in_width))
                    .expect("sized to shape"),
                w_hh: Matrix::new(
                    4 * hidden_size,
                    hidden_size,
                    uniform(4 * hidden_size * hidden_size),
                )
                .expect("sized to shape"),
                bias: uniform(4 * hidden_size),
            });
        }

        SkipLstmWeights {
            transform,
            input_size: FEATURES_PER_STEP,
            hidden_size,
            layers,
            w_trend: uniform(hidden_size),
            b_trend: 0.0,
            w_gate: uniform(hidden_size + FEATURES_PER_STEP),
            b_gate: 0.0,
        }
    }
}

fn check_vec(v: &[f64], expected: usize, name: &str) -> Result<(), String> {
    if v.len() != expected {
        return Err(format!("{name}: expected {expected} entries, got {}", v.len()));
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(format!("{name}: contains non-finite entries"));
    }
    Ok(())
}

/// Forward-pass mode: deterministic point forecast, or sampling with
/// inter-layer dropout left active (Monte Carlo dropout). Weights are never
/// mutated in either mode.
pub(crate) enum ForwardMode<'a, R: Rng> {
    Deterministic,
    Sampling { rate: f64, rng: &'a mut R },
}

/// Run the network over one sequence, returning the model-scale output.
///
/// Precondition: `weights.validate()` passed and the sequence was built
/// with `weights.input_size` features per step.
pub(crate) fn forward<R: Rng>(
    weights: &SkipLstmWeights,
    sequence: &FeatureSequence,
    mut mode: ForwardMode<'_, R>,
) -> f64 {
    let h_width = weights.hidden_size;
    let mask = sequence.mask();
    let last_layer = weights.num_layers() - 1;

    let mut layer_input: Vec<Vec<f64>> =
        sequence.rows().iter().map(|row| row.to_vec()).collect();
    let mut h_last = vec![0.0; h_width];

    for (li, layer) in weights.layers.iter().enumerate() {
        let mut h = vec![0.0; h_width];
        let mut c = vec![0.0; h_width];
        let mut outputs = Vec::with_capacity(layer_input.len());

        for (t, x) in layer_input.iter().enumerate() {
            if mask[t] {
                let mut z = layer.w_ih.matvec(x);
                add_assign(&mut z, &layer.w_hh.matvec(&h));
                add_assign(&mut z, &layer.bias);
                for u in 0..h_width {
                    let gate_i = sigmoid(z[u]);
                    let gate_f = sigmoid(z[h_width + u]);
                    let gate_g = tanh(z[2 * h_width + u]);
                    let gate_o = sigmoid(z[3 * h_width + u]);
                    c[u] = gate_f * c[u] + gate_i * gate_g;
                    h[u] = gate_o * tanh(c[u]);
                }
            }
            // Padded prefix steps leave the state at its initial zeros.
            outputs.push(h.clone());
        }

        h_last = h;
        if li < last_layer {
            if let ForwardMode::Sampling { rate, rng } = &mut mode {
                apply_dropout(&mut outputs, *rate, rng);
            }
            layer_input = outputs;
        }
    }

    let x_last = sequence.latest_row();
    let trend = dot(&weights.w_trend, &h_last) + weights.b_trend;

    let mut gate_in = Vec::with_capacity(h_width + weights.input_size);
    gate_in.extend_from_slice(&h_last);
    gate_in.extend_from_slice(x_last);
    let gate = sigmoid(dot(&weights.w_gate, &gate_in) + weights.b_gate);

    let skip = x_last[FEATURE_PROBABILITY];
    gate * skip + (1.0 - gate) * trend
}

/// Inverted dropout: zero each unit with probability `rate`, scale the
/// survivors by 1/(1-rate) so expected activations are unchanged.
fn apply_dropout<R: Rng>(outputs: &mut [Vec<f64>], rate: f64, rng: &mut R) {
    if rate <= 0.0 {
        return;
    }
    let keep_scale = 1.0 / (1.0 - rate);
    for step in outputs.iter_mut() {
        for unit in step.iter_mut() {
            if rng.random::<f64>() < rate {
                *unit = 0.0;
            } else {
                *unit *= keep_scale;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::build_sequence;
    use chrono::{TimeZone, Utc};
    use ct_common::{CdmRecord, ConjunctionEvent, EventKey, ObjectPair};
    use rand::rngs::StdRng;
    use uuid::Uuid;

    fn sequence(pcs: &[f64], length: usize) -> FeatureSequence {
        let tca = Utc.with_ymd_and_hms(2026, 5, 2, 12, 0, 0).unwrap();
        let records = pcs
            .iter()
            .enumerate()
            .map(|(i, pc)| CdmRecord {
                message_id: Uuid::new_v4(),
                primary_id: "A".into(),
                secondary_id: "B".into(),
                created: Utc.with_ymd_and_hms(2026, 5, 1, i as u32, 0, 0).unwrap(),
                tca,
                miss_distance_m: 900.0,
                collision_probability: *pc,
                primary: None,
                secondary: None,
            })
            .collect();
        let event = ConjunctionEvent::from_records(
            EventKey {
                pair: ObjectPair::new("A", "B"),
                reference_tca: tca,
            },
            records,
        )
        .unwrap();
        build_sequence(&event, length, ProbabilityTransform::Log10)
    }

    #[test]
    fn seeded_weights_validate() {
        SkipLstmWeights::seeded(8, 2, ProbabilityTransform::Log10, 7)
            .validate()
            .unwrap();
    }

    #[test]
    fn validate_rejects_wrong_shapes() {
        let mut w = SkipLstmWeights::seeded(8, 2, ProbabilityTransform::Log10, 7);
        w.w_trend.pop();
        assert!(w.validate().unwrap_err().contains("w_trend"));

        let mut w = SkipLstmWeights::seeded(8, 1, ProbabilityTransform::Log10, 7);
        w.layers[0].bias[0] = f64::NAN;
        assert!(w.validate().unwrap_err().contains("non-finite"));
    }

    #[test]
    fn deterministic_forward_is_repeatable() {
        let w = SkipLstmWeights::seeded(8, 2, ProbabilityTransform::Log10, 7);
        let seq = sequence(&[1e-6, 1e-5, 5e-4], 5);
        let a = forward::<StdRng>(&w, &seq, ForwardMode::Deterministic);
        let b = forward::<StdRng>(&w, &seq, ForwardMode::Deterministic);
        assert_eq!(a, b);
        assert!(a.is_finite());
    }

    #[test]
    fn padding_does_not_change_output() {
        // The same three observations padded to length 5 and to length 8
        // must produce the same output: padded steps carry zero state and
        // the head only sees the final real row.
        let w = SkipLstmWeights::seeded(8, 2, ProbabilityTransform::Log10, 7);
        let short = sequence(&[1e-6, 1e-5, 5e-4], 5);
        let long = sequence(&[1e-6, 1e-5, 5e-4], 8);
        let a = forward::<StdRng>(&w, &short, ForwardMode::Deterministic);
        let b = forward::<StdRng>(&w, &long, ForwardMode::Deterministic);
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn sampling_mode_varies_with_rng_state() {
        let w = SkipLstmWeights::seeded(8, 2, ProbabilityTransform::Log10, 7);
        let seq = sequence(&[1e-6, 1e-5, 5e-4], 5);
        let mut rng = StdRng::seed_from_u64(11);
        let a = forward(&w, &seq, ForwardMode::Sampling { rate: 0.5, rng: &mut rng });
        let b = forward(&w, &seq, ForwardMode::Sampling { rate: 0.5, rng: &mut rng });
        assert_ne!(a, b);
    }

    #[test]
    fn sampling_with_zero_rate_matches_deterministic() {
        let w = SkipLstmWeights::seeded(8, 2, ProbabilityTransform::Log10, 7);
        let seq = sequence(&[1e-6, 1e-5], 5);
        let mut rng = StdRng::seed_from_u64(11);
        let a = forward(&w, &seq, ForwardMode::Sampling { rate: 0.0, rng: &mut rng });
        let b = forward::<StdRng>(&w, &seq, ForwardMode::Deterministic);
        assert_eq!(a, b);
    }

    #[test]
    fn gate_blend_tracks_latest_observation() {
        // Force the gate fully open toward the skip path: output equals the
        // latest transformed probability exactly.
        let mut w = SkipLstmWeights::seeded(4, 1, ProbabilityTransform::Log10, 3);
        for v in w.w_gate.iter_mut() {
            *v = 0.0;
        }
        w.b_gate = 60.0; // sigmoid saturates to 1.0
        let seq = sequence(&[1e-6, 5e-4], 5);
        let out = forward::<StdRng>(&w, &seq, ForwardMode::Deterministic);
        let expected = ProbabilityTransform::Log10.apply(5e-4);
        assert!((out - expected).abs() < 1e-9);
    }
}
