//! Mask-aware and sample statistics.
//!
//! Padded sequence positions must never leak into aggregates, so every
//! reduction here takes an explicit inclusion mask or operates only on
//! real samples.

/// Arithmetic mean. Returns 0.0 for empty input; NaN propagates.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased sample standard deviation. Returns 0.0 for fewer than two
/// samples (no dispersion evidence), NaN if any sample is NaN.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Mean over positions where `mask` is true. Returns 0.0 when the mask
/// selects nothing.
pub fn masked_mean(values: &[f64], mask: &[bool]) -> f64 {
    debug_assert_eq!(values.len(), mask.len(), "masked_mean length mismatch");
    let mut sum = 0.0;
    let mut n = 0usize;
    for (v, keep) in values.iter().zip(mask) {
        if *keep {
            sum += v;
            n += 1;
        }
    }
    if n == 0 {
        return 0.0;
    }
    sum / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn sample_std_of_constant_is_zero() {
        assert_eq!(sample_std(&[4.2, 4.2, 4.2]), 0.0);
    }

    #[test]
    fn sample_std_single_sample_is_zero() {
        assert_eq!(sample_std(&[7.0]), 0.0);
    }

    #[test]
    fn sample_std_known_value() {
        // Var([1,2,3,4]) unbiased = 5/3
        let s = sample_std(&[1.0, 2.0, 3.0, 4.0]);
        assert!((s - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn sample_std_nan_propagates() {
        assert!(sample_std(&[1.0, f64::NAN]).is_nan());
    }

    #[test]
    fn masked_mean_ignores_masked_positions() {
        let values = [0.0, 0.0, 10.0, 20.0];
        let mask = [false, false, true, true];
        assert_eq!(masked_mean(&values, &mask), 15.0);
    }

    #[test]
    fn masked_mean_all_masked_is_zero() {
        assert_eq!(masked_mean(&[1.0, 2.0], &[false, false]), 0.0);
    }
}
