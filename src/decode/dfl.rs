//! Discrete distance-distribution decoding.
//!
//! Box regression heads trained with a distribution loss emit, per box side,
//! `reg_max` logits over integer distance bins instead of one scalar. The
//! decoded distance is the expectation of the softmax of those logits.

/// Decodes one side's bin logits into a continuous distance.
///
/// Computes `Σ i·pᵢ` over the softmax of `logits`, subtracting the max logit
/// first so large activations cannot overflow `exp`. The result lies in
/// `[0, len−1]`; uniform logits yield exactly `(len−1)/2`. Callers scale by
/// the head stride where one applies.
pub fn distribution_expectation(logits: &[f32]) -> f32 {
    debug_assert!(!logits.is_empty(), "distribution needs at least one bin");
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut denom = 0.0f32;
    let mut weighted = 0.0f32;
    for (bin, &logit) in logits.iter().enumerate() {
        let p = (logit - max).exp();
        denom += p;
        weighted += bin as f32 * p;
    }
    weighted / denom
}

#[cfg(test)]
mod tests {
    use super::distribution_expectation;

    #[test]
    fn uniform_logits_yield_exact_midpoint() {
        assert_eq!(distribution_expectation(&[0.0; 8]), 3.5);
        assert_eq!(distribution_expectation(&[2.5; 7]), 3.0);
        assert_eq!(distribution_expectation(&[-1.0; 16]), 7.5);
    }

    #[test]
    fn single_bin_decodes_to_zero() {
        assert_eq!(distribution_expectation(&[4.2]), 0.0);
    }

    #[test]
    fn peaked_logits_pull_the_expectation_to_the_peak() {
        let mut logits = [0.0f32; 8];
        logits[5] = 12.0;
        let dis = distribution_expectation(&logits);
        assert!((dis - 5.0).abs() < 1e-2, "expectation {dis} not near peak");
    }

    #[test]
    fn expectation_is_shift_invariant() {
        let logits = [0.3, 1.7, -0.4, 2.2, 0.9];
        let shifted: Vec<f32> = logits.iter().map(|l| l + 1000.0).collect();
        let base = distribution_expectation(&logits);
        let moved = distribution_expectation(&shifted);
        assert!((base - moved).abs() < 1e-3);
    }

    #[test]
    fn large_logits_stay_finite() {
        let dis = distribution_expectation(&[500.0, 1000.0, 800.0]);
        assert!(dis.is_finite());
        assert!((dis - 1.0).abs() < 1e-2);
    }
}
