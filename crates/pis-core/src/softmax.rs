//! Numerically stable, temperature-controlled softmax.
//!
//! Implements the seven-step max-subtract / log-sum-exp recipe exactly:
//! clamp, explicit log-sum-exp, and a finite check at each stage.

use crate::config::{LAMBDA_MAX, LAMBDA_MIN};

const CLAMP_BOUND: f64 = 700.0;
const MAX_INPUT_LEN: usize = 1_000_000;
const SUM_TOLERANCE: f64 = 1e-5;

/// Computes `softmax(scores, lambda)`, falling back to a uniform
/// distribution whenever the input or an intermediate result would be
/// unusable. Never panics; the fallback is the only error path.
pub fn softmax(scores: &[f64], lambda: f64) -> Vec<f64> {
    match try_softmax(scores, lambda) {
        Ok(probs) => probs,
        Err(reason) => {
            tracing::warn!(
                "softmax fallback to uniform distribution: {reason} (n={}, lambda={lambda})",
                scores.len()
            );
            uniform(scores.len())
        }
    }
}

fn uniform(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    vec![1.0 / n as f64; n]
}

fn try_softmax(scores: &[f64], lambda: f64) -> Result<Vec<f64>, &'static str> {
    // 1. validate input
    if scores.is_empty() {
        return Err("empty input");
    }
    if scores.len() > MAX_INPUT_LEN {
        return Err("input longer than the maximum supported length");
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err("non-finite score in input");
    }
    if !(LAMBDA_MIN..=LAMBDA_MAX).contains(&lambda) {
        return Err("lambda out of range");
    }

    // 2. find M = max(scores); if M is not finite, fall back
    let m = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !m.is_finite() {
        return Err("max score is not finite");
    }

    // 3. scaled[i] = clamp((scores[i] - M) * lambda, -700, 700)
    let scaled: Vec<f64> = scores
        .iter()
        .map(|&s| ((s - m) * lambda).clamp(-CLAMP_BOUND, CLAMP_BOUND))
        .collect();

    // 4. S = sum(exp(scaled[i])); if S <= 0 or non-finite, fall back
    let s: f64 = scaled.iter().map(|&x| x.exp()).sum();
    if !s.is_finite() || s <= 0.0 {
        return Err("sum of exponentials is non-positive or non-finite");
    }

    // 5. L = log S; if L non-finite, fall back
    let l = s.ln();
    if !l.is_finite() {
        return Err("log-sum-exp is non-finite");
    }

    // 6. prob[i] = exp(scaled[i] - L)
    let probs: Vec<f64> = scaled.iter().map(|&x| (x - l).exp()).collect();

    // 7. if any result is non-finite, fall back
    if probs.iter().any(|p| !p.is_finite()) {
        return Err("a resulting probability is non-finite");
    }

    Ok(probs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum(probs: &[f64]) -> f64 {
        probs.iter().sum()
    }

    #[test]
    fn direct_example_from_spec() {
        let probs = softmax(&[1.0, 2.0, 3.0], 2.0);
        let expected = [0.0177, 0.1173, 0.8650];
        for (p, e) in probs.iter().zip(expected.iter()) {
            assert!((p - e).abs() < 1e-3, "{p} vs {e}");
        }
        assert!((sum(&probs) - 1.0).abs() < SUM_TOLERANCE);
    }

    #[test]
    fn degenerate_identical_scores_are_exactly_uniform() {
        let probs = softmax(&[5.0, 5.0, 5.0, 5.0], 1.0);
        assert_eq!(probs, vec![0.25, 0.25, 0.25, 0.25]);
    }

    #[test]
    fn non_finite_input_falls_back_to_uniform() {
        let probs = softmax(&[1.0, f64::NAN, 3.0], 1.0);
        for p in &probs {
            assert!((p - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let probs = softmax(&[], 1.0);
        assert!(probs.is_empty());
    }

    #[test]
    fn out_of_range_lambda_falls_back() {
        let probs = softmax(&[1.0, 2.0, 3.0], LAMBDA_MAX + 0.001);
        assert_eq!(probs, vec![1.0 / 3.0; 3]);

        let probs = softmax(&[1.0, 2.0, 3.0], LAMBDA_MIN - 0.0001);
        assert_eq!(probs, vec![1.0 / 3.0; 3]);
    }

    #[test]
    fn strictly_ascending_scores_yield_strictly_ascending_probabilities() {
        let probs = softmax(&[-1.0, 0.0, 1.0, 5.0], 1.0);
        for w in probs.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn invariant_to_additive_shift() {
        let base = softmax(&[1.0, 2.0, 3.0], 0.7);
        let shifted = softmax(&[101.0, 102.0, 103.0], 0.7);
        for (a, b) in base.iter().zip(shifted.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn probabilities_sum_to_one_and_are_nonnegative(
            scores in proptest::collection::vec(-1e6f64..1e6f64, 1..64),
            lambda in LAMBDA_MIN..=LAMBDA_MAX,
        ) {
            let probs = softmax(&scores, lambda);
            prop_assert_eq!(probs.len(), scores.len());
            let total: f64 = probs.iter().sum();
            prop_assert!((total - 1.0).abs() < 1e-5);
            prop_assert!(probs.iter().all(|&p| p >= 0.0));
        }

        #[test]
        fn non_finite_anywhere_yields_uniform(
            len in 1usize..32,
            bad_index in 0usize..32,
            lambda in LAMBDA_MIN..=LAMBDA_MAX,
        ) {
            let idx = bad_index % len;
            let mut scores: Vec<f64> = (0..len).map(|i| i as f64).collect();
            scores[idx] = f64::INFINITY;
            let probs = softmax(&scores, lambda);
            let expected = 1.0 / len as f64;
            for p in probs {
                prop_assert!((p - expected).abs() < 1e-9);
            }
        }
    }
}
