// ============================================================
// Layer 5 — Weighted Volume Loss
// ============================================================
// Per sample, in normalised target space:
//
//   base = (t - p)² · w
//   loss = base · multiplier   if |t| < threshold
//          base                otherwise
//
// and the batch loss is the mean over samples. The sample
// weight carries class importance; the multiplier adds a second,
// independent boost for targets near the bottom of the scaled
// range, where small fills live.
//
// The scalar form is used for monitoring and tests; the tensor
// form is what gradients flow through.

use burn::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightedLoss {
    pub small_target_threshold:  f64,
    pub small_target_multiplier: f64,
}

impl Default for WeightedLoss {
    fn default() -> Self {
        Self {
            small_target_threshold:  0.3,
            small_target_multiplier: 2.0,
        }
    }
}

impl WeightedLoss {
    pub fn sample_loss(&self, target: f64, predicted: f64, weight: f64) -> f64 {
        let base = (target - predicted).powi(2) * weight;
        if target.abs() < self.small_target_threshold {
            base * self.small_target_multiplier
        } else {
            base
        }
    }

    /// Mean sample loss; 0.0 for an empty batch.
    pub fn batch_mean(&self, targets: &[f64], predicted: &[f64], weights: &[f64]) -> f64 {
        let n = targets.len().min(predicted.len()).min(weights.len());
        if n == 0 {
            return 0.0;
        }
        let total: f64 = (0..n)
            .map(|i| self.sample_loss(targets[i], predicted[i], weights[i]))
            .sum();
        total / n as f64
    }

    /// All inputs are `[batch, 1]`; returns the scalar mean as a rank-1 tensor.
    pub fn forward<B: Backend>(
        &self,
        predicted: Tensor<B, 2>,
        targets:   Tensor<B, 2>,
        weights:   Tensor<B, 2>,
    ) -> Tensor<B, 1> {
        let base  = (targets.clone() - predicted).square() * weights;
        let small = targets.abs().lower_elem(self.small_target_threshold);
        let boost = base.ones_like().mask_fill(small, self.small_target_multiplier);
        (base * boost).mean()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_small_target_gets_both_weight_and_multiplier() {
        let loss = WeightedLoss::default();
        assert!((loss.sample_loss(0.1, 0.0, 2.0) - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_large_target_gets_weight_only() {
        let loss = WeightedLoss::default();
        assert!((loss.sample_loss(0.5, 0.0, 1.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let loss = WeightedLoss::default();
        assert!((loss.sample_loss(0.3, 0.0, 1.0) - 0.09).abs() < 1e-12);
    }

    #[test]
    fn test_batch_mean() {
        let loss = WeightedLoss::default();
        let mean = loss.batch_mean(&[0.1, 0.5], &[0.0, 0.0], &[2.0, 1.0]);
        assert!((mean - 0.145).abs() < 1e-12);
        assert_eq!(loss.batch_mean(&[], &[], &[]), 0.0);
    }

    #[test]
    fn test_tensor_form_matches_scalar_form() {
        let device = Default::default();
        let column = |v: Vec<f32>| {
            let n = v.len();
            Tensor::<TestBackend, 2>::from_data(TensorData::new(v, [n, 1]), &device)
        };
        let predicted = column(vec![0.0, 0.0, 0.7]);
        let targets   = column(vec![0.1, 0.5, 0.9]);
        let weights   = column(vec![2.0, 1.0, 1.0]);

        let tensor_loss: f64 = WeightedLoss::default()
            .forward(predicted, targets, weights)
            .into_scalar()
            .elem::<f64>();
        let scalar_loss = WeightedLoss::default()
            .batch_mean(&[0.1, 0.5, 0.9], &[0.0, 0.0, 0.7], &[2.0, 1.0, 1.0]);

        assert!((tensor_loss - scalar_loss).abs() < 1e-5);
    }
}
