// ============================================================
// Layer 4 — Volume Batcher
// ============================================================
// Implements Burn's Batcher trait to stack normalised rows into
// tensors for the regression forward pass.
//
//   Input:  Vec of N ScaledRows, each with D features
//   Output: VolumeBatch with features [N, D], targets and
//           weights [N, 1]
//
// Every row in a partition has the same width (FEATURE_COUNT),
// so the flat feature buffer reshapes cleanly.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::ScaledRow;

// ─── VolumeBatch ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct VolumeBatch<B: Backend> {
    /// shape: [batch_size, feature_count]
    pub features: Tensor<B, 2>,

    /// Normalised target volumes, shape [batch_size, 1]
    pub targets: Tensor<B, 2>,

    /// Per-sample class weights, shape [batch_size, 1]
    pub weights: Tensor<B, 2>,
}

// ─── VolumeBatcher ────────────────────────────────────────────────────────────
/// Stateless; the DataLoader supplies the target device per batch.
#[derive(Clone, Debug, Default)]
pub struct VolumeBatcher;

impl VolumeBatcher {
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Batcher<B, ScaledRow, VolumeBatch<B>> for VolumeBatcher {
    fn batch(&self, items: Vec<ScaledRow>, device: &B::Device) -> VolumeBatch<B> {
        let batch_size = items.len();
        let width      = items.first().map(|r| r.features.len()).unwrap_or(0);

        let features_flat: Vec<f32> = items
            .iter()
            .flat_map(|r| r.features.iter().copied())
            .collect();
        let targets: Vec<f32> = items.iter().map(|r| r.target).collect();
        let weights: Vec<f32> = items.iter().map(|r| r.weight).collect();

        VolumeBatch {
            features: Tensor::from_data(TensorData::new(features_flat, [batch_size, width]), device),
            targets:  Tensor::from_data(TensorData::new(targets, [batch_size, 1]), device),
            weights:  Tensor::from_data(TensorData::new(weights, [batch_size, 1]), device),
        }
    }
}
