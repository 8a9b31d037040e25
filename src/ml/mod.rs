// ============================================================
// Layer 5 — ML Layer (Burn)
// ============================================================
// All Burn model and training code lives here; the data layer
// only touches Burn for its Dataset/Batcher adapters.
//
//   regressor.rs   the Regressor contract and epoch bookkeeping
//   loss.rs        sample-weighted, small-target-boosted MSE
//   schedule.rs    early stopping + plateau LR decay
//   model.rs       fully connected ReLU regressor
//   trainer.rs     BurnRegressor training loop and the
//                  WeightedTrainer that drives any Regressor
//   evaluator.rs   tolerance-banded per-class metrics
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Regressor trait, epoch records and monitors
pub mod regressor;

/// Weighted regression loss (scalar and tensor forms)
pub mod loss;

/// Early stopping and learning-rate decay
pub mod schedule;

/// MLP regressor architecture
pub mod model;

/// Training loop and trainer orchestration
pub mod trainer;

/// Per-class tolerance-band evaluation
pub mod evaluator;
