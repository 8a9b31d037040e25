// ============================================================
// Layer 5 — Regressor Contract
// ============================================================
// The narrow capability the pipeline needs from a model:
//
//   input_dim()  → width of the feature rows it accepts
//   fit(...)     → weighted training with per-epoch monitoring
//   predict(...) → one scaled prediction per feature row
//
// Everything outside this file talks to models only through
// these operations, so a stub can stand in for the burn MLP.
// Scaling in and out of normalised space is the normalizer's
// job, never the regressor's.

use serde::Serialize;

use crate::data::normalizer::ScaledSet;
use crate::domain::error::PipelineResult;
use crate::ml::loss::WeightedLoss;

// ─── Epoch bookkeeping ────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochRecord {
    pub epoch:         usize,
    pub train_loss:    f64,
    /// None when the validation partition is empty.
    pub val_loss:      Option<f64>,
    pub learning_rate: f64,
}

impl EpochRecord {
    /// The loss early stopping and LR decay watch.
    pub fn monitored_loss(&self) -> f64 {
        self.val_loss.unwrap_or(self.train_loss)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EpochDecision {
    /// This epoch is the best seen so far; keep its parameters.
    pub improved: bool,
    pub stop:     bool,
}

/// Drives a fit: how long, how fast, and when to stop.
pub trait EpochMonitor {
    fn max_epochs(&self) -> usize;

    /// Learning rate for the next epoch.
    fn learning_rate(&self) -> f64;

    fn on_epoch_end(&mut self, record: &EpochRecord) -> EpochDecision;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingHistory {
    pub epochs:        Vec<EpochRecord>,
    /// 1-based epoch whose parameters the regressor holds after fit.
    pub best_epoch:    usize,
    pub stopped_early: bool,
}

impl TrainingHistory {
    pub fn best(&self) -> Option<&EpochRecord> {
        self.epochs.iter().find(|r| r.epoch == self.best_epoch)
    }
}

// ─── Regressor ────────────────────────────────────────────────────────────────
pub trait Regressor {
    fn input_dim(&self) -> usize;

    fn fit(
        &mut self,
        train:      &ScaledSet,
        validation: &ScaledSet,
        loss:       &WeightedLoss,
        monitor:    &mut dyn EpochMonitor,
    ) -> PipelineResult<TrainingHistory>;

    fn predict(&self, features: &[Vec<f64>]) -> PipelineResult<Vec<f64>>;
}
