// ============================================================
// Layer 5 — Training Schedule
// ============================================================
// Two independent controllers watch the same monitored loss
// (validation loss, or training loss when there is no
// validation data):
//
//   EarlyStopping    → stop after `patience` epochs without a
//                      new best; the best epoch's parameters
//                      are the ones kept
//   PlateauScheduler → multiply the LR by `factor` after
//                      `patience` stalled epochs, never going
//                      below `min_lr`
//
// TrainingControl bundles both behind the EpochMonitor trait.

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult, Stage};
use crate::ml::regressor::{EpochDecision, EpochMonitor, EpochRecord};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub max_epochs:              usize,
    pub learning_rate:           f64,
    pub early_stopping_patience: usize,
    pub lr_patience:             usize,
    pub lr_factor:               f64,
    pub min_lr:                  f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            max_epochs:              300,
            learning_rate:           1e-3,
            early_stopping_patience: 20,
            lr_patience:             10,
            lr_factor:               0.2,
            min_lr:                  1e-6,
        }
    }
}

impl ScheduleConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        let reason = if self.max_epochs == 0 {
            Some("max_epochs must be at least 1".to_string())
        } else if !(self.learning_rate > 0.0) {
            Some(format!("learning rate {} must be positive", self.learning_rate))
        } else if !(self.lr_factor > 0.0 && self.lr_factor < 1.0) {
            Some(format!("lr factor {} must lie in (0, 1)", self.lr_factor))
        } else if !(self.min_lr >= 0.0) || self.min_lr > self.learning_rate {
            Some(format!(
                "min_lr {} must lie in [0, learning_rate]",
                self.min_lr
            ))
        } else if self.early_stopping_patience == 0 || self.lr_patience == 0 {
            Some("patience values must be at least 1".to_string())
        } else {
            None
        };

        match reason {
            Some(reason) => Err(PipelineError::invalid_config(Stage::Training, reason)),
            None => Ok(()),
        }
    }
}

// ─── EarlyStopping ────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience:   usize,
    best_loss:  f64,
    best_epoch: usize,
    wait:       usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self { patience, best_loss: f64::INFINITY, best_epoch: 0, wait: 0 }
    }

    /// Returns true when `loss` is a new best.
    pub fn observe(&mut self, epoch: usize, loss: f64) -> bool {
        if loss < self.best_loss {
            self.best_loss  = loss;
            self.best_epoch = epoch;
            self.wait       = 0;
            true
        } else {
            self.wait += 1;
            false
        }
    }

    pub fn should_stop(&self) -> bool {
        self.wait >= self.patience
    }

    pub fn best_epoch(&self) -> usize {
        self.best_epoch
    }

    pub fn best_loss(&self) -> f64 {
        self.best_loss
    }
}

// ─── PlateauScheduler ─────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct PlateauScheduler {
    lr:        f64,
    factor:    f64,
    patience:  usize,
    min_lr:    f64,
    best_loss: f64,
    wait:      usize,
}

impl PlateauScheduler {
    pub fn new(initial_lr: f64, factor: f64, patience: usize, min_lr: f64) -> Self {
        Self {
            lr: initial_lr,
            factor,
            patience,
            min_lr,
            best_loss: f64::INFINITY,
            wait: 0,
        }
    }

    pub fn lr(&self) -> f64 {
        self.lr
    }

    /// Feed one epoch's loss; returns the LR for the next epoch.
    pub fn step(&mut self, loss: f64) -> f64 {
        if loss < self.best_loss {
            self.best_loss = loss;
            self.wait      = 0;
        } else {
            self.wait += 1;
            if self.wait >= self.patience {
                let reduced = (self.lr * self.factor).max(self.min_lr);
                if reduced < self.lr {
                    tracing::debug!("Plateau: learning rate {:.2e} → {:.2e}", self.lr, reduced);
                }
                self.lr   = reduced;
                self.wait = 0;
            }
        }
        self.lr
    }
}

// ─── TrainingControl ──────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct TrainingControl {
    max_epochs: usize,
    stopping:   EarlyStopping,
    plateau:    PlateauScheduler,
}

impl TrainingControl {
    pub fn new(config: &ScheduleConfig) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            max_epochs: config.max_epochs,
            stopping:   EarlyStopping::new(config.early_stopping_patience),
            plateau:    PlateauScheduler::new(
                config.learning_rate,
                config.lr_factor,
                config.lr_patience,
                config.min_lr,
            ),
        })
    }

    pub fn best_epoch(&self) -> usize {
        self.stopping.best_epoch()
    }
}

impl EpochMonitor for TrainingControl {
    fn max_epochs(&self) -> usize {
        self.max_epochs
    }

    fn learning_rate(&self) -> f64 {
        self.plateau.lr()
    }

    fn on_epoch_end(&mut self, record: &EpochRecord) -> EpochDecision {
        let loss     = record.monitored_loss();
        let improved = self.stopping.observe(record.epoch, loss);
        self.plateau.step(loss);
        let stop = self.stopping.should_stop();

        if stop {
            tracing::info!(
                "Early stopping at epoch {} (best epoch {}, loss {:.6})",
                record.epoch,
                self.stopping.best_epoch(),
                self.stopping.best_loss(),
            );
        }
        EpochDecision { improved, stop }
    }
}
