// ============================================================
// Layer 5 — Training Loop
// ============================================================
// BurnRegressor: the MLP behind the Regressor contract.
//   - Training runs on B (an autodiff backend) with Adam and a
//     seeded, shuffling DataLoader
//   - model.valid() moves the model onto B::InnerBackend for
//     validation and prediction (dropout off, no graph)
//   - The epoch with the best monitored loss is cloned and
//     restored when fit returns
//
// WeightedTrainer: scales the partitions, checks the regressor
// accepts the feature width, runs fit under TrainingControl,
// and hands back test predictions in original units.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::data::batcher::{VolumeBatch, VolumeBatcher};
use crate::data::dataset::{ScaledDataset, ScaledRow};
use crate::data::normalizer::{NormalizationState, ScaledSet};
use crate::domain::error::{PipelineError, PipelineResult, Stage};
use crate::domain::sample::{Partitions, FEATURE_COUNT};
use crate::ml::loss::WeightedLoss;
use crate::ml::model::{VolumeRegressorConfig, VolumeRegressorModel};
use crate::ml::regressor::{EpochMonitor, EpochRecord, Regressor, TrainingHistory};
use crate::ml::schedule::{ScheduleConfig, TrainingControl};

/// CPU training backend used by the binary.
pub type CpuBackend = burn::backend::Autodiff<burn::backend::NdArray<f32>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressorConfig {
    pub hidden:     Vec<usize>,
    pub dropout:    f64,
    pub batch_size: usize,
    pub seed:       u64,
}

impl Default for RegressorConfig {
    fn default() -> Self {
        Self {
            hidden:     vec![128, 64, 32],
            dropout:    0.2,
            batch_size: 32,
            seed:       42,
        }
    }
}

// ─── BurnRegressor ────────────────────────────────────────────────────────────
pub struct BurnRegressor<B: AutodiffBackend> {
    model:      VolumeRegressorModel<B>,
    batch_size: usize,
    seed:       u64,
    device:     B::Device,
}

impl<B: AutodiffBackend> BurnRegressor<B> {
    pub fn new(input_dim: usize, config: &RegressorConfig, device: B::Device) -> PipelineResult<Self> {
        if input_dim == 0 {
            return Err(PipelineError::invalid_config(Stage::Training, "input dimension must be positive"));
        }
        if config.batch_size == 0 {
            return Err(PipelineError::invalid_config(Stage::Training, "batch size must be positive"));
        }
        if !(0.0..1.0).contains(&config.dropout) {
            return Err(PipelineError::invalid_config(
                Stage::Training,
                format!("dropout {} must lie in [0, 1)", config.dropout),
            ));
        }

        B::seed(&device, config.seed);
        let model = VolumeRegressorConfig::new(input_dim)
            .with_hidden(config.hidden.clone())
            .with_dropout(config.dropout)
            .init(&device);
        tracing::info!(
            "Regressor ready: input_dim={}, hidden={:?}, dropout={}",
            input_dim,
            config.hidden,
            config.dropout
        );

        Ok(Self {
            model,
            batch_size: config.batch_size,
            seed:       config.seed,
            device,
        })
    }

    fn check_width(&self, rows: &[Vec<f64>]) -> PipelineResult<()> {
        match rows.iter().find(|r| r.len() != self.model.input_dim) {
            Some(row) => Err(PipelineError::ShapeMismatch {
                stage:    Stage::Training,
                expected: self.model.input_dim,
                actual:   row.len(),
            }),
            None => Ok(()),
        }
    }
}

impl<B: AutodiffBackend> Regressor for BurnRegressor<B> {
    fn input_dim(&self) -> usize {
        self.model.input_dim
    }

    fn fit(
        &mut self,
        train:      &ScaledSet,
        validation: &ScaledSet,
        loss:       &WeightedLoss,
        monitor:    &mut dyn EpochMonitor,
    ) -> PipelineResult<TrainingHistory> {
        if train.is_empty() {
            return Err(PipelineError::invalid_config(Stage::Training, "training partition is empty"));
        }
        self.check_width(&train.features)?;
        self.check_width(&validation.features)?;

        // ── Data loaders ──────────────────────────────────────────────────────
        let train_loader = DataLoaderBuilder::<B, ScaledRow, VolumeBatch<B>>::new(VolumeBatcher::new())
            .batch_size(self.batch_size)
            .shuffle(self.seed)
            .set_device(self.device.clone())
            .build(ScaledDataset::new(train));

        // Inner backend: no autodiff overhead for validation.
        let val_loader = (!validation.is_empty()).then(|| {
            DataLoaderBuilder::<B::InnerBackend, ScaledRow, VolumeBatch<B::InnerBackend>>::new(
                VolumeBatcher::new(),
            )
            .batch_size(self.batch_size)
            .set_device(self.device.clone())
            .build(ScaledDataset::new(validation))
        });
        if val_loader.is_none() {
            tracing::warn!("Validation partition is empty; monitoring training loss instead");
        }

        let mut model   = self.model.clone();
        let mut best    = model.clone();
        let mut optim   = AdamConfig::new().with_epsilon(1e-8).init();
        let mut history = TrainingHistory::default();

        // ── Epoch loop ────────────────────────────────────────────────────────
        for epoch in 1..=monitor.max_epochs() {
            let lr = monitor.learning_rate();

            let mut loss_sum = 0.0f64;
            let mut seen     = 0usize;
            for batch in train_loader.iter() {
                let n = batch.targets.dims()[0];
                let predicted  = model.forward(batch.features);
                let batch_loss = loss.forward(predicted, batch.targets, batch.weights);

                loss_sum += batch_loss.clone().into_scalar().elem::<f64>() * n as f64;
                seen     += n;

                let grads = batch_loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = optim.step(lr, model, grads);
            }
            let train_loss = loss_sum / seen.max(1) as f64;

            let val_loss = val_loader.as_ref().map(|loader| {
                let model_valid = model.valid();
                let mut sum  = 0.0f64;
                let mut seen = 0usize;
                for batch in loader.iter() {
                    let n = batch.targets.dims()[0];
                    let predicted = model_valid.forward(batch.features);
                    sum  += loss
                        .forward(predicted, batch.targets, batch.weights)
                        .into_scalar()
                        .elem::<f64>()
                        * n as f64;
                    seen += n;
                }
                sum / seen.max(1) as f64
            });

            let record = EpochRecord { epoch, train_loss, val_loss, learning_rate: lr };
            let decision = monitor.on_epoch_end(&record);
            history.epochs.push(record);

            tracing::debug!(
                "Epoch {:>3}/{} | train_loss={:.6} | val_loss={} | lr={:.2e}",
                epoch,
                monitor.max_epochs(),
                train_loss,
                val_loss.map_or_else(|| "-".to_string(), |v| format!("{v:.6}")),
                lr,
            );

            if decision.improved {
                best = model.clone();
                history.best_epoch = epoch;
            }
            if decision.stop {
                history.stopped_early = true;
                break;
            }
        }

        // No epoch ever improved (non-finite losses): keep the last parameters.
        if history.best_epoch == 0 {
            best = model;
            history.best_epoch = history.epochs.len();
        }
        self.model = best;

        tracing::info!(
            "Training complete: {} epochs, best epoch {}{}",
            history.epochs.len(),
            history.best_epoch,
            if history.stopped_early { " (early stop)" } else { "" },
        );
        Ok(history)
    }

    fn predict(&self, features: &[Vec<f64>]) -> PipelineResult<Vec<f64>> {
        self.check_width(features)?;
        if features.is_empty() {
            return Ok(Vec::new());
        }

        let n    = features.len();
        let flat = features.iter().flatten().map(|&v| v as f32).collect::<Vec<f32>>();
        let x    = Tensor::<B::InnerBackend, 2>::from_data(
            TensorData::new(flat, [n, self.model.input_dim]),
            &self.device,
        );

        let output = self
            .model
            .valid()
            .forward(x)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| PipelineError::model(format!("cannot read predictions: {e:?}")))?;

        Ok(output.into_iter().map(f64::from).collect())
    }
}

// ─── WeightedTrainer ──────────────────────────────────────────────────────────
/// Test-set predictions and truths, both in original volume units.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOutcome {
    pub history:     TrainingHistory,
    pub truths:      Vec<f64>,
    pub predictions: Vec<f64>,
}

pub struct WeightedTrainer {
    loss:     WeightedLoss,
    schedule: ScheduleConfig,
}

impl WeightedTrainer {
    pub fn new(loss: WeightedLoss, schedule: ScheduleConfig) -> Self {
        Self { loss, schedule }
    }

    pub fn train_and_predict<R: Regressor + ?Sized>(
        &self,
        regressor:  &mut R,
        partitions: &Partitions,
        state:      &NormalizationState,
    ) -> PipelineResult<TrainOutcome> {
        if regressor.input_dim() != FEATURE_COUNT {
            return Err(PipelineError::ShapeMismatch {
                stage:    Stage::Training,
                expected: FEATURE_COUNT,
                actual:   regressor.input_dim(),
            });
        }
        let mut control = TrainingControl::new(&self.schedule)?;

        let train      = state.scale_samples(&partitions.train)?;
        let validation = state.scale_samples(&partitions.validation)?;
        let test       = state.scale_samples(&partitions.test)?;

        tracing::info!(
            "Training on {} samples, validating on {}, testing on {}",
            train.len(),
            validation.len(),
            test.len()
        );

        let history = regressor.fit(&train, &validation, &self.loss, &mut control)?;
        let scaled  = regressor.predict(&test.features)?;
        if scaled.len() != test.len() {
            return Err(PipelineError::model(format!(
                "regressor returned {} predictions for {} test rows",
                scaled.len(),
                test.len()
            )));
        }

        Ok(TrainOutcome {
            history,
            truths:      partitions.test.iter().map(|s| s.target).collect(),
            predictions: state.inverse_transform_targets(&scaled),
        })
    }
}

/// The NdArray RNG is process-wide: tests that seed it or draw from it
/// hold this lock so parallel tests cannot interleave draws.
#[cfg(test)]
pub(crate) fn backend_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::{FeatureVector, Sample};

    /// Predicts the mean training target; records how it was driven.
    struct MeanRegressor {
        input_dim: usize,
        mean:      f64,
        epochs:    usize,
    }

    impl Regressor for MeanRegressor {
        fn input_dim(&self) -> usize {
            self.input_dim
        }

        fn fit(
            &mut self,
            train:       &ScaledSet,
            _validation: &ScaledSet,
            loss:        &WeightedLoss,
            monitor:     &mut dyn EpochMonitor,
        ) -> PipelineResult<TrainingHistory> {
            self.mean = train.targets.iter().sum::<f64>() / train.len() as f64;
            let predicted = vec![self.mean; train.len()];
            let train_loss = loss.batch_mean(&train.targets, &predicted, &train.weights);

            let mut history = TrainingHistory::default();
            for epoch in 1..=monitor.max_epochs() {
                let record = EpochRecord {
                    epoch,
                    train_loss,
                    val_loss: None,
                    learning_rate: monitor.learning_rate(),
                };
                let decision = monitor.on_epoch_end(&record);
                history.epochs.push(record);
                if decision.improved {
                    history.best_epoch = epoch;
                }
                if decision.stop {
                    history.stopped_early = true;
                    break;
                }
            }
            self.epochs = history.epochs.len();
            Ok(history)
        }

        fn predict(&self, features: &[Vec<f64>]) -> PipelineResult<Vec<f64>> {
            Ok(vec![self.mean; features.len()])
        }
    }

    fn sample(target: f64, seed: f64, class_index: usize, window_start: usize) -> Sample {
        let features = (0..FEATURE_COUNT).map(|i| seed * (i + 1) as f64).collect();
        Sample {
            features: FeatureVector::new(features),
            target,
            weight: if target < 100.0 { 2.0 } else { 1.0 },
            class_index,
            window_start,
        }
    }

    fn partitions() -> Partitions {
        let mut train = Vec::new();
        for i in 0..20 {
            train.push(sample(70.0, i as f64 * 0.01, 0, i));
            train.push(sample(250.0, 1.0 + i as f64 * 0.01, 1, i));
        }
        Partitions {
            train,
            validation: vec![sample(70.0, 0.05, 0, 100), sample(250.0, 1.05, 1, 100)],
            test:       vec![sample(70.0, 0.07, 0, 200), sample(250.0, 1.07, 1, 200)],
        }
    }

    #[test]
    fn test_stub_regressor_is_substitutable() {
        let partitions = partitions();
        let state = NormalizationState::fit(&partitions.train).unwrap();
        let schedule = ScheduleConfig {
            max_epochs: 50,
            early_stopping_patience: 3,
            ..ScheduleConfig::default()
        };
        let trainer = WeightedTrainer::new(WeightedLoss::default(), schedule);
        let mut stub = MeanRegressor { input_dim: FEATURE_COUNT, mean: 0.0, epochs: 0 };

        let outcome = trainer.train_and_predict(&mut stub, &partitions, &state).unwrap();

        // constant loss: first epoch is best, then patience runs out
        assert_eq!(stub.epochs, 4);
        assert!(outcome.history.stopped_early);
        assert_eq!(outcome.history.best_epoch, 1);
        assert_eq!(outcome.truths, vec![70.0, 250.0]);
        // mean of scaled targets (0 and 1) maps back to the midpoint
        for p in outcome.predictions {
            assert!((p - 160.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_input_dim_mismatch_rejected_before_training() {
        let partitions = partitions();
        let state = NormalizationState::fit(&partitions.train).unwrap();
        let trainer = WeightedTrainer::new(WeightedLoss::default(), ScheduleConfig::default());
        let mut stub = MeanRegressor { input_dim: 10, mean: 0.0, epochs: 0 };

        let err = trainer.train_and_predict(&mut stub, &partitions, &state).unwrap_err();
        assert_eq!(
            err,
            PipelineError::ShapeMismatch { stage: Stage::Training, expected: FEATURE_COUNT, actual: 10 }
        );
        assert_eq!(stub.epochs, 0);
    }

    #[test]
    fn test_burn_regressor_learns_and_predicts() {
        let _guard = backend_lock();
        let partitions = partitions();
        let state = NormalizationState::fit(&partitions.train).unwrap();
        let config = RegressorConfig {
            hidden: vec![16, 8],
            dropout: 0.0,
            batch_size: 8,
            seed: 7,
        };
        let mut regressor =
            BurnRegressor::<CpuBackend>::new(FEATURE_COUNT, &config, Default::default()).unwrap();
        let schedule = ScheduleConfig {
            max_epochs: 60,
            learning_rate: 1e-2,
            ..ScheduleConfig::default()
        };
        let trainer = WeightedTrainer::new(WeightedLoss::default(), schedule);

        let outcome = trainer.train_and_predict(&mut regressor, &partitions, &state).unwrap();

        let epochs = &outcome.history.epochs;
        assert!(!epochs.is_empty() && epochs.len() <= 60);
        assert!(epochs.iter().all(|r| r.val_loss.is_some()));
        let first  = epochs[0].train_loss;
        let lowest = epochs.iter().map(|r| r.train_loss).fold(f64::INFINITY, f64::min);
        assert!(lowest < first, "lowest {lowest} vs first {first}");
        assert!(outcome.history.best().is_some());
        assert_eq!(outcome.predictions.len(), 2);
        assert!(outcome.predictions.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_burn_regressor_rejects_wrong_width() {
        let _guard = backend_lock();
        let mut regressor =
            BurnRegressor::<CpuBackend>::new(3, &RegressorConfig::default(), Default::default()).unwrap();
        let bad = ScaledSet {
            features: vec![vec![0.0; 4]],
            targets:  vec![0.5],
            weights:  vec![1.0],
        };
        let mut control = TrainingControl::new(&ScheduleConfig::default()).unwrap();
        let err = regressor
            .fit(&bad, &ScaledSet::default(), &WeightedLoss::default(), &mut control)
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Training);
        assert!(regressor.predict(&[vec![0.0; 4]]).is_err());
    }

    #[test]
    fn test_empty_validation_falls_back_to_train_loss() {
        let _guard = backend_lock();
        let config = RegressorConfig { hidden: vec![4], dropout: 0.0, batch_size: 4, seed: 1 };
        let mut regressor =
            BurnRegressor::<CpuBackend>::new(2, &config, Default::default()).unwrap();
        let train = ScaledSet {
            features: vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.5, 0.5]],
            targets:  vec![0.0, 1.0, 0.5],
            weights:  vec![1.0, 1.0, 1.0],
        };
        let schedule = ScheduleConfig { max_epochs: 5, ..ScheduleConfig::default() };
        let mut control = TrainingControl::new(&schedule).unwrap();
        let history = regressor
            .fit(&train, &ScaledSet::default(), &WeightedLoss::default(), &mut control)
            .unwrap();
        assert_eq!(history.epochs.len(), 5);
        assert!(history.epochs.iter().all(|r| r.val_loss.is_none()));
        assert!(history.best_epoch >= 1);
    }
}
