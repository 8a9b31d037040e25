// ============================================================
// Layer 4 — Train / Validation / Test Partitioning
// ============================================================
// Two named strategies, selected by PartitionStrategy:
//
//   GlobalStratified
//     1. per class, shuffle and send round(n_c * test_fraction)
//        samples to test (at least one, at most n_c - 1, when
//        the class has two or more samples)
//     2. pool what is left, shuffle, split train / validation
//        by `validation_fraction` (0.2 → 80/20)
//
//   FixedCountPerClass
//     per class: shuffle, first `per_class` samples go to
//     validation, then ceil(rest * test_fraction) go to test and
//     the remainder to train; partitions are concatenated in
//     catalog order. A class with fewer than `per_class` samples
//     is a sizing error, never silently truncated.
//
// Every shuffle draws from one StdRng seeded from the run seed,
// so the same seed and corpus always give the same partitions.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult, Stage};
use crate::domain::sample::{Partitions, Sample};
use crate::domain::volume_class::Catalog;

// ─── Configuration ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PartitionStrategy {
    GlobalStratified { validation_fraction: f64 },
    FixedCountPerClass { per_class: usize },
}

impl Default for PartitionStrategy {
    fn default() -> Self {
        PartitionStrategy::FixedCountPerClass { per_class: 20 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartitionConfig {
    pub strategy:      PartitionStrategy,
    pub test_fraction: f64,
    pub seed:          u64,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            strategy:      PartitionStrategy::default(),
            test_fraction: 0.2,
            seed:          42,
        }
    }
}

/// Partition `samples` with the configured strategy.
pub fn partition(
    samples: Vec<Sample>,
    catalog: &Catalog,
    config:  &PartitionConfig,
) -> PipelineResult<Partitions> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let partitions = match config.strategy {
        PartitionStrategy::GlobalStratified { validation_fraction } => split_global_stratified(
            samples,
            catalog,
            config.test_fraction,
            validation_fraction,
            &mut rng,
        )?,
        PartitionStrategy::FixedCountPerClass { per_class } => split_fixed_count_per_class(
            samples,
            catalog,
            per_class,
            config.test_fraction,
            &mut rng,
        )?,
    };

    tracing::info!(
        "Partitioned {} samples: {} train, {} validation, {} test",
        partitions.total(),
        partitions.train.len(),
        partitions.validation.len(),
        partitions.test.len(),
    );
    Ok(partitions)
}

/// Randomly shuffle `samples` and split into (train, validation).
///
/// `train_fraction` of the samples (rounded) go to the first half.
pub fn split_train_val<T>(
    mut samples:    Vec<T>,
    train_fraction: f64,
    rng:            &mut StdRng,
) -> (Vec<T>, Vec<T>) {
    samples.shuffle(rng);

    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;
    let split_at = split_at.min(total);

    // split_off(n) leaves [0..n) in `samples` and returns [n..total)
    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        samples.len(),
        val.len(),
    );

    (samples, val)
}

// ─── Strategy (a): global stratified ──────────────────────────────────────────
pub fn split_global_stratified(
    samples:             Vec<Sample>,
    catalog:             &Catalog,
    test_fraction:       f64,
    validation_fraction: f64,
    rng:                 &mut StdRng,
) -> PipelineResult<Partitions> {
    check_fraction("test_fraction", test_fraction)?;
    check_fraction("validation_fraction", validation_fraction)?;

    let mut pool = Vec::new();
    let mut test = Vec::new();

    for mut class_samples in group_by_class(samples, catalog)? {
        class_samples.shuffle(rng);
        let n      = class_samples.len();
        let n_test = stratified_test_count(n, test_fraction);
        let rest   = class_samples.split_off(n_test);
        test.extend(class_samples);
        pool.extend(rest);
    }

    let (train, validation) = split_train_val(pool, 1.0 - validation_fraction, rng);
    Ok(Partitions { train, validation, test })
}

fn stratified_test_count(n: usize, test_fraction: f64) -> usize {
    if n < 2 || test_fraction == 0.0 {
        return 0;
    }
    let wanted = (n as f64 * test_fraction).round() as usize;
    wanted.clamp(1, n - 1)
}

// ─── Strategy (b): fixed count per class ──────────────────────────────────────
pub fn split_fixed_count_per_class(
    samples:       Vec<Sample>,
    catalog:       &Catalog,
    per_class:     usize,
    test_fraction: f64,
    rng:           &mut StdRng,
) -> PipelineResult<Partitions> {
    check_fraction("test_fraction", test_fraction)?;

    let mut partitions = Partitions::default();

    for (class, mut class_samples) in catalog.classes().iter().zip(group_by_class(samples, catalog)?) {
        if class_samples.len() < per_class {
            return Err(PipelineError::ValidationOverdraw {
                class:     class.name.clone(),
                requested: per_class,
                available: class_samples.len(),
            });
        }

        class_samples.shuffle(rng);
        let mut rest = class_samples.split_off(per_class);
        partitions.validation.extend(class_samples);

        let n_test = ((rest.len() as f64) * test_fraction).ceil() as usize;
        let train  = rest.split_off(n_test.min(rest.len()));
        partitions.test.extend(rest);
        partitions.train.extend(train);

        tracing::debug!("Class '{}': {} validation samples drawn", class.name, per_class);
    }

    Ok(partitions)
}

// ─── Helpers ──────────────────────────────────────────────────────────────────
/// Bucket samples by class index, one bucket per catalog entry.
fn group_by_class(samples: Vec<Sample>, catalog: &Catalog) -> PipelineResult<Vec<Vec<Sample>>> {
    let mut buckets: Vec<Vec<Sample>> = vec![Vec::new(); catalog.len()];
    for sample in samples {
        let index = sample.class_index;
        let bucket = buckets.get_mut(index).ok_or_else(|| {
            PipelineError::invalid_config(
                Stage::Partitioning,
                format!("sample refers to class index {index}, catalog has {}", catalog.len()),
            )
        })?;
        bucket.push(sample);
    }
    Ok(buckets)
}

fn check_fraction(name: &str, value: f64) -> PipelineResult<()> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(PipelineError::invalid_config(
            Stage::Partitioning,
            format!("{name} must be in [0, 1), got {value}"),
        ))
    }
}
