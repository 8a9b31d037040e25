// ============================================================
// Layer 4 — Dataset Builder
// ============================================================
// For every catalog class, in catalog order:
//   1. look up the class's column in the signal source
//   2. slide the class-specific stride window over it
//   3. featurize each window (position appended)
//   4. emit a Sample tagged with the class target and weight
// then hand the corpus to the configured partition strategy.
//
// A class whose column is missing, or too short to hold one
// window, stops the build with an error naming the class.
//
// ScaledDataset is the burn-facing view of a normalised
// partition, consumed by the DataLoader in the trainer.

use burn::data::dataset::Dataset;

use crate::data::featurizer::Featurizer;
use crate::data::normalizer::ScaledSet;
use crate::data::splitter::{partition, PartitionConfig};
use crate::data::windower::{StridePolicy, Windower};
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::sample::{Partitions, Sample, SignalColumns};
use crate::domain::volume_class::Catalog;

pub struct DatasetBuilder {
    windower:   Windower,
    featurizer: Featurizer,
}

impl DatasetBuilder {
    pub fn new(window_size: usize, stride_policy: StridePolicy) -> PipelineResult<Self> {
        Ok(Self {
            windower:   Windower::new(window_size, stride_policy)?,
            featurizer: Featurizer::new(),
        })
    }

    /// Window and featurize every catalog class into one corpus.
    pub fn build_corpus(
        &self,
        catalog: &Catalog,
        columns: &SignalColumns,
    ) -> PipelineResult<Vec<Sample>> {
        let mut corpus = Vec::new();

        for (class_index, class) in catalog.classes().iter().enumerate() {
            let column = columns
                .get(&class.name)
                .ok_or_else(|| PipelineError::MissingColumn { class: class.name.clone() })?;

            let stride  = self.windower.stride_for(class);
            let windows = self.windower.windows(column, class_index, class);
            if windows.is_empty() {
                return Err(PipelineError::ColumnTooShort {
                    class:       class.name.clone(),
                    len:         column.len(),
                    window_size: self.windower.window_size(),
                });
            }

            corpus.reserve(self.windower.num_windows(column.len(), stride));
            for window in &windows {
                corpus.push(Sample {
                    features:     self.featurizer.featurize(window)?,
                    target:       class.nominal_volume,
                    weight:       class.weight,
                    class_index,
                    window_start: window.start,
                });
            }

            tracing::debug!(
                "Class '{}': {} readings → {} windows (stride {})",
                class.name,
                column.len(),
                windows.len(),
                stride,
            );
        }

        tracing::info!("Built {} samples from {} classes", corpus.len(), catalog.len());
        Ok(corpus)
    }

    /// Build the corpus and partition it.
    pub fn build(
        &self,
        catalog: &Catalog,
        columns: &SignalColumns,
        config:  &PartitionConfig,
    ) -> PipelineResult<Partitions> {
        let corpus = self.build_corpus(catalog, columns)?;
        partition(corpus, catalog, config)
    }
}

// ─── Burn Dataset ─────────────────────────────────────────────────────────────
/// One normalised training row, in tensor precision.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledRow {
    pub features: Vec<f32>,
    pub target:   f32,
    pub weight:   f32,
}

pub struct ScaledDataset {
    rows: Vec<ScaledRow>,
}

impl ScaledDataset {
    pub fn new(set: &ScaledSet) -> Self {
        let rows = set
            .features
            .iter()
            .zip(&set.targets)
            .zip(&set.weights)
            .map(|((features, &target), &weight)| ScaledRow {
                features: features.iter().map(|&v| v as f32).collect(),
                target:   target as f32,
                weight:   weight as f32,
            })
            .collect();
        Self { rows }
    }
}

impl Dataset<ScaledRow> for ScaledDataset {
    fn get(&self, index: usize) -> Option<ScaledRow> {
        self.rows.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::splitter::PartitionStrategy;
    use crate::domain::sample::FEATURE_COUNT;
    use crate::domain::volume_class::{TolerancePolicy, VolumeClass};

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    fn single_class_catalog() -> Catalog {
        Catalog::new(vec![VolumeClass::new("70ml", 70.0, 2.0, &TolerancePolicy::default())]).unwrap()
    }

    #[test]
    fn test_linear_column_produces_171_tagged_samples() {
        let catalog = single_class_catalog();
        let mut columns = SignalColumns::new();
        columns.insert("70ml", ramp(200));

        let builder = DatasetBuilder::new(30, StridePolicy::default()).unwrap();
        let corpus = builder.build_corpus(&catalog, &columns).unwrap();

        assert_eq!(corpus.len(), 171);
        assert!(corpus.iter().all(|s| s.target == 70.0 && s.weight == 2.0));
        assert!(corpus.iter().all(|s| s.features.as_slice().len() == FEATURE_COUNT));
        // position feature of the last window: 170 / 200
        assert_eq!(corpus[170].features.as_slice()[24], 0.85);
    }

    #[test]
    fn test_every_sample_carries_its_class_target_and_weight() {
        let catalog = Catalog::default();
        let mut columns = SignalColumns::new();
        for (i, name) in catalog.names().enumerate() {
            columns.insert(name, ramp(120 + i * 10));
        }
        let builder = DatasetBuilder::new(40, StridePolicy::default()).unwrap();
        let corpus = builder.build_corpus(&catalog, &columns).unwrap();

        for s in &corpus {
            let class = &catalog.classes()[s.class_index];
            assert_eq!(s.target, class.nominal_volume);
            assert_eq!(s.weight, class.weight);
        }
    }

    #[test]
    fn test_short_column_is_a_configuration_error() {
        let catalog = single_class_catalog();
        let mut columns = SignalColumns::new();
        columns.insert("70ml", ramp(25));
        let builder = DatasetBuilder::new(30, StridePolicy::default()).unwrap();
        let err = builder.build_corpus(&catalog, &columns).unwrap_err();
        assert_eq!(
            err,
            PipelineError::ColumnTooShort { class: "70ml".into(), len: 25, window_size: 30 }
        );
    }

    #[test]
    fn test_missing_column_names_class() {
        let catalog = single_class_catalog();
        let builder = DatasetBuilder::new(30, StridePolicy::default()).unwrap();
        let err = builder.build_corpus(&catalog, &SignalColumns::new()).unwrap_err();
        assert_eq!(err.class(), Some("70ml"));
    }

    #[test]
    fn test_build_partitions_fixed_count() {
        let catalog = Catalog::default();
        let mut columns = SignalColumns::new();
        for name in catalog.names() {
            columns.insert(name, ramp(300));
        }
        let builder = DatasetBuilder::new(30, StridePolicy::default()).unwrap();
        let config = PartitionConfig {
            strategy:      PartitionStrategy::FixedCountPerClass { per_class: 15 },
            test_fraction: 0.25,
            seed:          9,
        };
        let partitions = builder.build(&catalog, &columns, &config).unwrap();
        assert_eq!(partitions.validation.len(), 15 * catalog.len());
        // small classes: 271 windows each, large: 91 each
        assert_eq!(partitions.total(), 2 * 271 + 3 * 91);
    }

    #[test]
    fn test_scaled_dataset_indexing() {
        let set = ScaledSet {
            features: vec![vec![0.0, 1.0], vec![0.5, 0.5]],
            targets:  vec![0.1, 0.9],
            weights:  vec![2.0, 1.0],
        };
        let ds = ScaledDataset::new(&set);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.get(1).map(|r| r.weight), Some(1.0));
        assert!(ds.get(2).is_none());
    }
}
