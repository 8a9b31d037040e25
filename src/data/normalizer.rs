// ============================================================
// Layer 4 — Feature / Target Normalizer
// ============================================================
// Min-max scaling fit on the training partition only:
//
//   scaled = (x - min) / (max - min)
//   x      = min + scaled * (max - min)
//
// Features and targets get independent scalers. Both live in a
// NormalizationState value that `fit` returns; every later
// transform / inverse_transform takes that value explicitly,
// and nothing mutates it after fitting.
//
// A dimension whose training min equals its max maps to 0.0.

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult, Stage};
use crate::domain::sample::{FeatureVector, Sample};

/// Ranges narrower than this are treated as constant.
const MIN_RANGE: f64 = 1e-12;

// ─── MinMaxScaler ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl MinMaxScaler {
    /// Learn per-dimension min / max. All rows must share one width.
    pub fn fit<'a, I>(rows: I, what: &'static str) -> PipelineResult<Self>
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        let mut rows = rows.into_iter();
        let first = rows.next().ok_or(PipelineError::EmptyFit { what })?;
        let mut min = first.to_vec();
        let mut max = first.to_vec();

        for row in rows {
            if row.len() != min.len() {
                return Err(PipelineError::ShapeMismatch {
                    stage:    Stage::Normalization,
                    expected: min.len(),
                    actual:   row.len(),
                });
            }
            for (j, &v) in row.iter().enumerate() {
                min[j] = min[j].min(v);
                max[j] = max[j].max(v);
            }
        }

        Ok(Self { min, max })
    }

    pub fn width(&self) -> usize {
        self.min.len()
    }

    pub fn transform_row(&self, row: &[f64]) -> PipelineResult<Vec<f64>> {
        if row.len() != self.width() {
            return Err(PipelineError::ShapeMismatch {
                stage:    Stage::Normalization,
                expected: self.width(),
                actual:   row.len(),
            });
        }
        Ok(row.iter().enumerate().map(|(j, &x)| self.scale(j, x)).collect())
    }

    fn scale(&self, j: usize, x: f64) -> f64 {
        let range = self.max[j] - self.min[j];
        if range <= MIN_RANGE {
            0.0
        } else {
            (x - self.min[j]) / range
        }
    }

    fn unscale(&self, j: usize, s: f64) -> f64 {
        self.min[j] + s * (self.max[j] - self.min[j])
    }
}

// ─── ScaledSet ────────────────────────────────────────────────────────────────
/// Normalised rows ready for a regressor. Weights are not scaled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScaledSet {
    pub features: Vec<Vec<f64>>,
    pub targets:  Vec<f64>,
    pub weights:  Vec<f64>,
}

impl ScaledSet {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

// ─── NormalizationState ───────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationState {
    features: MinMaxScaler,
    target:   MinMaxScaler,
}

impl NormalizationState {
    /// Fit both scalers on the training partition.
    pub fn fit(train: &[Sample]) -> PipelineResult<Self> {
        let features = MinMaxScaler::fit(train.iter().map(|s| s.features.as_slice()), "feature")?;
        let target   = MinMaxScaler::fit(train.iter().map(|s| std::slice::from_ref(&s.target)), "target")?;

        tracing::debug!(
            "Fitted scalers on {} samples: target range [{:.3}, {:.3}]",
            train.len(),
            target.min[0],
            target.max[0],
        );
        Ok(Self { features, target })
    }

    pub fn transform_features(&self, features: &FeatureVector) -> PipelineResult<Vec<f64>> {
        self.features.transform_row(features.as_slice())
    }

    pub fn transform_target(&self, target: f64) -> f64 {
        self.target.scale(0, target)
    }

    /// Map scaled predictions back to physical volume units.
    pub fn inverse_transform_targets(&self, scaled: &[f64]) -> Vec<f64> {
        scaled.iter().map(|&s| self.target.unscale(0, s)).collect()
    }

    /// Scale a whole partition, carrying weights through unchanged.
    pub fn scale_samples(&self, samples: &[Sample]) -> PipelineResult<ScaledSet> {
        let mut set = ScaledSet {
            features: Vec::with_capacity(samples.len()),
            targets:  Vec::with_capacity(samples.len()),
            weights:  Vec::with_capacity(samples.len()),
        };
        for s in samples {
            set.features.push(self.transform_features(&s.features)?);
            set.targets.push(self.transform_target(s.target));
            set.weights.push(s.weight);
        }
        Ok(set)
    }
}
