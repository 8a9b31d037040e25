// ============================================================
// Layer 3 — Windows, Feature Vectors and Samples
// ============================================================
// RawWindow     a borrowed slice of one class's signal column,
//               tagged with its class and relative position
// FeatureVector the fixed-width description of one window
// Sample        features + target + weight, the unit that gets
//               partitioned into train / validation / test
//
// Feature layout (25 values):
//   [0..6)   basic stats        mean, std, median, max, min, range
//   [6..11)  trend stats        diff mean, diff std, #up, #down, diff median
//   [11..15) higher-order stats variance, skewness, kurtosis, entropy
//   [15..24) segment stats      3 × (mean, std, median)
//   [24]     window position    start / column length

use serde::{Deserialize, Serialize};

/// Number of values computed from the window readings alone.
pub const SIGNAL_FEATURE_COUNT: usize = 24;

/// Full feature width, including the trailing position feature.
pub const FEATURE_COUNT: usize = SIGNAL_FEATURE_COUNT + 1;

/// Human-readable feature names, in output order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "mean", "std", "median", "max", "min", "range",
    "diff_mean", "diff_std", "diff_up_count", "diff_down_count", "diff_median",
    "variance", "skewness", "kurtosis", "entropy",
    "seg1_mean", "seg1_std", "seg1_median",
    "seg2_mean", "seg2_std", "seg2_median",
    "seg3_mean", "seg3_std", "seg3_median",
    "position",
];

// ─── RawWindow ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawWindow<'a> {
    pub values:      &'a [f64],
    pub class_index: usize,
    /// Index of the first reading within the source column
    pub start:       usize,
    /// `start / column_length`
    pub position:    f64,
}

impl<'a> RawWindow<'a> {
    /// Slice `column[start..start + window_size]`.
    /// Returns None when the window would run past the column end.
    pub fn from_column(
        column:      &'a [f64],
        class_index: usize,
        start:       usize,
        window_size: usize,
    ) -> Option<Self> {
        let end = start.checked_add(window_size)?;
        let values = column.get(start..end)?;
        Some(Self {
            values,
            class_index,
            start,
            position: start as f64 / column.len() as f64,
        })
    }
}

// ─── FeatureVector ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

// ─── Sample ───────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub features:     FeatureVector,
    /// Nominal volume of the source class
    pub target:       f64,
    /// Class weight, applied per sample in the loss
    pub weight:       f64,
    pub class_index:  usize,
    pub window_start: usize,
}

// ─── Partitions ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partitions {
    pub train:      Vec<Sample>,
    pub validation: Vec<Sample>,
    pub test:       Vec<Sample>,
}

impl Partitions {
    pub fn total(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }
}

/// Count samples per class index.
pub fn class_counts(samples: &[Sample], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for s in samples {
        if let Some(c) = counts.get_mut(s.class_index) {
            *c += 1;
        }
    }
    counts
}

// ─── SignalColumns ────────────────────────────────────────────────────────────
/// Named raw signal columns, one per volume class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalColumns {
    columns: Vec<(String, Vec<f64>)>,
}

impl SignalColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a column.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((name, values)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
