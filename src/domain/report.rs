// ============================================================
// Layer 3 — Evaluation Report
// ============================================================
// Per-class regression metrics over the points whose true
// value fell inside that class's tolerance band. A class with
// no in-band points has no entry at all.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

/// Metrics for one tolerance band.
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
pub struct ClassMetrics {
    pub mse:          f64,
    pub rmse:         f64,
    pub mae:          f64,
    /// None when an in-band true value is exactly zero
    pub mape:         Option<f64>,
    pub sample_count: usize,
}

/// Class name → metrics, in catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationReport {
    entries: Vec<(String, ClassMetrics)>,
}

impl EvaluationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class: impl Into<String>, metrics: ClassMetrics) {
        self.entries.push((class.into(), metrics));
    }

    #[cfg(test)]
    pub fn get(&self, class: &str) -> Option<&ClassMetrics> {
        self.entries
            .iter()
            .find(|(name, _)| name == class)
            .map(|(_, m)| m)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClassMetrics)> {
        self.entries.iter().map(|(name, m)| (name.as_str(), m))
    }
}

// Serialised as a JSON object keyed by class name, keeping catalog order.
impl Serialize for EvaluationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, metrics) in &self.entries {
            map.serialize_entry(name, metrics)?;
        }
        map.end()
    }
}
