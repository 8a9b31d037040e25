// ============================================================
// Layer 3 — Pipeline Errors
// ============================================================
// Every fatal error names the pipeline stage that produced it
// and, where one is involved, the offending volume class.
// Application code wraps these in anyhow::Error with `?`, so
// the stage-tagged message is what the user finally sees.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The pipeline stage an error originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Loading,
    Featurization,
    Partitioning,
    Normalization,
    Training,
    Evaluation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Loading       => "loading",
            Stage::Featurization => "featurization",
            Stage::Partitioning  => "partitioning",
            Stage::Normalization => "normalization",
            Stage::Training      => "training",
            Stage::Evaluation    => "evaluation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("loading: class '{class}' has no column in the signal source")]
    MissingColumn { class: String },

    #[error("featurization: window has {len} readings, at least {min} are required")]
    WindowTooShort { len: usize, min: usize },

    #[error("featurization: window contains a non-finite reading at index {index}")]
    NonFiniteReading { index: usize },

    #[error(
        "featurization: class '{class}' column has {len} readings, \
         fewer than the window size {window_size}"
    )]
    ColumnTooShort { class: String, len: usize, window_size: usize },

    #[error("{stage}: invalid configuration: {reason}")]
    InvalidConfig { stage: Stage, reason: String },

    #[error(
        "partitioning: class '{class}' has {available} samples, \
         cannot draw {requested} for validation"
    )]
    ValidationOverdraw { class: String, requested: usize, available: usize },

    #[error("normalization: cannot fit the {what} scaler on empty data")]
    EmptyFit { what: &'static str },

    #[error("{stage}: expected {expected} features, got {actual}")]
    ShapeMismatch { stage: Stage, expected: usize, actual: usize },

    #[error("training: {reason}")]
    Model { reason: String },

    #[error("evaluation: {true_len} true values but {predicted_len} predictions")]
    LengthMismatch { true_len: usize, predicted_len: usize },
}

impl PipelineError {
    pub fn invalid_config(stage: Stage, reason: impl Into<String>) -> Self {
        PipelineError::InvalidConfig { stage, reason: reason.into() }
    }

    pub fn model(reason: impl Into<String>) -> Self {
        PipelineError::Model { reason: reason.into() }
    }

    /// The stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::MissingColumn { .. } => Stage::Loading,
            PipelineError::WindowTooShort { .. }
            | PipelineError::NonFiniteReading { .. }
            | PipelineError::ColumnTooShort { .. } => Stage::Featurization,
            PipelineError::InvalidConfig { stage, .. }
            | PipelineError::ShapeMismatch { stage, .. } => *stage,
            PipelineError::ValidationOverdraw { .. } => Stage::Partitioning,
            PipelineError::EmptyFit { .. } => Stage::Normalization,
            PipelineError::Model { .. } => Stage::Training,
            PipelineError::LengthMismatch { .. } => Stage::Evaluation,
        }
    }

    /// The volume class involved, if the error is about one.
    pub fn class(&self) -> Option<&str> {
        match self {
            PipelineError::MissingColumn { class }
            | PipelineError::ColumnTooShort { class, .. }
            | PipelineError::ValidationOverdraw { class, .. } => Some(class),
            _ => None,
        }
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
