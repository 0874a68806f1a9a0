//! Interaction probability scorer.
//!
//! The predictive model is a logistic head over fixed-size hash feature
//! vectors: each molecular structure string is digested with SHA-256, the
//! digest is tiled to `FEATURE_DIM` bytes and scaled to [0, 1], and the
//! two sides are scored against separate weight halves. Weights are loaded
//! once at startup from a JSON artifact; a load failure leaves the service
//! in an explicit `Unavailable` state instead of crashing the process.

use std::path::Path;

use serde::Deserialize;
use sha2::{Digest, Sha256};

/// Per-side feature vector length.
pub const FEATURE_DIM: usize = 2048;

/// Errors a scorer can report at inference time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScorerError {
    /// The model artifact never loaded. Distinguishable by callers from
    /// any legitimate low-probability result.
    #[error("interaction model is not loaded")]
    ModelUnavailable,
}

/// Scores the interaction probability of a pair of molecular structures.
///
/// Deterministic for identical inputs; output in [0, 1], rounded to four
/// decimal digits.
pub trait InteractionScorer: Send + Sync {
    fn score(&self, repr_a: &str, repr_b: &str) -> Result<f64, ScorerError>;
}

/// Errors while loading the model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("cannot read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model artifact has {got} weights, expected {expected}")]
    Dimension { got: usize, expected: usize },
}

/// Logistic interaction model: `sigmoid(bias + w · [h(a), h(b)])`.
#[derive(Debug, Deserialize)]
pub struct LinearDdiModel {
    bias: f64,
    weights: Vec<f64>,
}

impl LinearDdiModel {
    pub fn from_file(path: &Path) -> Result<Self, ModelLoadError> {
        let raw = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&raw)?;
        if model.weights.len() != 2 * FEATURE_DIM {
            return Err(ModelLoadError::Dimension {
                got: model.weights.len(),
                expected: 2 * FEATURE_DIM,
            });
        }
        Ok(model)
    }

    #[cfg(test)]
    pub fn from_parts(bias: f64, weights: Vec<f64>) -> Self {
        Self { bias, weights }
    }
}

impl InteractionScorer for LinearDdiModel {
    fn score(&self, repr_a: &str, repr_b: &str) -> Result<f64, ScorerError> {
        let (weights_a, weights_b) = self.weights.split_at(FEATURE_DIM);
        let z = self.bias
            + dot(weights_a, &hash_features(repr_a))
            + dot(weights_b, &hash_features(repr_b));
        Ok(round4(sigmoid(z)))
    }
}

/// Startup-constructed model handle with an explicit unloaded state.
///
/// When the artifact fails to load the process keeps serving everything
/// except interaction scoring; `score` reports `ModelUnavailable`.
pub enum DdiModel {
    Loaded(LinearDdiModel),
    Unavailable,
}

impl DdiModel {
    /// Load the model artifact once, at process start. Never fails the
    /// caller — a broken or missing artifact degrades to `Unavailable`.
    pub fn load(path: &Path) -> Self {
        match LinearDdiModel::from_file(path) {
            Ok(model) => {
                tracing::info!(path = %path.display(), "Interaction model loaded");
                Self::Loaded(model)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Interaction model unavailable; interaction endpoints degraded"
                );
                Self::Unavailable
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

impl InteractionScorer for DdiModel {
    fn score(&self, repr_a: &str, repr_b: &str) -> Result<f64, ScorerError> {
        match self {
            Self::Loaded(model) => model.score(repr_a, repr_b),
            Self::Unavailable => Err(ScorerError::ModelUnavailable),
        }
    }
}

/// SHA-256 digest tiled to `FEATURE_DIM` bytes, scaled to [0, 1].
fn hash_features(text: &str) -> Vec<f64> {
    let digest = Sha256::digest(text.as_bytes());
    let mut features = Vec::with_capacity(FEATURE_DIM);
    'fill: loop {
        for byte in digest.iter() {
            if features.len() == FEATURE_DIM {
                break 'fill;
            }
            features.push(f64::from(*byte) / 255.0);
        }
    }
    features
}

fn dot(weights: &[f64], features: &[f64]) -> f64 {
    weights.iter().zip(features).map(|(w, x)| w * x).sum()
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Round to the four decimal digits the wire format carries.
pub fn round4(p: f64) -> f64 {
    (p * 10_000.0).round() / 10_000.0
}
