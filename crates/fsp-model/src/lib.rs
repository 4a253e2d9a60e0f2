// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Binary on-time / delayed classifiers.
//!
//! The service layer only talks to the [`Classifier`] trait, so the real
//! tree ensemble ([`xgboost::XgbModel`]) and the placeholder
//! ([`RandomClassifier`]) are interchangeable.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use thiserror::Error;

pub mod xgboost;

pub use xgboost::XgbModel;

/// Probability above which a flight is reported as delayed.
pub const DELAY_THRESHOLD: f32 = 0.5;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid model file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported model: {0}")]
    Unsupported(String),
    #[error("Malformed tree {tree}: {reason}")]
    MalformedTree { tree: usize, reason: String },
    #[error("Feature count mismatch: model expects {expected}, got {actual}")]
    FeatureCount { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prediction {
    OnTime,
    Delayed,
}

impl Prediction {
    pub fn from_probability(p: f32) -> Self {
        if p > DELAY_THRESHOLD {
            Prediction::Delayed
        } else {
            Prediction::OnTime
        }
    }

    /// Class label as used by the training pipeline (0 = on time, 1 = delayed).
    pub fn label(self) -> u8 {
        match self {
            Prediction::OnTime => 0,
            Prediction::Delayed => 1,
        }
    }

    pub fn from_label(label: u8) -> Option<Self> {
        match label {
            0 => Some(Prediction::OnTime),
            1 => Some(Prediction::Delayed),
            _ => None,
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::OnTime => write!(f, "ON TIME"),
            Prediction::Delayed => write!(f, "DELAYED"),
        }
    }
}

pub trait Classifier: Send + Sync {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &str;

    /// Probability that the flight is delayed.
    fn predict_proba(&self, features: &[f32]) -> Result<f32, ModelError>;

    fn predict(&self, features: &[f32]) -> Result<Prediction, ModelError> {
        self.predict_proba(features).map(Prediction::from_probability)
    }

    /// Column names the model was trained on, when the artifact records them.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }
}

/// Coin-flip stand-in used when no model artifact is configured.
pub struct RandomClassifier {
    rng: Mutex<StdRng>,
}

impl Default for RandomClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomClassifier {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Classifier for RandomClassifier {
    fn name(&self) -> &str {
        "random-placeholder"
    }

    fn predict_proba(&self, _features: &[f32]) -> Result<f32, ModelError> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Ok(if rng.gen_bool(0.5) { 1.0 } else { 0.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(Prediction::from_probability(0.5), Prediction::OnTime);
        assert_eq!(Prediction::from_probability(0.51), Prediction::Delayed);
        assert_eq!(Prediction::from_probability(0.0), Prediction::OnTime);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Prediction::OnTime.label(), 0);
        assert_eq!(Prediction::Delayed.label(), 1);
        assert_eq!(Prediction::from_label(1), Some(Prediction::Delayed));
        assert_eq!(Prediction::from_label(2), None);
    }

    #[test]
    fn test_seeded_placeholder_is_reproducible() {
        let a = RandomClassifier::seeded(42);
        let b = RandomClassifier::seeded(42);
        let features = [2024.0, 5.0, 1.0];

        let run_a: Vec<_> = (0..32).map(|_| a.predict(&features).unwrap()).collect();
        let run_b: Vec<_> = (0..32).map(|_| b.predict(&features).unwrap()).collect();
        assert_eq!(run_a, run_b);

        // 32 fair coin flips landing all on one side would mean a broken rng
        assert!(run_a.contains(&Prediction::OnTime));
        assert!(run_a.contains(&Prediction::Delayed));
    }
}
