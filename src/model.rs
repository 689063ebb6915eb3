//! Multinomial logistic regression over the four iris measurements.
//!
//! The fitted parameters are stored as a JSON artifact:
//!
//! ```json
//! {
//!   "classes": ["setosa", "versicolor", "virginica"],
//!   "feature_names": ["sepal_length", "sepal_width", "petal_length", "petal_width"],
//!   "coefficients": [[..4..], [..4..], [..4..]],
//!   "intercepts": [b0, b1, b2],
//!   "training": { ... }
//! }
//! ```
//!
//! Class scores are `coefficients[k] . x + intercepts[k]`; probabilities are
//! their softmax.

use std::collections::BTreeMap;
use std::path::Path;

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::classifier::{Classifier, ModelInfo};
use crate::features::{FEATURE_NAMES, NUM_FEATURES};

/// Version prefix for model hashes. Bump when the artifact format changes.
const MODEL_HASH_VERSION: &str = "v1";

/// How the parameters were obtained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    #[serde(default)]
    pub dataset: String,
    #[serde(default)]
    pub train_samples: usize,
    #[serde(default)]
    pub test_samples: usize,
    #[serde(default)]
    pub test_accuracy: f64,
    /// Inverse L2 regularisation strength.
    #[serde(default)]
    pub l2_c: f64,
    #[serde(default)]
    pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub classes: Vec<String>,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<[f64; NUM_FEATURES]>,
    pub intercepts: Vec<f64>,
    #[serde(default)]
    pub training: TrainingSummary,
}

impl LogisticRegression {
    /// Read and shape-check an artifact.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read model file {:?}", path))?;
        let model: Self = serde_json::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse model file {:?}", path))?;
        model.check_shape()?;
        Ok(model)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, data)
            .wrap_err_with(|| format!("Failed to write model file {:?}", path))?;
        Ok(())
    }

    /// Every class needs one coefficient row and one intercept, and the
    /// feature list must match the input order.
    pub fn check_shape(&self) -> Result<()> {
        let k = self.classes.len();
        if k == 0 {
            eyre::bail!("Model has no classes");
        }
        if self.coefficients.len() != k || self.intercepts.len() != k {
            eyre::bail!(
                "Model shape mismatch: {} classes, {} coefficient rows, {} intercepts",
                k,
                self.coefficients.len(),
                self.intercepts.len()
            );
        }
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            eyre::bail!(
                "Model features {:?} do not match expected {:?}",
                self.feature_names,
                FEATURE_NAMES
            );
        }
        let finite = self
            .coefficients
            .iter()
            .flatten()
            .chain(&self.intercepts)
            .all(|v| v.is_finite());
        if !finite {
            eyre::bail!("Model parameters contain NaN or infinity");
        }
        Ok(())
    }

    /// Linear class scores (logits).
    pub fn decision_function(&self, x: &[f64; NUM_FEATURES]) -> Vec<f64> {
        self.coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(w, b)| w.iter().zip(x).map(|(wi, xi)| wi * xi).sum::<f64>() + b)
            .collect()
    }

    /// SHA-256 over the serialized parameters.
    pub fn hash(&self) -> String {
        let serialized =
            serde_json::to_vec(self).unwrap_or_else(|_| format!("{:?}", self).into_bytes());
        let mut hasher = Sha256::new();
        hasher.update(MODEL_HASH_VERSION.as_bytes());
        hasher.update(&serialized);
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }
}

/// Numerically stable softmax. Falls back to uniform when the scores do not
/// produce a usable normaliser.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let max_val = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exp_vals: Vec<f64> = scores.iter().map(|&x| (x - max_val).exp()).collect();
    let total: f64 = exp_vals.iter().sum();

    if total == 0.0 || !total.is_finite() {
        let n = scores.len().max(1) as f64;
        return vec![1.0 / n; scores.len()];
    }
    exp_vals.iter().map(|v| v / total).collect()
}

fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
}

impl Classifier for LogisticRegression {
    fn classes(&self) -> Vec<String> {
        self.classes.clone()
    }

    fn predict(&self, features: &[f64; NUM_FEATURES]) -> Result<usize> {
        argmax(&self.decision_function(features))
            .ok_or_else(|| eyre::eyre!("Model produced no class scores"))
    }

    fn predict_proba(&self, features: &[f64; NUM_FEATURES]) -> Result<Vec<f64>> {
        Ok(softmax(&self.decision_function(features)))
    }

    fn info(&self) -> ModelInfo {
        let t = &self.training;
        let total = t.train_samples + t.test_samples;
        let mut training_info = BTreeMap::new();
        if total > 0 {
            training_info.insert(
                "dataset".to_string(),
                format!("{} ({} samples)", t.dataset, total),
            );
            training_info.insert(
                "training_split".to_string(),
                format!(
                    "{:.0}% training, {:.0}% testing",
                    100.0 * t.train_samples as f64 / total as f64,
                    100.0 * t.test_samples as f64 / total as f64
                ),
            );
            training_info.insert(
                "performance".to_string(),
                format!("~{:.0}% accuracy on test data", t.test_accuracy * 100.0),
            );
        }
        training_info.insert(
            "algorithm".to_string(),
            format!("Logistic Regression with L2 regularization (C={})", t.l2_c),
        );
        training_info.insert(
            "features_used".to_string(),
            format!(
                "{} flower measurements (sepal & petal dimensions)",
                self.feature_names.len()
            ),
        );

        ModelInfo {
            model_type: "Logistic Regression".to_string(),
            problem_type: "Multi-class Classification".to_string(),
            features: self.feature_names.clone(),
            classes: self.classes.clone(),
            training_info,
        }
    }

    fn fingerprint(&self) -> Option<String> {
        Some(self.hash())
    }
}
