//! The seam between the service and a pre-trained model.
//!
//! Any model implementing [`Classifier`] can be attached. The
//! [`ClassifierAdapter`] checks, once when a model is attached, that its class
//! labels are in the fixed [`CLASS_NAMES`] order, and checks every inference
//! result against the output contract before it reaches the formatter.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::PredictionError;
use crate::features::{FeatureVector, FEATURE_NAMES, NUM_FEATURES};
use crate::species::{Species, CLASS_NAMES, NUM_CLASSES};

/// Allowed deviation of the probability sum from 1.0.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// A pre-fitted classifier over the four iris measurements.
///
/// Implementations must be immutable after construction; the service shares a
/// single instance across all request handlers.
pub trait Classifier: Send + Sync {
    /// Class labels in the order the model's indices refer to.
    fn classes(&self) -> Vec<String>;

    /// Predicted class index.
    fn predict(&self, features: &[f64; NUM_FEATURES]) -> eyre::Result<usize>;

    /// Probability per class, aligned with [`Classifier::classes`].
    fn predict_proba(&self, features: &[f64; NUM_FEATURES]) -> eyre::Result<Vec<f64>>;

    /// Descriptive metadata served by the model-info endpoint.
    fn info(&self) -> ModelInfo {
        ModelInfo {
            model_type: "External classifier".to_string(),
            problem_type: "Multi-class Classification".to_string(),
            features: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            classes: self.classes(),
            training_info: BTreeMap::new(),
        }
    }

    /// Content hash of the model parameters, if the model has one.
    fn fingerprint(&self) -> Option<String> {
        None
    }
}

/// Information about the machine learning model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub problem_type: String,
    pub features: Vec<String>,
    pub classes: Vec<String>,
    pub training_info: BTreeMap<String, String>,
}

/// Contract-checked classifier output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierOutput {
    pub species: Species,
    pub probabilities: [f64; NUM_CLASSES],
}

impl ClassifierOutput {
    /// Build from a raw class index and probability slice, enforcing the
    /// output contract.
    pub fn new(class_index: usize, probabilities: &[f64]) -> Result<Self, PredictionError> {
        let species = Species::from_index(class_index).ok_or_else(|| {
            PredictionError::Inference(format!(
                "class index {} outside 0..{}",
                class_index, NUM_CLASSES
            ))
        })?;

        let probabilities: [f64; NUM_CLASSES] = probabilities.try_into().map_err(|_| {
            PredictionError::Inference(format!(
                "expected {} probabilities, got {}",
                NUM_CLASSES,
                probabilities.len()
            ))
        })?;

        if let Some(p) = probabilities.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(PredictionError::Inference(format!(
                "invalid probability {}",
                p
            )));
        }
        let total: f64 = probabilities.iter().sum();
        if (total - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(PredictionError::Inference(format!(
                "probabilities sum to {}, expected 1.0",
                total
            )));
        }

        Ok(Self {
            species,
            probabilities,
        })
    }

    pub fn class_index(&self) -> usize {
        self.species.index()
    }

    /// Probability mass on the predicted label.
    pub fn confidence(&self) -> f64 {
        self.probabilities[self.class_index()]
    }
}

/// Shared handle to an attached model whose label order has been verified.
#[derive(Clone)]
pub struct ClassifierAdapter {
    model: Arc<dyn Classifier>,
}

impl std::fmt::Debug for ClassifierAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierAdapter")
            .field("classes", &self.model.classes())
            .finish()
    }
}

impl ClassifierAdapter {
    /// Attach a model. Fails if its labels are not exactly
    /// `["setosa", "versicolor", "virginica"]` in that order.
    pub fn new(model: Arc<dyn Classifier>) -> eyre::Result<Self> {
        let classes = model.classes();
        if classes.len() != NUM_CLASSES
            || classes.iter().zip(CLASS_NAMES).any(|(got, want)| got != want)
        {
            eyre::bail!(
                "Model label order {:?} does not match expected {:?}",
                classes,
                CLASS_NAMES
            );
        }
        Ok(Self { model })
    }

    pub fn model(&self) -> &Arc<dyn Classifier> {
        &self.model
    }

    /// Run the model on one validated vector.
    pub fn infer(&self, features: &FeatureVector) -> Result<ClassifierOutput, PredictionError> {
        let input = features.to_array();
        let class_index = self
            .model
            .predict(&input)
            .map_err(|e| PredictionError::Inference(e.to_string()))?;
        let probabilities = self
            .model
            .predict_proba(&input)
            .map_err(|e| PredictionError::Inference(e.to_string()))?;

        let output = ClassifierOutput::new(class_index, &probabilities)?;
        tracing::debug!(
            input = ?input,
            probabilities = ?output.probabilities,
            species = %output.species,
            confidence = output.confidence(),
            "classifier output"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        classes: Vec<String>,
        index: usize,
        probs: Vec<f64>,
    }

    impl Fixed {
        fn new(index: usize, probs: Vec<f64>) -> Self {
            Self {
                classes: CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
                index,
                probs,
            }
        }
    }

    impl Classifier for Fixed {
        fn classes(&self) -> Vec<String> {
            self.classes.clone()
        }
        fn predict(&self, _: &[f64; NUM_FEATURES]) -> eyre::Result<usize> {
            Ok(self.index)
        }
        fn predict_proba(&self, _: &[f64; NUM_FEATURES]) -> eyre::Result<Vec<f64>> {
            Ok(self.probs.clone())
        }
    }

    fn sample() -> FeatureVector {
        FeatureVector::new(5.1, 3.5, 1.4, 0.2).unwrap()
    }

    #[test]
    fn test_adapter_passes_valid_output() {
        let adapter = ClassifierAdapter::new(Arc::new(Fixed::new(1, vec![0.02, 0.75, 0.23]))).unwrap();
        let out = adapter.infer(&sample()).unwrap();
        assert_eq!(out.species, Species::Versicolor);
        assert_eq!(out.confidence(), 0.75);
    }

    #[test]
    fn test_adapter_rejects_reordered_labels() {
        let mut model = Fixed::new(0, vec![1.0, 0.0, 0.0]);
        model.classes = vec!["versicolor".into(), "setosa".into(), "virginica".into()];
        let err = ClassifierAdapter::new(Arc::new(model)).unwrap_err();
        assert!(err.to_string().contains("label order"));
    }

    #[test]
    fn test_adapter_rejects_extra_labels() {
        let mut model = Fixed::new(0, vec![1.0, 0.0, 0.0]);
        model.classes.push("rose".into());
        assert!(ClassifierAdapter::new(Arc::new(model)).is_err());
    }

    #[test]
    fn test_out_of_range_index_is_inference_error() {
        let adapter = ClassifierAdapter::new(Arc::new(Fixed::new(3, vec![0.2, 0.3, 0.5]))).unwrap();
        let err = adapter.infer(&sample()).unwrap_err();
        assert!(matches!(err, PredictionError::Inference(_)));
    }

    #[test]
    fn test_wrong_probability_length_is_inference_error() {
        let adapter = ClassifierAdapter::new(Arc::new(Fixed::new(0, vec![0.5, 0.5]))).unwrap();
        let err = adapter.infer(&sample()).unwrap_err();
        assert!(err.to_string().contains("expected 3 probabilities"));
    }

    #[test]
    fn test_unnormalized_probabilities_rejected() {
        assert!(ClassifierOutput::new(0, &[0.5, 0.5, 0.5]).is_err());
        assert!(ClassifierOutput::new(0, &[1.2, -0.1, -0.1]).is_err());
        assert!(ClassifierOutput::new(0, &[f64::NAN, 0.5, 0.5]).is_err());
    }

    #[test]
    fn test_model_error_is_wrapped() {
        struct Broken;
        impl Classifier for Broken {
            fn classes(&self) -> Vec<String> {
                CLASS_NAMES.iter().map(|s| s.to_string()).collect()
            }
            fn predict(&self, _: &[f64; NUM_FEATURES]) -> eyre::Result<usize> {
                eyre::bail!("shape mismatch")
            }
            fn predict_proba(&self, _: &[f64; NUM_FEATURES]) -> eyre::Result<Vec<f64>> {
                unreachable!()
            }
        }
        let adapter = ClassifierAdapter::new(Arc::new(Broken)).unwrap();
        let err = adapter.infer(&sample()).unwrap_err();
        assert_eq!(err, PredictionError::Inference("shape mismatch".into()));
    }

    #[test]
    fn test_default_info_lists_features() {
        let info = Fixed::new(0, vec![1.0, 0.0, 0.0]).info();
        assert_eq!(info.features, FEATURE_NAMES);
        assert_eq!(info.classes, CLASS_NAMES);
    }
}
