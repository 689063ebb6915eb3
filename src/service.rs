//! The prediction service: an explicitly constructed object that owns the
//! (optional) classifier and runs validate, infer, format for callers.
//!
//! There is no process-global model. A service built with
//! [`IrisService::unloaded`] answers every prediction with
//! [`PredictionError::ServiceUnavailable`].

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::batch::{self, BatchResult};
use crate::classifier::{Classifier, ClassifierAdapter, ModelInfo};
use crate::error::PredictionError;
use crate::features::{FeatureVector, FlowerMeasurements};
use crate::model::LogisticRegression;
use crate::prediction::{format_prediction, PredictionResult};

#[derive(Debug, Clone)]
pub struct IrisService {
    adapter: Option<ClassifierAdapter>,
    model_hash: Option<String>,
}

impl IrisService {
    /// A service with no model attached.
    pub fn unloaded() -> Self {
        Self {
            adapter: None,
            model_hash: None,
        }
    }

    /// Attach any classifier whose labels are in canonical order.
    pub fn with_classifier(model: Arc<dyn Classifier>) -> eyre::Result<Self> {
        let model_hash = model.fingerprint();
        let adapter = ClassifierAdapter::new(model)?;
        Ok(Self {
            adapter: Some(adapter),
            model_hash,
        })
    }

    pub fn from_model(model: LogisticRegression) -> eyre::Result<Self> {
        Self::with_classifier(Arc::new(model))
    }

    /// Load a logistic regression artifact from disk.
    pub fn load(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let model = LogisticRegression::load(path)?;
        let service = Self::from_model(model)?;
        info!(
            path = %path.display(),
            model_hash = service.model_hash.as_deref().unwrap_or("none"),
            "model loaded"
        );
        Ok(service)
    }

    pub fn is_loaded(&self) -> bool {
        self.adapter.is_some()
    }

    pub fn model_hash(&self) -> Option<&str> {
        self.model_hash.as_deref()
    }

    fn adapter(&self) -> Result<&ClassifierAdapter, PredictionError> {
        self.adapter
            .as_ref()
            .ok_or(PredictionError::ServiceUnavailable)
    }

    /// Validate, classify and format one flower.
    pub fn predict(
        &self,
        measurements: &FlowerMeasurements,
    ) -> Result<PredictionResult, PredictionError> {
        let adapter = self.adapter()?;
        let features = measurements.validate()?;
        Self::classify(adapter, &features)
    }

    /// Classify an already validated vector.
    pub fn predict_features(
        &self,
        features: &FeatureVector,
    ) -> Result<PredictionResult, PredictionError> {
        Self::classify(self.adapter()?, features)
    }

    /// All-or-nothing batch classification.
    pub fn predict_batch(
        &self,
        flowers: &[FlowerMeasurements],
    ) -> Result<BatchResult, PredictionError> {
        batch::predict_batch(self.adapter()?, flowers)
    }

    pub fn model_info(&self) -> Result<ModelInfo, PredictionError> {
        Ok(self.adapter()?.model().info())
    }

    fn classify(
        adapter: &ClassifierAdapter,
        features: &FeatureVector,
    ) -> Result<PredictionResult, PredictionError> {
        let output = adapter.infer(features)?;
        let result = format_prediction(&output);
        debug!(
            species = %result.species,
            confidence = result.confidence,
            tier = result.tier().as_str(),
            "prediction"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::NUM_FEATURES;
    use crate::species::{Species, CLASS_NAMES};

    struct Uniform;

    impl Classifier for Uniform {
        fn classes(&self) -> Vec<String> {
            CLASS_NAMES.iter().map(|s| s.to_string()).collect()
        }
        fn predict(&self, _: &[f64; NUM_FEATURES]) -> eyre::Result<usize> {
            Ok(0)
        }
        fn predict_proba(&self, _: &[f64; NUM_FEATURES]) -> eyre::Result<Vec<f64>> {
            Ok(vec![1.0 / 3.0; 3])
        }
    }

    #[test]
    fn test_unloaded_service_is_unavailable() {
        let service = IrisService::unloaded();
        assert!(!service.is_loaded());
        let flower = FlowerMeasurements::from_values(5.1, 3.5, 1.4, 0.2);
        assert_eq!(
            service.predict(&flower).unwrap_err(),
            PredictionError::ServiceUnavailable
        );
        assert_eq!(
            service.model_info().unwrap_err(),
            PredictionError::ServiceUnavailable
        );
    }

    #[test]
    fn test_unloaded_checked_before_validation() {
        let service = IrisService::unloaded();
        let bad = FlowerMeasurements::from_values(-1.0, 3.5, 1.4, 0.2);
        assert_eq!(
            service.predict(&bad).unwrap_err(),
            PredictionError::ServiceUnavailable
        );
        assert_eq!(
            service.predict_batch(&[]).unwrap_err(),
            PredictionError::ServiceUnavailable
        );
    }

    #[test]
    fn test_uniform_classifier_is_uncertain() {
        let service = IrisService::with_classifier(Arc::new(Uniform)).unwrap();
        let result = service
            .predict(&FlowerMeasurements::from_values(5.8, 3.0, 4.0, 1.2))
            .unwrap();
        assert_eq!(result.species, Species::Setosa);
        assert_eq!(result.confidence_percentage, "33.3%");
        assert!(result.interpretation.starts_with("Uncertain prediction"));
        assert_eq!(service.model_hash(), None);
    }

    #[test]
    fn test_validation_error_from_loaded_service() {
        let service = IrisService::with_classifier(Arc::new(Uniform)).unwrap();
        let err = service
            .predict(&FlowerMeasurements::from_values(5.1, 3.5, 1.4, 11.0))
            .unwrap_err();
        assert_eq!(err.field(), Some("petal_width"));
    }

    #[test]
    fn test_load_from_disk() {
        let (model, _) =
            crate::training::train_reference_model(&crate::training::TrainingConfig {
                max_iterations: 200,
                ..Default::default()
            })
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("iris_model.json");
        model.save(&path).unwrap();

        let service = IrisService::load(&path).unwrap();
        assert!(service.is_loaded());
        assert_eq!(service.model_hash(), Some(model.hash().as_str()));
        let result = service
            .predict_features(&Species::Setosa.example())
            .unwrap();
        assert_eq!(result.species, Species::Setosa);
        assert_eq!(service.model_info().unwrap().model_type, "Logistic Regression");
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(IrisService::load("/nonexistent/iris_model.json").is_err());
    }
}
