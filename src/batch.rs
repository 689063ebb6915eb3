//! Batch prediction: the single-item pipeline applied across an ordered list,
//! with a per-species summary.
//!
//! A batch is all-or-nothing. The first item that fails validation or
//! inference aborts the batch and only that error is returned.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classifier::ClassifierAdapter;
use crate::error::PredictionError;
use crate::features::FlowerMeasurements;
use crate::prediction::{format_prediction, PredictionResult};
use crate::species::Species;

/// Number of predictions per species.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesCounts {
    pub setosa: usize,
    pub versicolor: usize,
    pub virginica: usize,
}

impl SpeciesCounts {
    pub fn increment(&mut self, species: Species) {
        match species {
            Species::Setosa => self.setosa += 1,
            Species::Versicolor => self.versicolor += 1,
            Species::Virginica => self.virginica += 1,
        }
    }

    pub fn get(&self, species: Species) -> usize {
        match species {
            Species::Setosa => self.setosa,
            Species::Versicolor => self.versicolor,
            Species::Virginica => self.virginica,
        }
    }

    pub fn total(&self) -> usize {
        self.setosa + self.versicolor + self.virginica
    }
}

/// Request body for batch prediction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchRequest {
    pub flowers: Vec<FlowerMeasurements>,
}

/// Predictions in input order plus the per-species summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub predictions: Vec<PredictionResult>,
    pub summary: SpeciesCounts,
}

impl BatchResult {
    fn from_predictions(predictions: Vec<PredictionResult>) -> Self {
        let mut summary = SpeciesCounts::default();
        for p in &predictions {
            summary.increment(p.species);
        }
        Self {
            predictions,
            summary,
        }
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

/// Classify every flower in order. Stops at the first failure.
pub fn predict_batch(
    adapter: &ClassifierAdapter,
    flowers: &[FlowerMeasurements],
) -> Result<BatchResult, PredictionError> {
    let predictions = flowers
        .iter()
        .enumerate()
        .map(|(i, flower)| {
            classify_one(adapter, flower).inspect_err(|e| {
                warn!(item = i, batch_size = flowers.len(), error = %e, "batch aborted");
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let result = BatchResult::from_predictions(predictions);
    info!(
        batch_size = result.len(),
        setosa = result.summary.setosa,
        versicolor = result.summary.versicolor,
        virginica = result.summary.virginica,
        "batch classified"
    );
    Ok(result)
}

fn classify_one(
    adapter: &ClassifierAdapter,
    flower: &FlowerMeasurements,
) -> Result<PredictionResult, PredictionError> {
    let features = flower.validate()?;
    let output = adapter.infer(&features)?;
    let result = format_prediction(&output);
    debug!(species = %result.species, confidence = result.confidence, "classified");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use crate::features::NUM_FEATURES;
    use crate::species::CLASS_NAMES;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Petal-length threshold stub that counts calls.
    #[derive(Default)]
    struct PetalRule {
        calls: AtomicUsize,
    }

    impl PetalRule {
        fn probs(x: &[f64; NUM_FEATURES]) -> Vec<f64> {
            if x[2] < 2.5 {
                vec![0.97, 0.02, 0.01]
            } else if x[2] < 4.9 {
                vec![0.02, 0.75, 0.23]
            } else {
                vec![0.01, 0.44, 0.55]
            }
        }
    }

    impl Classifier for PetalRule {
        fn classes(&self) -> Vec<String> {
            CLASS_NAMES.iter().map(|s| s.to_string()).collect()
        }
        fn predict(&self, x: &[f64; NUM_FEATURES]) -> eyre::Result<usize> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            let p = Self::probs(x);
            Ok((0..3).max_by(|&a, &b| p[a].total_cmp(&p[b])).unwrap_or(0))
        }
        fn predict_proba(&self, x: &[f64; NUM_FEATURES]) -> eyre::Result<Vec<f64>> {
            Ok(Self::probs(x))
        }
    }

    fn adapter() -> (ClassifierAdapter, Arc<PetalRule>) {
        let model = Arc::new(PetalRule::default());
        (ClassifierAdapter::new(model.clone()).unwrap(), model)
    }

    fn flowers() -> Vec<FlowerMeasurements> {
        vec![
            FlowerMeasurements::from_values(5.1, 3.5, 1.4, 0.2),
            FlowerMeasurements::from_values(6.2, 2.9, 4.3, 1.3),
            FlowerMeasurements::from_values(6.3, 3.3, 6.0, 2.5),
            FlowerMeasurements::from_values(4.9, 3.0, 1.4, 0.2),
        ]
    }

    #[test]
    fn test_batch_preserves_order_and_counts() {
        let (adapter, _) = adapter();
        let result = predict_batch(&adapter, &flowers()).unwrap();
        let species: Vec<_> = result.predictions.iter().map(|p| p.species).collect();
        assert_eq!(
            species,
            vec![
                Species::Setosa,
                Species::Versicolor,
                Species::Virginica,
                Species::Setosa
            ]
        );
        assert_eq!(result.summary.get(Species::Setosa), 2);
        assert_eq!(result.summary.total(), result.len());
    }

    #[test]
    fn test_empty_batch_is_not_an_error() {
        let (adapter, model) = adapter();
        let result = predict_batch(&adapter, &[]).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.summary, SpeciesCounts::default());
        assert_eq!(model.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_one_invalid_item_fails_whole_batch() {
        let (adapter, model) = adapter();
        let mut batch = flowers();
        batch.insert(2, FlowerMeasurements::from_values(-1.0, 3.0, 1.4, 0.2));
        let err = predict_batch(&adapter, &batch).unwrap_err();
        assert_eq!(err.field(), Some("sepal_length"));
        // Items after the bad one are never classified.
        assert_eq!(model.calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_summary_serializes_all_species() {
        let v = serde_json::to_value(SpeciesCounts::default()).unwrap();
        assert_eq!(v, serde_json::json!({"setosa": 0, "versicolor": 0, "virginica": 0}));
    }

    #[test]
    fn test_batch_request_parses_flowers() {
        let req: BatchRequest = serde_json::from_str(
            r#"{"flowers": [{"sepal_length": 5.1, "sepal_width": 3.5, "petal_length": 1.4, "petal_width": 0.2}]}"#,
        )
        .unwrap();
        assert_eq!(req.flowers.len(), 1);
        assert!(req.flowers[0].validate().is_ok());
    }
}
