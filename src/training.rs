//! Offline fitting of the reference [`LogisticRegression`] artifact.
//!
//! Fitting is delegated to `linfa-logistic`'s multinomial logistic regression
//! (L-BFGS, L2 penalty `alpha = 1 / C`). The fitted weights are copied into the
//! JSON artifact, so serving never depends on linfa.

use linfa::traits::Fit;
use linfa::{Dataset, DatasetBase};
use linfa_logistic::MultiLogisticRegression;
use ndarray::{Array1, Array2, Ix1};
use serde::Serialize;
use tracing::{debug, info};

use crate::classifier::Classifier;
use crate::dataset::{self, Sample, DATASET_NAME};
use crate::features::{FEATURE_NAMES, NUM_FEATURES};
use crate::model::{LogisticRegression, TrainingSummary};
use crate::species::{Species, CLASS_NAMES, NUM_CLASSES};

/// Every `HOLDOUT_STRIDE`-th sample of each class is held out for testing (20%).
pub const HOLDOUT_STRIDE: usize = 5;

/// Largest disagreement tolerated between linfa's probabilities and the
/// exported artifact's on the training set.
const EXPORT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
pub struct TrainingConfig {
    /// L-BFGS iteration cap.
    pub max_iterations: u64,
    /// Inverse regularisation strength.
    pub l2_c: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            l2_c: 1.0,
        }
    }
}

/// Held-out performance of a fitted model.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub accuracy: f64,
    pub test_samples: usize,
    /// `confusion[actual][predicted]`.
    pub confusion: [[usize; NUM_CLASSES]; NUM_CLASSES],
}

impl Evaluation {
    pub fn correct(&self, species: Species) -> usize {
        self.confusion[species.index()][species.index()]
    }
}

/// Stratified deterministic split: within each class, sample `i` goes to the
/// test set when `i % HOLDOUT_STRIDE == HOLDOUT_STRIDE - 1`.
pub fn train_test_split(samples: &[Sample]) -> (Vec<Sample>, Vec<Sample>) {
    let mut seen = [0usize; NUM_CLASSES];
    let mut train = Vec::new();
    let mut test = Vec::new();
    for s in samples {
        let i = &mut seen[s.species.index()];
        if *i % HOLDOUT_STRIDE == HOLDOUT_STRIDE - 1 {
            test.push(*s);
        } else {
            train.push(*s);
        }
        *i += 1;
    }
    (train, test)
}

fn to_dataset(samples: &[Sample]) -> Dataset<f64, usize, Ix1> {
    let records = Array2::from_shape_fn((samples.len(), NUM_FEATURES), |(i, j)| {
        samples[i].features[j]
    });
    let targets = Array1::from_iter(samples.iter().map(|s| s.species.index()));
    DatasetBase::new(records, targets)
}

/// Fit a model to `samples`. Every species must be present.
pub fn fit(samples: &[Sample], config: &TrainingConfig) -> eyre::Result<LogisticRegression> {
    for species in Species::ALL {
        if !samples.iter().any(|s| s.species == species) {
            eyre::bail!("Training set has no {} samples", species);
        }
    }

    let train = to_dataset(samples);
    let fitted = MultiLogisticRegression::<f64>::default()
        .alpha(1.0 / config.l2_c)
        .max_iterations(config.max_iterations)
        .fit(&train)
        .map_err(|e| eyre::eyre!("Logistic regression fit failed: {}", e))?;

    // linfa stores weights as (features, classes) with classes in sorted
    // label order, which is the class-index order.
    let params = fitted.params();
    let intercept = fitted.intercept();
    if params.dim() != (NUM_FEATURES, NUM_CLASSES) || intercept.len() != NUM_CLASSES {
        eyre::bail!(
            "Fitted parameters have shape {:?} with {} intercepts",
            params.dim(),
            intercept.len()
        );
    }
    let coefficients = (0..NUM_CLASSES)
        .map(|k| {
            let mut row = [0.0; NUM_FEATURES];
            for (j, w) in row.iter_mut().enumerate() {
                *w = params[[j, k]];
            }
            row
        })
        .collect();

    let model = LogisticRegression {
        classes: CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        coefficients,
        intercepts: intercept.to_vec(),
        training: TrainingSummary {
            dataset: DATASET_NAME.to_string(),
            train_samples: samples.len(),
            test_samples: 0,
            test_accuracy: 0.0,
            l2_c: config.l2_c,
            iterations: config.max_iterations as usize,
        },
    };
    model.check_shape()?;
    check_export(&model, &fitted.predict_probabilities(train.records()), samples)?;
    Ok(model)
}

/// The exported artifact must reproduce linfa's probabilities.
fn check_export(
    model: &LogisticRegression,
    expected: &Array2<f64>,
    samples: &[Sample],
) -> eyre::Result<()> {
    for (row, sample) in expected.rows().into_iter().zip(samples) {
        let got = model.predict_proba(&sample.features)?;
        let diff = row
            .iter()
            .zip(&got)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        if diff > EXPORT_TOLERANCE {
            eyre::bail!(
                "Exported model disagrees with fitted model by {} on {:?}",
                diff,
                sample.features
            );
        }
    }
    debug!(samples = samples.len(), "exported parameters match fitted model");
    Ok(())
}

/// Accuracy and confusion counts of `model` on `samples`.
pub fn evaluate(model: &LogisticRegression, samples: &[Sample]) -> eyre::Result<Evaluation> {
    let mut confusion = [[0usize; NUM_CLASSES]; NUM_CLASSES];
    let mut correct = 0;
    for s in samples {
        let predicted = model.predict(&s.features)?;
        if predicted >= NUM_CLASSES {
            eyre::bail!("Model predicted class index {}", predicted);
        }
        confusion[s.species.index()][predicted] += 1;
        if predicted == s.species.index() {
            correct += 1;
        }
    }
    let accuracy = if samples.is_empty() {
        0.0
    } else {
        correct as f64 / samples.len() as f64
    };
    Ok(Evaluation {
        accuracy,
        test_samples: samples.len(),
        confusion,
    })
}

/// Split the iris dataset, fit, evaluate on the held-out part, and record
/// the split and accuracy in the artifact.
pub fn train_reference_model(
    config: &TrainingConfig,
) -> eyre::Result<(LogisticRegression, Evaluation)> {
    let all = dataset::samples();
    let (train, test) = train_test_split(&all);
    info!(
        total = all.len(),
        train = train.len(),
        test = test.len(),
        "training logistic regression"
    );

    let mut model = fit(&train, config)?;
    let evaluation = evaluate(&model, &test)?;
    model.training.test_samples = test.len();
    model.training.test_accuracy = evaluation.accuracy;

    info!(
        accuracy = evaluation.accuracy,
        max_iterations = config.max_iterations,
        "training complete"
    );
    Ok((model, evaluation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_is_stratified_eighty_twenty() {
        let (train, test) = train_test_split(&dataset::samples());
        assert_eq!(train.len(), 120);
        assert_eq!(test.len(), 30);
        for sp in Species::ALL {
            assert_eq!(test.iter().filter(|s| s.species == sp).count(), 10);
        }
    }

    #[test]
    fn test_reference_model_accuracy() {
        let (model, eval) = train_reference_model(&TrainingConfig::default()).unwrap();
        assert!(eval.accuracy >= 0.85, "held-out accuracy {}", eval.accuracy);
        assert_eq!(eval.correct(Species::Setosa), 10);
        assert_eq!(model.training.train_samples, 120);
        assert_eq!(model.training.test_samples, 30);
        model.check_shape().unwrap();
    }

    #[test]
    fn test_reference_model_classifies_examples() {
        let (model, _) = train_reference_model(&TrainingConfig::default()).unwrap();
        for sp in Species::ALL {
            let x = sp.example().to_array();
            assert_eq!(model.predict(&x).unwrap(), sp.index(), "{}", sp);
        }
        let p = model.predict_proba(&Species::Setosa.example().to_array()).unwrap();
        assert!(p[0] > 0.9, "setosa probability {}", p[0]);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (train, _) = train_test_split(&dataset::samples());
        let config = TrainingConfig {
            max_iterations: 200,
            ..Default::default()
        };
        assert_eq!(fit(&train, &config).unwrap(), fit(&train, &config).unwrap());
    }

    #[test]
    fn test_fit_requires_every_species() {
        let setosa_only: Vec<_> = dataset::samples()
            .into_iter()
            .filter(|s| s.species == Species::Setosa)
            .collect();
        let err = fit(&setosa_only, &TrainingConfig::default()).unwrap_err();
        assert!(err.to_string().contains("no versicolor samples"));
    }
}
