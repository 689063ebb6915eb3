//! Iris species classification service.
//!
//! Classifies a flower from four measurements (sepal length/width, petal
//! length/width, in cm) into one of three species:
//! - **setosa**
//! - **versicolor**
//! - **virginica**
//!
//! Input is validated field by field, the attached [`classifier::Classifier`]
//! is run through a contract-checking adapter, and the result is formatted
//! with rounded probabilities and a confidence interpretation. Batches are
//! all-or-nothing.
//!
//! Uses structured logging via [`tracing`]. Set the `RUST_LOG` environment
//! variable to control log verbosity (e.g., `RUST_LOG=iris_classifier=debug`).

pub mod batch;
pub mod classifier;
pub mod dataset;
pub mod error;
pub mod features;
pub mod model;
pub mod prediction;
pub mod scores;
pub mod server;
pub mod service;
pub mod species;
pub mod training;
pub mod ui;

pub use batch::{BatchRequest, BatchResult, SpeciesCounts};
pub use classifier::{Classifier, ClassifierAdapter, ClassifierOutput, ModelInfo};
pub use error::PredictionError;
pub use features::{FeatureVector, FlowerMeasurements, FEATURE_NAMES, NUM_FEATURES};
pub use model::LogisticRegression;
pub use prediction::PredictionResult;
pub use scores::{ConfidenceTier, SpeciesProbabilities};
pub use service::IrisService;
pub use species::{Species, CLASS_NAMES, NUM_CLASSES};
