//! Turning contract-checked classifier output into the prediction response.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classifier::ClassifierOutput;
use crate::scores::{ConfidenceTier, SpeciesProbabilities};
use crate::species::Species;

/// Rendering of prediction timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Response for one classified flower.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub species: Species,
    /// Unrounded probability of `species`.
    pub confidence: f64,
    pub confidence_percentage: String,
    pub probabilities: SpeciesProbabilities,
    pub interpretation: String,
    pub timestamp: String,
}

impl PredictionResult {
    pub fn tier(&self) -> ConfidenceTier {
        ConfidenceTier::from_confidence(self.confidence)
    }
}

/// Format `output` stamped with the current UTC time.
pub fn format_prediction(output: &ClassifierOutput) -> PredictionResult {
    format_prediction_at(output, Utc::now())
}

/// Format `output` stamped with `now`. Deterministic in both arguments.
pub fn format_prediction_at(output: &ClassifierOutput, now: DateTime<Utc>) -> PredictionResult {
    let species = output.species;
    let confidence = output.confidence();
    let tier = ConfidenceTier::from_confidence(confidence);

    PredictionResult {
        species,
        confidence,
        confidence_percentage: format_percentage(confidence),
        probabilities: SpeciesProbabilities::from_probabilities(&output.probabilities),
        interpretation: tier.interpret(species),
        timestamp: format_timestamp(now),
    }
}

/// `0.9512` -> `"95.1%"`.
pub fn format_percentage(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}
