//! Probability maps and confidence tiers derived from classifier output.

use serde::{Deserialize, Serialize};

use crate::species::{Species, NUM_CLASSES};

/// Decimal places kept in the per-species probability map.
pub const PROBABILITY_DECIMALS: i32 = 3;

/// Confidence at or above which a prediction is "very confident".
pub const VERY_CONFIDENT_THRESHOLD: f64 = 0.90;
/// Confidence at or above which a prediction is "likely".
pub const LIKELY_THRESHOLD: f64 = 0.70;
/// Confidence at or above which a prediction is "probable".
pub const PROBABLE_THRESHOLD: f64 = 0.50;

/// Probability for each species, rounded for display.
///
/// Rounded values need not re-sum to exactly 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeciesProbabilities {
    pub setosa: f64,
    pub versicolor: f64,
    pub virginica: f64,
}

impl SpeciesProbabilities {
    pub fn from_probabilities(probs: &[f64; NUM_CLASSES]) -> Self {
        Self {
            setosa: round_to(probs[0], PROBABILITY_DECIMALS),
            versicolor: round_to(probs[1], PROBABILITY_DECIMALS),
            virginica: round_to(probs[2], PROBABILITY_DECIMALS),
        }
    }

    pub fn to_array(&self) -> [f64; NUM_CLASSES] {
        [self.setosa, self.versicolor, self.virginica]
    }

    pub fn get(&self, species: Species) -> f64 {
        self.to_array()[species.index()]
    }

    pub fn total(&self) -> f64 {
        self.to_array().iter().sum()
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Qualitative reading of a confidence value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    VeryConfident,
    Likely,
    Probable,
    Uncertain,
}

impl ConfidenceTier {
    /// Thresholds are checked top-down; the first match wins.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= VERY_CONFIDENT_THRESHOLD {
            Self::VeryConfident
        } else if confidence >= LIKELY_THRESHOLD {
            Self::Likely
        } else if confidence >= PROBABLE_THRESHOLD {
            Self::Probable
        } else {
            Self::Uncertain
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryConfident => "very_confident",
            Self::Likely => "likely",
            Self::Probable => "probable",
            Self::Uncertain => "uncertain",
        }
    }

    /// Human-readable sentence for a prediction of `species` in this tier.
    pub fn interpret(&self, species: Species) -> String {
        let name = species.as_str().to_uppercase();
        match self {
            Self::VeryConfident => format!(
                "Very confident this is a {}! The measurements strongly match this species.",
                name
            ),
            Self::Likely => format!(
                "Likely a {}. The measurements are consistent with this species.",
                name
            ),
            Self::Probable => format!(
                "Probably a {}, but consider checking measurements or consulting an expert.",
                name
            ),
            Self::Uncertain => {
                "Uncertain prediction. The measurements don't clearly match any species pattern."
                    .to_string()
            }
        }
    }
}
