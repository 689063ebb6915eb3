//! The fixed iris label set and the read-only reference data served alongside
//! predictions (species guide, example measurements).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;

/// Number of output classes. The classifier's probability vector has exactly
/// this many entries.
pub const NUM_CLASSES: usize = 3;

/// Label names in class-index order.
pub const CLASS_NAMES: [&str; NUM_CLASSES] = ["setosa", "versicolor", "virginica"];

/// Iris species. The discriminant is the class index the model was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Setosa = 0,
    Versicolor = 1,
    Virginica = 2,
}

impl Species {
    pub const ALL: [Species; NUM_CLASSES] = [Self::Setosa, Self::Versicolor, Self::Virginica];

    /// Map a class index onto the label set. Out-of-range indices are `None`
    /// rather than a silent default.
    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        CLASS_NAMES[self.index()]
    }
}

impl std::fmt::Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Species guide
// ---------------------------------------------------------------------------

/// Typical characteristics of one species, for users sanity-checking their
/// measurements.
#[derive(Debug, Clone, Serialize)]
pub struct SpeciesCharacteristics {
    pub description: &'static str,
    pub typical_sepal_length: &'static str,
    pub typical_sepal_width: &'static str,
    pub typical_petal_length: &'static str,
    pub typical_petal_width: &'static str,
    pub distinguishing_features: &'static str,
}

impl Species {
    pub fn characteristics(&self) -> SpeciesCharacteristics {
        match self {
            Self::Setosa => SpeciesCharacteristics {
                description: "Small, delicate flowers with distinctive features",
                typical_sepal_length: "4.5-5.5 cm",
                typical_sepal_width: "3.0-4.0 cm",
                typical_petal_length: "1.0-2.0 cm",
                typical_petal_width: "0.1-0.5 cm",
                distinguishing_features: "Very short petals, wide sepals, compact flower",
            },
            Self::Versicolor => SpeciesCharacteristics {
                description: "Medium-sized flowers with balanced proportions",
                typical_sepal_length: "5.5-6.5 cm",
                typical_sepal_width: "2.5-3.5 cm",
                typical_petal_length: "3.5-5.0 cm",
                typical_petal_width: "1.0-1.5 cm",
                distinguishing_features: "Moderate size, balanced petal-to-sepal ratio",
            },
            Self::Virginica => SpeciesCharacteristics {
                description: "Large, elegant flowers with long petals",
                typical_sepal_length: "6.0-8.0 cm",
                typical_sepal_width: "2.5-3.5 cm",
                typical_petal_length: "5.0-7.0 cm",
                typical_petal_width: "1.5-2.5 cm",
                distinguishing_features: "Long petals, large overall size, narrow sepals",
            },
        }
    }

    /// A canonical measurement that the reference model classifies as this species.
    pub fn example(&self) -> FeatureVector {
        let [sl, sw, pl, pw] = match self {
            Self::Setosa => [5.1, 3.5, 1.4, 0.2],
            Self::Versicolor => [6.2, 2.9, 4.3, 1.3],
            Self::Virginica => [6.3, 3.3, 6.0, 2.5],
        };
        FeatureVector::new_unchecked([sl, sw, pl, pw])
    }
}

/// Guide keyed by species name.
pub fn species_guide() -> BTreeMap<&'static str, SpeciesCharacteristics> {
    Species::ALL
        .iter()
        .map(|sp| (sp.as_str(), sp.characteristics()))
        .collect()
}

/// Example measurements keyed by species name.
pub fn example_measurements() -> BTreeMap<&'static str, FeatureVector> {
    Species::ALL
        .iter()
        .map(|sp| (sp.as_str(), sp.example()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip_matches_class_names() {
        for (i, name) in CLASS_NAMES.iter().enumerate() {
            let sp = Species::from_index(i).unwrap();
            assert_eq!(sp.index(), i);
            assert_eq!(sp.as_str(), *name);
        }
        assert!(Species::from_index(3).is_none());
    }

    #[test]
    fn test_serializes_lowercase() {
        let json = serde_json::to_string(&Species::Versicolor).unwrap();
        assert_eq!(json, "\"versicolor\"");
    }

    #[test]
    fn test_examples_pass_validation() {
        for (name, fv) in example_measurements() {
            let arr = fv.to_array();
            assert!(
                FeatureVector::new(arr[0], arr[1], arr[2], arr[3]).is_ok(),
                "example for {} should be in range",
                name
            );
        }
    }

    #[test]
    fn test_guide_covers_every_species() {
        let guide = species_guide();
        assert_eq!(guide.len(), NUM_CLASSES);
        assert_eq!(guide["setosa"].typical_petal_length, "1.0-2.0 cm");
    }
}
