//! Flower measurements and their validation.
//!
//! Raw request bodies arrive as [`FlowerMeasurements`], where every field is
//! an arbitrary JSON value so that a missing or non-numeric field can be
//! reported by name. [`FlowerMeasurements::validate`] is the only way from
//! untrusted input to a [`FeatureVector`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PredictionError;

/// Number of input features.
pub const NUM_FEATURES: usize = 4;

/// Feature names in model input order.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] =
    ["sepal_length", "sepal_width", "petal_length", "petal_width"];

/// Inclusive range accepted for one measurement, in centimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureBound {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
}

impl FeatureBound {
    fn check(&self, value: f64) -> Result<f64, PredictionError> {
        if !value.is_finite() {
            return Err(PredictionError::validation(
                self.name,
                format!("must be a finite number, got {}", value),
            ));
        }
        if value < self.min || value > self.max {
            return Err(PredictionError::validation(
                self.name,
                format!(
                    "must be between {} and {}, got {}",
                    self.min, self.max, value
                ),
            ));
        }
        Ok(value)
    }
}

/// Per-field bounds, aligned with [`FEATURE_NAMES`].
pub const FEATURE_BOUNDS: [FeatureBound; NUM_FEATURES] = [
    FeatureBound { name: "sepal_length", min: 0.0, max: 15.0 },
    FeatureBound { name: "sepal_width", min: 0.0, max: 10.0 },
    FeatureBound { name: "petal_length", min: 0.0, max: 15.0 },
    FeatureBound { name: "petal_width", min: 0.0, max: 10.0 },
];

/// A validated set of four measurements. Fields are private: construct via
/// [`FeatureVector::new`] or [`FlowerMeasurements::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    sepal_length: f64,
    sepal_width: f64,
    petal_length: f64,
    petal_width: f64,
}

impl FeatureVector {
    pub fn new(
        sepal_length: f64,
        sepal_width: f64,
        petal_length: f64,
        petal_width: f64,
    ) -> Result<Self, PredictionError> {
        let values = [sepal_length, sepal_width, petal_length, petal_width];
        for (bound, value) in FEATURE_BOUNDS.iter().zip(values) {
            bound.check(value)?;
        }
        Ok(Self::new_unchecked(values))
    }

    /// For constants known to be in range.
    pub(crate) fn new_unchecked(values: [f64; NUM_FEATURES]) -> Self {
        let [sepal_length, sepal_width, petal_length, petal_width] = values;
        Self {
            sepal_length,
            sepal_width,
            petal_length,
            petal_width,
        }
    }

    /// Model input order: `[sepal_length, sepal_width, petal_length, petal_width]`.
    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.sepal_length,
            self.sepal_width,
            self.petal_length,
            self.petal_width,
        ]
    }
}

/// Unvalidated measurements as received from a caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowerMeasurements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sepal_length: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sepal_width: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub petal_length: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub petal_width: Option<Value>,
}

impl FlowerMeasurements {
    /// Measurements with all four fields present and numeric.
    pub fn from_values(
        sepal_length: f64,
        sepal_width: f64,
        petal_length: f64,
        petal_width: f64,
    ) -> Self {
        Self {
            sepal_length: Some(Value::from(sepal_length)),
            sepal_width: Some(Value::from(sepal_width)),
            petal_length: Some(Value::from(petal_length)),
            petal_width: Some(Value::from(petal_width)),
        }
    }

    /// Check every field in input order; the first failure wins.
    pub fn validate(&self) -> Result<FeatureVector, PredictionError> {
        let raw = [
            &self.sepal_length,
            &self.sepal_width,
            &self.petal_length,
            &self.petal_width,
        ];
        let mut values = [0.0; NUM_FEATURES];
        for ((bound, value), slot) in FEATURE_BOUNDS.iter().zip(raw).zip(values.iter_mut()) {
            *slot = bound.check(numeric(bound.name, value.as_ref())?)?;
        }
        Ok(FeatureVector::new_unchecked(values))
    }
}

impl From<FeatureVector> for FlowerMeasurements {
    fn from(fv: FeatureVector) -> Self {
        let [sl, sw, pl, pw] = fv.to_array();
        Self::from_values(sl, sw, pl, pw)
    }
}

fn numeric(field: &'static str, value: Option<&Value>) -> Result<f64, PredictionError> {
    match value {
        None | Some(Value::Null) => Err(PredictionError::validation(field, "field is required")),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| PredictionError::validation(field, "must be a number")),
        Some(other) => Err(PredictionError::validation(
            field,
            format!("must be a number, got {}", json_type(other)),
        )),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
