//! Error kinds surfaced by the prediction pipeline.

use thiserror::Error;

/// Failure of a single prediction or a whole batch. Every variant is terminal
/// for the call; nothing is retried internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    /// A measurement is missing, non-numeric, non-finite, or out of range.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// No classifier is attached to the service.
    #[error("model not loaded")]
    ServiceUnavailable,

    /// The classifier failed or broke its output contract.
    #[error("inference failed: {0}")]
    Inference(String),
}

impl PredictionError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending input field, for validation failures.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::Inference(_) => "INFERENCE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_names_field() {
        let err = PredictionError::validation("petal_width", "must be between 0 and 10, got 11");
        assert_eq!(
            err.to_string(),
            "invalid petal_width: must be between 0 and 10, got 11"
        );
        assert_eq!(err.field(), Some("petal_width"));
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_server_side_kinds() {
        assert_eq!(PredictionError::ServiceUnavailable.code(), "SERVICE_UNAVAILABLE");
        assert_eq!(PredictionError::ServiceUnavailable.field(), None);
        assert_eq!(
            PredictionError::Inference("shape".into()).code(),
            "INFERENCE_ERROR"
        );
    }
}
