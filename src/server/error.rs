//! HTTP mapping of prediction errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::PredictionError;

/// Error returned by prediction handlers.
#[derive(Debug)]
pub struct ApiError(pub PredictionError);

impl From<PredictionError> for ApiError {
    fn from(err: PredictionError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            PredictionError::Validation { .. } => StatusCode::BAD_REQUEST,
            PredictionError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            PredictionError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "success": false,
            "error": {
                "code": self.0.code(),
                "message": self.0.to_string(),
                "field": self.0.field(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let validation = ApiError(PredictionError::validation("sepal_length", "field is required"));
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError(PredictionError::ServiceUnavailable).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError(PredictionError::Inference("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_response_status() {
        let resp = ApiError(PredictionError::ServiceUnavailable).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
