//! HTTP endpoint handler functions.

use std::sync::Arc;
use std::time::Instant;

use tracing::warn;

use crate::batch::{BatchRequest, BatchResult};
use crate::classifier::ModelInfo;
use crate::error::PredictionError;
use crate::features::FlowerMeasurements;
use crate::prediction::{format_timestamp, PredictionResult};
use crate::species::{example_measurements, species_guide};

use super::error::{ApiError, ApiResult};
use super::logging::Endpoint;
use super::types::*;
use super::ServerState;

/// Count and log a failed request, then hand the error to the response mapper.
fn reject(state: &ServerState, endpoint: Endpoint, err: PredictionError) -> ApiError {
    state.usage.record_error();
    warn!(
        endpoint = endpoint.as_str(),
        code = err.code(),
        field = err.field(),
        error = %err,
        "request rejected"
    );
    ApiError(err)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn health_handler(
    axum::extract::State(state): axum::extract::State<Arc<ServerState>>,
) -> impl axum::response::IntoResponse {
    state.usage.hit(Endpoint::Health);
    let loaded = state.service.is_loaded();
    let (status, message) = if loaded {
        ("healthy", "Iris Classification API is running and ready")
    } else {
        ("model_not_loaded", "API is running but model is not loaded")
    };

    let response = HealthResponse {
        status: status.to_string(),
        message: message.to_string(),
        timestamp: format_timestamp(chrono::Utc::now()),
        model_loaded: loaded,
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_hash: state.service.model_hash().map(str::to_string),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    };
    axum::Json(response)
}

pub async fn predict_handler(
    axum::extract::State(state): axum::extract::State<Arc<ServerState>>,
    axum::Json(measurements): axum::Json<FlowerMeasurements>,
) -> ApiResult<axum::Json<PredictionResult>> {
    let start = Instant::now();
    state.usage.hit(Endpoint::Predict);

    let result = state
        .service
        .predict(&measurements)
        .map_err(|e| reject(&state, Endpoint::Predict, e))?;

    state.usage.record(
        result.species,
        result.confidence,
        start.elapsed().as_millis() as u64,
    );
    Ok(axum::Json(result))
}

pub async fn predict_batch_handler(
    axum::extract::State(state): axum::extract::State<Arc<ServerState>>,
    axum::Json(request): axum::Json<BatchRequest>,
) -> ApiResult<axum::Json<BatchResult>> {
    let start = Instant::now();
    state.usage.hit(Endpoint::PredictBatch);

    let result = state
        .service
        .predict_batch(&request.flowers)
        .map_err(|e| reject(&state, Endpoint::PredictBatch, e))?;

    state
        .usage
        .record_batch(&result.summary, start.elapsed().as_millis() as u64);
    Ok(axum::Json(result))
}

pub async fn model_info_handler(
    axum::extract::State(state): axum::extract::State<Arc<ServerState>>,
) -> ApiResult<axum::Json<ModelInfo>> {
    state.usage.hit(Endpoint::ModelInfo);
    let info = state
        .service
        .model_info()
        .map_err(|e| reject(&state, Endpoint::ModelInfo, e))?;
    Ok(axum::Json(info))
}

pub async fn species_info_handler(
    axum::extract::State(state): axum::extract::State<Arc<ServerState>>,
) -> impl axum::response::IntoResponse {
    state.usage.hit(Endpoint::SpeciesInfo);
    axum::Json(SpeciesInfoResponse {
        species_guide: species_guide(),
    })
}

pub async fn examples_handler(
    axum::extract::State(state): axum::extract::State<Arc<ServerState>>,
) -> impl axum::response::IntoResponse {
    state.usage.hit(Endpoint::Examples);
    axum::Json(ExamplesResponse {
        examples: example_measurements(),
    })
}

pub async fn stats_handler(
    axum::extract::State(state): axum::extract::State<Arc<ServerState>>,
) -> impl axum::response::IntoResponse {
    state.usage.hit(Endpoint::Stats);

    let response = StatsResponse {
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model_hash: state.service.model_hash().map(str::to_string),
        requests: state.usage.request_stats(),
        predictions: state.usage.prediction_stats(),
        endpoints: state.usage.endpoint_stats(),
    };
    axum::Json(response)
}
