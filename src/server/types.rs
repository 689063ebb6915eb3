//! Request/response types and configuration for the iris server.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Serialize;

use crate::features::FeatureVector;
use crate::species::SpeciesCharacteristics;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Default location of the model artifact.
pub const DEFAULT_MODEL_PATH: &str = "iris_model.json";

/// Environment variable that overrides [`DEFAULT_MODEL_PATH`].
pub const MODEL_PATH_ENV: &str = "IRIS_MODEL_PATH";

/// Maximum request body size in bytes (1 MB).
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (defaults to 127.0.0.1:8000; use 0.0.0.0 to expose externally)
    pub bind_addr: SocketAddr,
    /// Model artifact to load at startup. A missing file leaves the service
    /// running without a model.
    pub model_path: PathBuf,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            model_path: default_model_path(),
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}

/// `$IRIS_MODEL_PATH` if set and non-empty, otherwise [`DEFAULT_MODEL_PATH`].
pub fn default_model_path() -> PathBuf {
    std::env::var(MODEL_PATH_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH))
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `model_not_loaded`.
    pub status: String,
    pub message: String,
    pub timestamp: String,
    pub model_loaded: bool,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_hash: Option<String>,
    pub uptime_seconds: u64,
}

/// Stats response
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub uptime_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_hash: Option<String>,
    pub requests: RequestStats,
    pub predictions: PredictionStats,
    pub endpoints: EndpointStats,
}

#[derive(Debug, Serialize)]
pub struct RequestStats {
    pub total: u64,
    pub errors: u64,
}

/// Predictions served, by species. Batch items count individually.
#[derive(Debug, Serialize)]
pub struct PredictionStats {
    pub setosa: u64,
    pub versicolor: u64,
    pub virginica: u64,
}

#[derive(Debug, Serialize)]
pub struct EndpointStats {
    pub index: u64,
    pub health: u64,
    pub openapi: u64,
    pub predict: u64,
    pub predict_batch: u64,
    pub model_info: u64,
    pub species_info: u64,
    pub examples: u64,
    pub stats: u64,
}

#[derive(Debug, Serialize)]
pub struct SpeciesInfoResponse {
    pub species_guide: BTreeMap<&'static str, SpeciesCharacteristics>,
}

#[derive(Debug, Serialize)]
pub struct ExamplesResponse {
    pub examples: BTreeMap<&'static str, FeatureVector>,
}
