//! HTTP server for the iris classification service.
//!
//! Provides REST API endpoints for single and batch prediction plus the
//! read-only reference data (model info, species guide, examples).
//!
//! Features:
//! - Permissive CORS for browser clients
//! - Request body size limit
//! - In-memory usage counters on `/stats`
//! - Graceful shutdown on SIGINT/SIGTERM
//! - Structured logging via [`tracing`]

pub mod error;
pub mod handlers;
pub mod logging;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use handlers::*;
pub use logging::{Endpoint, UsageMetrics};
pub use types::{
    default_model_path, EndpointStats, ExamplesResponse, HealthResponse, PredictionStats,
    RequestStats, ServerConfig, SpeciesInfoResponse, StatsResponse, DEFAULT_MODEL_PATH,
    MAX_BODY_BYTES, MODEL_PATH_ENV,
};

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use eyre::{Result, WrapErr};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::service::IrisService;

/// Shared state for all handlers.
pub struct ServerState {
    pub config: ServerConfig,
    pub service: IrisService,
    pub start_time: Instant,
    pub usage: UsageMetrics,
}

impl ServerState {
    pub fn new(config: ServerConfig, service: IrisService) -> Self {
        Self {
            config,
            service,
            start_time: Instant::now(),
            usage: UsageMetrics::new(),
        }
    }

    /// Load the model named in `config`. A model that cannot be loaded is
    /// logged and the state is built without one.
    pub fn load(config: ServerConfig) -> Self {
        let service = match IrisService::load(&config.model_path) {
            Ok(service) => service,
            Err(e) => {
                warn!(
                    path = %config.model_path.display(),
                    error = %format!("{:#}", e),
                    "model not loaded; predictions will return 503 until restarted with a model"
                );
                IrisService::unloaded()
            }
        };
        Self::new(config, service)
    }
}

/// All routes with CORS and the body limit applied.
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        .route("/", get(crate::ui::index_handler))
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/openapi.json", get(crate::ui::openapi_handler))
        .route("/predict", post(predict_handler))
        .route("/predict-batch", post(predict_batch_handler))
        .route("/model-info", get(model_info_handler))
        .route("/species-info", get(species_info_handler))
        .route("/examples", get(examples_handler))
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

pub async fn run_server(config: ServerConfig) -> Result<()> {
    let bind_addr = config.bind_addr;
    let state = Arc::new(ServerState::load(config));
    let model_loaded = state.service.is_loaded();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .wrap_err_with(|| format!("Failed to bind {}", bind_addr))?;
    info!(bind = %bind_addr, model_loaded, "iris classifier server listening");
    info!("Endpoints: GET / (UI), GET /health, GET /stats, GET /openapi.json, POST /predict, POST /predict-batch, GET /model-info, GET /species-info, GET /examples");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    let sigterm_recv = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let sigterm_recv = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down gracefully"),
        _ = sigterm_recv => info!("received SIGTERM, shutting down gracefully"),
    }
}
