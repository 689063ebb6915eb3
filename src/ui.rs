//! Embedded landing page and OpenAPI document.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;

use crate::server::{Endpoint, ServerState};

const INDEX_HTML: &str = include_str!("../static/index.html");
const OPENAPI_JSON: &str = include_str!("../static/openapi.json");

pub async fn index_handler(State(state): State<Arc<ServerState>>) -> Html<&'static str> {
    state.usage.hit(Endpoint::Index);
    Html(INDEX_HTML)
}

pub async fn openapi_handler(
    State(state): State<Arc<ServerState>>,
) -> ([(&'static str, &'static str); 1], &'static str) {
    state.usage.hit(Endpoint::OpenApi);
    ([("content-type", "application/json")], OPENAPI_JSON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_is_valid_json_listing_routes() {
        let doc: serde_json::Value = serde_json::from_str(OPENAPI_JSON).unwrap();
        let paths = doc["paths"].as_object().unwrap();
        for route in [
            "/health",
            "/predict",
            "/predict-batch",
            "/model-info",
            "/species-info",
            "/examples",
            "/stats",
        ] {
            assert!(paths.contains_key(route), "missing {}", route);
        }
    }

    #[test]
    fn test_index_mentions_predict() {
        assert!(INDEX_HTML.contains("/predict"));
    }
}
