//! Router and handlers for the read-only results API.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use super::state::ApiState;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Listen address.
    pub listen_addr: String,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:5000".to_string(),
        }
    }
}

/// Build the router over the loaded artifacts.
///
/// CORS is fully permissive: the API is read-only and consumed by a
/// front-end dev server on another origin.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(health))
        .route("/api/oil_prices", get(get_oil_prices))
        .route("/api/change_points", get(get_change_points))
        .route("/api/key_events", get(get_key_events))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the process is terminated.
pub async fn serve(config: &ApiServerConfig, state: ApiState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "results API listening");
    axum::serve(listener, router(state)).await
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Processed price/return records, as loaded at startup.
async fn get_oil_prices(State(state): State<ApiState>) -> Json<Vec<crate::core::ProcessedRecord>> {
    Json(state.data().prices.clone())
}

/// The change-point summary, or an empty object if the artifact was missing.
async fn get_change_points(State(state): State<ApiState>) -> Json<serde_json::Value> {
    let value = state
        .data()
        .change_points
        .as_ref()
        .and_then(|s| serde_json::to_value(s).ok())
        .unwrap_or_else(|| serde_json::json!({}));
    Json(value)
}

/// The curated historical events.
async fn get_key_events(
    State(state): State<ApiState>,
) -> Json<Vec<crate::ingest::events::KeyEvent>> {
    Json(state.data().events.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::state::AppData;

    #[tokio::test]
    async fn change_points_default_is_an_empty_object() {
        let state = ApiState::new(AppData::default());
        let response = get_change_points(State(state)).await;
        let value = response.0;
        assert_eq!(value, serde_json::json!({}));
    }

    #[tokio::test]
    async fn oil_prices_default_is_an_empty_list() {
        let state = ApiState::new(AppData::default());
        let response = get_oil_prices(State(state)).await;
        assert!(response.0.is_empty());
    }
}
