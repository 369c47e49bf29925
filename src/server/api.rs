//! HTTP API
//!
//! Settings form backend, price cache view and the scheduler's cycle
//! trigger.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::types::*;
use super::ServerState;
use crate::cycle::CycleResult;
use crate::error::{SettingsError, ValidationError};
use crate::settings::{BotSettings, SettingsUpdate};
use crate::types::PriceSnapshot;

/// Create the API router with all endpoints
pub fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/settings", get(get_settings).post(post_settings))
        .route("/api/prices", get(get_prices))
        .route("/api/cycle", post(post_cycle))
        .route("/api/cycle/last", get(get_last_cycle))
        .route("/api/health", get(get_health))
        .with_state(state)
        // CORS for the settings form
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

// ─────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────

/// GET /api/settings - Current settings or defaults
async fn get_settings(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let store = Arc::clone(&state.settings);
    match tokio::task::spawn_blocking(move || store.read()).await {
        Ok(settings) => (StatusCode::OK, Json(ApiResponse::success(settings))),
        Err(e) => blocking_failed::<BotSettings>("settings read", e),
    }
}

/// POST /api/settings - Validate, persist and echo the stored record
async fn post_settings(State(state): State<Arc<ServerState>>, body: Bytes) -> impl IntoResponse {
    let parsed = serde_json::from_slice::<serde_json::Value>(&body)
        .map_err(|e| ValidationError::Malformed {
            reason: e.to_string(),
        })
        .and_then(|value| SettingsUpdate::from_json(&value));

    let update = match parsed {
        Ok(update) => update,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<BotSettings>::error(e.to_string())),
            )
        }
    };

    let store = Arc::clone(&state.settings);
    let written = match tokio::task::spawn_blocking(move || store.write(&update)).await {
        Ok(written) => written,
        Err(e) => return blocking_failed::<BotSettings>("settings write", e),
    };

    match written {
        Ok(stored) => (StatusCode::OK, Json(ApiResponse::success(stored))),
        Err(SettingsError::Validation(e)) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(e.to_string())),
        ),
        Err(SettingsError::Store(e)) => {
            tracing::error!(error = %e, "Failed to persist settings");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Failed to save settings: {}", e))),
            )
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Prices
// ─────────────────────────────────────────────────────────────────

/// GET /api/prices - Cached snapshot, default snapshot when absent
async fn get_prices(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let cache = Arc::clone(&state.prices);
    match tokio::task::spawn_blocking(move || cache.read()).await {
        Ok(snapshot) => (StatusCode::OK, Json(ApiResponse::success(snapshot))),
        Err(e) => blocking_failed::<PriceSnapshot>("price cache read", e),
    }
}

/// Store I/O runs off the async workers; losing that task is a 500
fn blocking_failed<T: serde::Serialize>(
    what: &str,
    e: tokio::task::JoinError,
) -> (StatusCode, Json<ApiResponse<T>>) {
    tracing::error!(error = %e, "{} task failed", what);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::error(format!("{} failed", what))),
    )
}

// ─────────────────────────────────────────────────────────────────
// Cycle
// ─────────────────────────────────────────────────────────────────

/// POST /api/cycle - Run one cycle. Branch failures are data (200); only a
/// crashed cycle task is a 500.
async fn post_cycle(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    match state.trigger_cycle().await {
        Ok(result) => (StatusCode::OK, Json(ApiResponse::success(result))),
        Err(e) => {
            tracing::error!(error = %e, "Cycle aborted unexpectedly");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<CycleResult>::error(format!(
                    "Cycle aborted: {}",
                    e
                ))),
            )
        }
    }
}

/// GET /api/cycle/last - Most recent cycle result, if any
async fn get_last_cycle(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let last = state.last_cycle.read().await.clone();
    Json(ApiResponse::success(last))
}

/// GET /api/health - Liveness
async fn get_health() -> impl IntoResponse {
    Json(ApiResponse::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().timestamp_millis(),
    }))
}
