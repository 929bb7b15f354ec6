use crate::services::get_metrics;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "Items API is live" }))
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "items-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Ready once a store handle exists and answers a ping.
pub async fn readiness_check(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    let store = state.connections.get_database().await.map_err(|e| {
        tracing::warn!(error = %e, "Readiness check could not obtain a store handle");
        AppError::ServiceUnavailable
    })?;
    store.ping().await.map_err(|e| {
        tracing::warn!(error = %e, "Readiness ping failed");
        AppError::ServiceUnavailable
    })?;
    Ok(StatusCode::OK)
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}

pub async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}
