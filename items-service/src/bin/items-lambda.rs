//! Serverless entrypoint.
//!
//! The router and its [`AppState`] are built once per execution environment,
//! so the store handle cached by the connection manager survives across
//! invocations. Nothing is dialled until the first request needs it.

use items_service::config::ItemsConfig;
use items_service::services::init_metrics;
use items_service::{build_router, AppState};
use lambda_http::{run, Error};
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let otlp_endpoint = std::env::var("OTLP_ENDPOINT").ok();
    init_tracing("items-lambda", "info", otlp_endpoint.as_deref());

    if let Err(e) = init_metrics() {
        tracing::warn!("Metrics disabled: {}", e);
    }

    let config = ItemsConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let state = AppState::from_config(&config);
    tracing::info!(backend = ?config.store.backend, "Initialising Lambda runtime");

    run(build_router(state)).await
}
