use crate::config::{ItemsConfig, StoreBackend};
use crate::handlers;
use crate::services::{ConnectionManager, Connector, InMemoryConnector, MongoConnector};
use axum::{middleware, routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub connections: Arc<ConnectionManager>,
}

impl AppState {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connections: Arc::new(ConnectionManager::new(connector)),
        }
    }

    /// State for the configured backend. Nothing is dialled until the first
    /// `get_database` call.
    pub fn from_config(config: &ItemsConfig) -> Self {
        let connector: Arc<dyn Connector> = match config.store.backend {
            StoreBackend::Mongodb => Arc::new(MongoConnector::new(config.mongodb.clone())),
            StoreBackend::Memory => Arc::new(InMemoryConnector),
        };
        Self::new(connector)
    }
}

/// Routes shared by the long-running server and the Lambda adapter.
pub fn build_router(state: AppState) -> Router {
    let items = Router::new()
        .route(
            "/api/items",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route("/api/items/:id", get(handlers::get_item));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .merge(items)
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type Server = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>;

pub struct Application {
    port: u16,
    server: Server,
    state: AppState,
}

impl Application {
    /// Binds the listener and warms the store connection. A failed warm-up is
    /// logged and the server starts anyway; requests retry the connect.
    pub async fn build(config: ItemsConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(&config);

        if let Err(e) = state.connections.get_database().await {
            tracing::warn!(
                error = %e,
                "Store unavailable at start-up; connection will be retried on demand"
            );
        }

        let app = build_router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
        };

        Ok(Self {
            port,
            server: Box::pin(server),
            state,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serves until a shutdown signal, then closes the store connection.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let result = self.server.await;
        self.state.connections.shutdown().await;
        tracing::info!("Server stopped");
        result
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
