#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use items_service::config::ItemsConfig;
use items_service::services::{Connector, InMemoryItemStore, ItemStore};
use items_service::startup::{build_router, AppState, Application};
use mongodb::bson::{oid::ObjectId, Bson, Document};
use serde_json::Value;
use service_core::error::AppError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

/// In-memory store that counts every data call and every close.
#[derive(Default)]
pub struct CountingStore {
    inner: InMemoryItemStore,
    pub calls: AtomicUsize,
    pub closes: AtomicUsize,
}

impl CountingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ItemStore for CountingStore {
    async fn list_newest_first(&self) -> Result<Vec<Document>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_newest_first().await
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Document>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_id(id).await
    }

    async fn insert(&self, item: Document) -> Result<Bson, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(item).await
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Store whose every operation fails like a dropped connection.
pub struct FailingStore;

fn store_down() -> AppError {
    AppError::database(anyhow::anyhow!("connection reset by peer"))
}

#[async_trait]
impl ItemStore for FailingStore {
    async fn list_newest_first(&self) -> Result<Vec<Document>, AppError> {
        Err(store_down())
    }

    async fn find_by_id(&self, _id: ObjectId) -> Result<Option<Document>, AppError> {
        Err(store_down())
    }

    async fn insert(&self, _item: Document) -> Result<Bson, AppError> {
        Err(store_down())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Err(store_down())
    }
}

/// Connector that hands out one shared store, counts connects, optionally
/// fails the first `failures` attempts and can be slowed down to widen races.
pub struct CountingConnector {
    store: Arc<dyn ItemStore>,
    pub connects: AtomicUsize,
    failures: usize,
    delay: Duration,
}

impl CountingConnector {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self {
            store,
            connects: AtomicUsize::new(0),
            failures: 0,
            delay: Duration::ZERO,
        }
    }

    pub fn failing_first(mut self, failures: usize) -> Self {
        self.failures = failures;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for CountingConnector {
    async fn connect(&self) -> Result<Arc<dyn ItemStore>, AppError> {
        let attempt = self.connects.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if attempt < self.failures {
            return Err(AppError::database(anyhow::anyhow!(
                "server selection timeout"
            )));
        }
        Ok(Arc::clone(&self.store))
    }

    fn backend(&self) -> &'static str {
        "test"
    }
}

/// Router wired to a counting store and connector.
pub struct TestRouter {
    pub router: Router,
    pub store: Arc<CountingStore>,
    pub connector: Arc<CountingConnector>,
}

impl TestRouter {
    pub fn new() -> Self {
        let store = Arc::new(CountingStore::default());
        let connector = Arc::new(CountingConnector::new(store.clone()));
        Self::with(store, connector)
    }

    pub fn with(store: Arc<CountingStore>, connector: Arc<CountingConnector>) -> Self {
        let router = build_router(AppState::new(connector.clone()));
        Self {
            router,
            store,
            connector,
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        get(&self.router, uri).await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        post_raw(&self.router, uri, body.to_string()).await
    }

    pub async fn post_raw(&self, uri: &str, body: String) -> (StatusCode, Value) {
        post_raw(&self.router, uri, body).await
    }
}

pub fn router_with_store(store: Arc<dyn ItemStore>) -> Router {
    build_router(AppState::new(Arc::new(CountingConnector::new(store))))
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

pub async fn post_json(router: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    post_raw(router, uri, body.to_string()).await
}

pub async fn post_raw(router: &Router, uri: &str, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    send(router, request).await
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

/// A running `items-service` on a random port.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub state: AppState,
}

impl TestApp {
    /// Spawns with the in-memory backend.
    pub async fn spawn() -> Self {
        Self::spawn_with(ItemsConfig::in_memory(0)).await
    }

    pub async fn spawn_with(config: ItemsConfig) -> Self {
        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let state = app.state().clone();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            port,
            state,
        }
    }
}
