use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use service_core::error::AppError;
use std::sync::Arc;

/// The store primitives the route handlers need. One implementation talks to
/// MongoDB, the other keeps documents in memory.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Every document, newest `_id` first.
    async fn list_newest_first(&self) -> Result<Vec<Document>, AppError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Document>, AppError>;

    /// Inserts and returns the `_id` the document ended up with.
    async fn insert(&self, item: Document) -> Result<Bson, AppError>;

    async fn ping(&self) -> Result<(), AppError>;

    /// Releases the underlying session. Only called on graceful shutdown.
    async fn close(&self) {}
}

/// Establishes a session to a store. Called at most once per successful
/// connection by [`ConnectionManager`](super::ConnectionManager).
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn ItemStore>, AppError>;

    /// Short label used in logs and metrics.
    fn backend(&self) -> &'static str;
}
