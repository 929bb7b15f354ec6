use crate::services::metrics::record_store_operation;
use crate::services::store::{Connector, ItemStore};
use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use service_core::error::AppError;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-local store used for development and tests. Assigns ObjectIds the
/// same way the server does, so ordering by `_id` is insertion order.
#[derive(Default)]
pub struct InMemoryItemStore {
    items: RwLock<Vec<Document>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

/// Position of a value in MongoDB's cross-type sort order.
fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::MinKey => 1,
        Bson::Null | Bson::Undefined => 2,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 3,
        Bson::String(_) | Bson::Symbol(_) => 4,
        Bson::Document(_) => 5,
        Bson::Array(_) => 6,
        Bson::Binary(_) => 7,
        Bson::ObjectId(_) => 8,
        Bson::Boolean(_) => 9,
        Bson::DateTime(_) => 10,
        Bson::Timestamp(_) => 11,
        Bson::RegularExpression(_) => 12,
        Bson::MaxKey => 13,
        _ => 5,
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Ascending order of two `_id` values: by type rank first, then by value
/// for the types an `_id` realistically holds. Other same-rank pairs tie.
fn compare_ids(a: &Bson, b: &Bson) -> Ordering {
    type_rank(a)
        .cmp(&type_rank(b))
        .then_with(|| match (a, b) {
            (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
            (Bson::String(x), Bson::String(y)) => x.cmp(y),
            (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
            (Bson::DateTime(x), Bson::DateTime(y)) => x.cmp(y),
            _ => match (as_f64(a), as_f64(b)) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            },
        })
}

fn newest_first(a: &Document, b: &Document) -> Ordering {
    match (a.get("_id"), b.get("_id")) {
        (Some(x), Some(y)) => compare_ids(y, x),
        (x, y) => y.is_some().cmp(&x.is_some()),
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn list_newest_first(&self) -> Result<Vec<Document>, AppError> {
        let mut items = self.items.read().await.clone();
        items.sort_by(newest_first);
        record_store_operation("list", true);
        Ok(items)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Document>, AppError> {
        let items = self.items.read().await;
        let found = items
            .iter()
            .find(|d| d.get_object_id("_id").map(|oid| oid == id).unwrap_or(false))
            .cloned();
        record_store_operation("find_by_id", true);
        Ok(found)
    }

    async fn insert(&self, item: Document) -> Result<Bson, AppError> {
        let mut items = self.items.write().await;

        let id = match item.get("_id") {
            Some(id) => {
                if items.iter().any(|d| d.get("_id") == Some(id)) {
                    record_store_operation("insert", false);
                    return Err(AppError::database(anyhow::anyhow!(
                        "duplicate key error: _id {} already exists",
                        id
                    )));
                }
                id.clone()
            }
            None => Bson::ObjectId(ObjectId::new()),
        };

        let mut stored = Document::new();
        stored.insert("_id", id.clone());
        for (key, value) in item {
            if key != "_id" {
                stored.insert(key, value);
            }
        }
        items.push(stored);

        record_store_operation("insert", true);
        Ok(id)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Hands out a fresh [`InMemoryItemStore`] on connect.
#[derive(Default)]
pub struct InMemoryConnector;

#[async_trait]
impl Connector for InMemoryConnector {
    async fn connect(&self) -> Result<Arc<dyn ItemStore>, AppError> {
        Ok(Arc::new(InMemoryItemStore::new()))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
