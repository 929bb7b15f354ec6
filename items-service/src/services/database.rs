use crate::config::MongoConfig;
use crate::services::metrics::record_store_operation;
use crate::services::store::{Connector, ItemStore};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, Document},
    options::{ClientOptions, FindOptions, ServerApi, ServerApiVersion},
    Client as MongoClient, Collection, Database,
};
use service_core::error::AppError;
use std::sync::Arc;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    /// Builds a client pinned to Stable API v1 and pings the deployment, so a
    /// bad URI or unreachable cluster fails here rather than on first query.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let mut options = ClientOptions::parse(uri).await.map_err(|e| {
            tracing::error!("Failed to parse MongoDB connection string: {}", e);
            AppError::from(e)
        })?;
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );
        options.app_name = Some("items-service".to_string());

        let client = MongoClient::with_options(options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        let mongo = Self { client, db };
        mongo.health_check().await?;

        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(mongo)
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

/// [`ItemStore`] over one MongoDB collection.
pub struct MongoItemStore {
    mongo: MongoDb,
    items: Collection<Document>,
}

impl MongoItemStore {
    pub fn new(mongo: MongoDb, collection: &str) -> Self {
        let items = mongo.collection(collection);
        Self { mongo, items }
    }
}

#[async_trait]
impl ItemStore for MongoItemStore {
    async fn list_newest_first(&self) -> Result<Vec<Document>, AppError> {
        let find_options = FindOptions::builder().sort(doc! { "_id": -1 }).build();

        let result: Result<Vec<Document>, mongodb::error::Error> = async {
            let cursor = self.items.find(None, find_options).await?;
            cursor.try_collect().await
        }
        .await;

        record_store_operation("list", result.is_ok());
        result.map_err(AppError::from)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Document>, AppError> {
        let result = self.items.find_one(doc! { "_id": id }, None).await;
        record_store_operation("find_by_id", result.is_ok());
        result.map_err(AppError::from)
    }

    async fn insert(&self, item: Document) -> Result<Bson, AppError> {
        let result = self.items.insert_one(item, None).await;
        record_store_operation("insert", result.is_ok());
        result.map(|r| r.inserted_id).map_err(AppError::from)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.mongo.health_check().await
    }

    async fn close(&self) {
        tracing::info!("Shutting down MongoDB client");
        self.mongo.client().clone().shutdown().await;
    }
}

/// Connects to the configured MongoDB deployment on demand.
pub struct MongoConnector {
    config: MongoConfig,
}

impl MongoConnector {
    pub fn new(config: MongoConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for MongoConnector {
    async fn connect(&self) -> Result<Arc<dyn ItemStore>, AppError> {
        let mongo = MongoDb::connect(&self.config.uri, &self.config.database).await?;
        Ok(Arc::new(MongoItemStore::new(mongo, &self.config.collection)))
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}
