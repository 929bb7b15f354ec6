mod common;

use axum::http::StatusCode;
use common::TestApp;
use items_service::config::{ItemsConfig, MongoConfig, StoreBackend, StoreConfig};
use items_service::services::{ConnectionManager, MongoConnector, MongoDb};
use items_service::{build_router, AppState};
use mongodb::bson::oid::ObjectId;
use serde_json::json;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;

fn mongo_config() -> MongoConfig {
    MongoConfig {
        uri: std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
        database: format!("items_test_{}", ObjectId::new().to_hex()),
        collection: "products".to_string(),
    }
}

async fn drop_database(config: &MongoConfig) {
    if let Ok(mongo) = MongoDb::connect(&config.uri, &config.database).await {
        let _ = mongo.database().drop(None).await;
    }
}

#[tokio::test]
#[ignore = "Requires MongoDB at MONGODB_URI (default mongodb://localhost:27017)"]
async fn crud_round_trip_against_mongodb() {
    let config = mongo_config();
    let router = build_router(AppState::new(Arc::new(MongoConnector::new(config.clone()))));

    let (status, created) =
        common::post_json(&router, "/api/items", &json!({"name": "Widget", "price": "9.5"}))
            .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["insertedId"].as_str().unwrap().to_string();

    common::post_json(&router, "/api/items", &json!({"name": "Gadget"})).await;

    let (status, items) = common::get(&router, "/api/items").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(items[0]["name"], "Gadget");
    assert_eq!(items[1]["name"], "Widget");
    assert_eq!(items[1]["price"], 9.5);

    let (status, item) = common::get(&router, &format!("/api/items/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["_id"], json!(id));
    assert!(item["createdAt"].is_string());

    let (status, _) =
        common::get(&router, &format!("/api/items/{}", ObjectId::new().to_hex())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    drop_database(&config).await;
}

#[tokio::test]
#[ignore = "Requires MongoDB at MONGODB_URI (default mongodb://localhost:27017)"]
async fn manager_reuses_one_mongodb_client() {
    let config = mongo_config();
    let manager = ConnectionManager::new(Arc::new(MongoConnector::new(config.clone())));

    let first = manager.get_database().await.expect("connect to MongoDB");
    let second = manager.get_database().await.expect("cached handle");
    assert!(Arc::ptr_eq(&first, &second));
    first.ping().await.expect("ping");

    drop_database(&config).await;
    manager.shutdown().await;
}

fn unreachable_config() -> MongoConfig {
    MongoConfig {
        uri: "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200&connectTimeoutMS=200"
            .to_string(),
        database: "items_unreachable".to_string(),
        collection: "products".to_string(),
    }
}

#[tokio::test]
async fn unreachable_mongodb_yields_server_error() {
    let config = unreachable_config();
    let router = build_router(AppState::new(Arc::new(MongoConnector::new(config))));

    let (status, body) = common::get(&router, "/api/items").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error fetching items");
    assert!(body["error"].is_string());

    // Malformed ids still short-circuit before any connection attempt.
    let (status, _) = common::get(&router, "/api/items/123").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn server_starts_listening_when_warm_up_fails() {
    let config = ItemsConfig {
        common: CoreConfig { port: 0 },
        mongodb: unreachable_config(),
        store: StoreConfig {
            backend: StoreBackend::Mongodb,
        },
    };
    let app = TestApp::spawn_with(config).await;
    assert!(!app.state.connections.is_connected());
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{}/api/items", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Error fetching items");
}
