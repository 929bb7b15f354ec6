use crate::models::item::{document_to_json, prepare_new_item};
use crate::models::{InsertResponse, ItemId};
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use service_core::error::AppError;

#[tracing::instrument(skip(state))]
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Value>>, AppError> {
    let relabel = |e: AppError| e.with_message("Error fetching items");

    let store = state.connections.get_database().await.map_err(relabel)?;
    let items = store.list_newest_first().await.map_err(relabel)?;

    tracing::debug!(count = items.len(), "Fetched items");
    Ok(Json(items.into_iter().map(document_to_json).collect()))
}

#[tracing::instrument(skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    // Malformed ids never reach the store.
    let id = ItemId::parse(&id)?;
    let relabel = |e: AppError| e.with_message("Server error");

    let store = state.connections.get_database().await.map_err(relabel)?;
    match store.find_by_id(id.object_id()).await.map_err(relabel)? {
        Some(item) => Ok(Json(document_to_json(item))),
        None => Err(AppError::NotFound("Not found".to_string())),
    }
}

#[tracing::instrument(skip(state, payload))]
pub async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<InsertResponse>), AppError> {
    let Json(body) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let Value::Object(fields) = body else {
        return Err(AppError::BadRequest(
            "Item must be a JSON object".to_string(),
        ));
    };
    let item = prepare_new_item(fields);
    let relabel = |e: AppError| e.with_message("Error saving");

    let store = state.connections.get_database().await.map_err(relabel)?;
    let inserted_id = store.insert(item).await.map_err(relabel)?;

    tracing::info!(inserted_id = %inserted_id, "Item created");
    Ok((StatusCode::CREATED, Json(InsertResponse::new(inserted_id))))
}
