use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde_json::{Value, json};
use tracing::info;

use crate::store::{Item, NewItem};

use super::AppState;
use super::error::ApiError;

/// POST /add-item
pub async fn add_item(
  State(state): State<AppState>,
  body: Result<Json<NewItem>, JsonRejection>,
) -> Result<Json<Item>, ApiError> {
  let Json(new_item) = body.map_err(|e| ApiError::Validation(e.body_text()))?;

  let item = state.store.append(new_item)?;
  info!("Added item {} ({})", item.id, item.name);
  Ok(Json(item))
}

/// GET /show-items
pub async fn show_items(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
  let items = state.store.list()?;
  Ok(Json(json!({ "Items": items })))
}
