use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::pokedex::LookupError;
use crate::store::StoreError;

use super::upload::UploadError;

/// Errors returned by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
  /// Lookup miss, surfaced as 404
  #[error("{0}")]
  NotFound(String),

  /// Request did not match the expected shape, surfaced as 422
  #[error("{0}")]
  Validation(String),

  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Upload(#[from] UploadError),
}

impl From<LookupError> for ApiError {
  fn from(err: LookupError) -> Self {
    ApiError::NotFound(err.to_string())
  }
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      ApiError::Upload(UploadError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
      ApiError::Upload(_) => StatusCode::BAD_REQUEST,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = match &self {
      ApiError::Upload(e) => json!({ "File Save Error": e.to_string() }),
      other => json!({ "detail": other.to_string() }),
    };
    (status, Json(body)).into_response()
  }
}
