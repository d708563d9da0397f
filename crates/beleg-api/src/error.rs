//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use beleg_core::{BookError, IngestError};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The ledger rejected the booking or was unreachable.
  #[error("bad gateway: {0}")]
  Gateway(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Gateway(m) => (StatusCode::BAD_GATEWAY, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

impl From<BookError> for ApiError {
  fn from(e: BookError) -> Self {
    match e {
      BookError::NotFound => ApiError::NotFound("receipt not found".to_string()),
      BookError::Gateway => ApiError::Gateway("failed to book receipt".to_string()),
      BookError::Store(inner) => ApiError::Store(inner),
    }
  }
}

impl From<IngestError> for ApiError {
  fn from(e: IngestError) -> Self {
    match e {
      IngestError::EmptyFile => ApiError::BadRequest("file is required".to_string()),
      IngestError::Upload(inner) | IngestError::Store(inner) => ApiError::Store(inner),
    }
  }
}
