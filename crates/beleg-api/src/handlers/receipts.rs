//! Handlers for `/api/receipts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/receipts` | Optional `?status=pending\|booked&page=&pageSize=` |
//! | `GET`  | `/api/receipts/:id` | 404 if not found |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use uuid::Uuid;

use beleg_core::{
  gateway::{LedgerClient, OcrExtractor, UploadStore},
  receipt::{ReceiptStatus, ReceiptView},
  store::{ListQuery, ReceiptStore},
};

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub status:    Option<String>,
  pub page:      Option<u32>,
  pub page_size: Option<u32>,
}

/// `GET /api/receipts[?status=<status>&page=<n>&pageSize=<n>]`
///
/// An unrecognised status filter is ignored rather than rejected.
pub async fn list<S, O, L, U>(
  State(state): State<AppState<S, O, L, U>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ReceiptView>>, ApiError>
where
  S: ReceiptStore + 'static,
  O: OcrExtractor + 'static,
  L: LedgerClient + 'static,
  U: UploadStore + 'static,
{
  let defaults = ListQuery::default();
  let query = ListQuery {
    status:    params.status.as_deref().and_then(ReceiptStatus::parse),
    page:      params.page.unwrap_or(defaults.page),
    page_size: params.page_size.unwrap_or(defaults.page_size),
  };

  let stored = state
    .store
    .list(query)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(stored.iter().map(|sr| sr.view()).collect()))
}

/// `GET /api/receipts/:id`
pub async fn get_one<S, O, L, U>(
  State(state): State<AppState<S, O, L, U>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ReceiptView>, ApiError>
where
  S: ReceiptStore + 'static,
  O: OcrExtractor + 'static,
  L: LedgerClient + 'static,
  U: UploadStore + 'static,
{
  let stored = state
    .store
    .get(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("receipt {id} not found")))?;
  Ok(Json(stored.view()))
}
