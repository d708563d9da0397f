//! Handler for `POST /api/book` — the booking request boundary.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use beleg_core::{
  correction::Corrections,
  flow::BookingFlow,
  gateway::{LedgerClient, OcrExtractor, UploadStore},
  store::ReceiptStore,
};

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
  pub receipt_id:  Uuid,
  #[serde(default)]
  pub corrections: Option<Corrections>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
  pub voucher_id: String,
}

/// `POST /api/book` — body: `{"receiptId": "...", "corrections": {...}}`
pub async fn handler<S, O, L, U>(
  State(state): State<AppState<S, O, L, U>>,
  Json(body): Json<BookRequest>,
) -> Result<Json<BookResponse>, ApiError>
where
  S: ReceiptStore + 'static,
  O: OcrExtractor + 'static,
  L: LedgerClient + 'static,
  U: UploadStore + 'static,
{
  let flow = BookingFlow::new(state.store.clone(), state.ledger.clone());
  let voucher_id = flow
    .book(body.receipt_id, body.corrections.as_ref())
    .await?;
  Ok(Json(BookResponse { voucher_id }))
}
