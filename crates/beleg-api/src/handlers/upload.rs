//! Handler for `POST /api/upload` — multipart receipt ingestion.

use axum::{
  Json,
  extract::{Multipart, State},
};

use beleg_core::{
  flow::IngestFlow,
  gateway::{LedgerClient, OcrExtractor, UploadStore},
  receipt::{ReceiptView, StoredReceipt},
  store::ReceiptStore,
};

use crate::{AppState, error::ApiError};

/// `POST /api/upload` — multipart body with a `file` part.
///
/// Ingestion is best-effort with respect to OCR: the upload succeeds and
/// yields a `Pending` receipt even when extraction is unavailable.
pub async fn handler<S, O, L, U>(
  State(state): State<AppState<S, O, L, U>>,
  mut multipart: Multipart,
) -> Result<Json<ReceiptView>, ApiError>
where
  S: ReceiptStore + 'static,
  O: OcrExtractor + 'static,
  L: LedgerClient + 'static,
  U: UploadStore + 'static,
{
  let mut file: Option<(String, Vec<u8>)> = None;

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
  {
    if field.name() == Some("file") {
      let original_name = field
        .file_name()
        .unwrap_or("upload.bin")
        .to_string();
      let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::BadRequest(format!("unreadable file part: {e}")))?;
      file = Some((original_name, bytes.to_vec()));
      break;
    }
  }

  let Some((original_name, bytes)) = file else {
    return Err(ApiError::BadRequest("file is required".to_string()));
  };

  let flow = IngestFlow::new(
    state.store.clone(),
    state.ocr.clone(),
    state.uploads.clone(),
  );
  let receipt = flow.ingest(&original_name, &bytes, None).await?;

  let stored = StoredReceipt { receipt, booking: None };
  Ok(Json(stored.view()))
}
