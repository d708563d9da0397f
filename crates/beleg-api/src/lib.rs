//! HTTP layer for the Beleg receipt service.
//!
//! Exposes an axum [`Router`] over any [`ReceiptStore`], [`OcrExtractor`],
//! [`LedgerClient`], and [`UploadStore`]. Authentication and TLS are the
//! deployment's responsibility; this layer is thin plumbing over the flows
//! in `beleg-core`.

pub mod error;
pub mod handlers;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use beleg_core::{
  gateway::{LedgerClient, OcrExtractor, UploadStore},
  store::ReceiptStore,
};

/// Uploads beyond this many bytes are rejected at the transport.
const MAX_UPLOAD_BYTES: usize = 10_000_000;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` with
/// `BELEG`-prefixed environment overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub store_path:      PathBuf,
  pub uploads_path:    PathBuf,
  pub ocr_api_base:    String,
  pub ledger_api_base: String,
  pub ledger_api_key:  String,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, O, L, U> {
  pub store:   Arc<S>,
  pub ocr:     Arc<O>,
  pub ledger:  Arc<L>,
  pub uploads: Arc<U>,
}

// Only the Arcs are cloned; the inner types need not be Clone.
impl<S, O, L, U> Clone for AppState<S, O, L, U> {
  fn clone(&self) -> Self {
    Self {
      store:   self.store.clone(),
      ocr:     self.ocr.clone(),
      ledger:  self.ledger.clone(),
      uploads: self.uploads.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the service.
pub fn router<S, O, L, U>(state: AppState<S, O, L, U>) -> Router
where
  S: ReceiptStore + 'static,
  O: OcrExtractor + 'static,
  L: LedgerClient + 'static,
  U: UploadStore + 'static,
{
  Router::new()
    .route("/api/upload", post(handlers::upload::handler::<S, O, L, U>))
    .route("/api/book", post(handlers::book::handler::<S, O, L, U>))
    .route("/api/receipts", get(handlers::receipts::list::<S, O, L, U>))
    .route("/api/receipts/{id}", get(handlers::receipts::get_one::<S, O, L, U>))
    .route("/healthz", get(handlers::health::handler))
    .layer(TraceLayer::new_for_http())
    .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use chrono::{NaiveDate, Utc};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use beleg_core::{
    extract::Extraction,
    gateway::VoucherRequest,
    receipt::{Receipt, ReceiptStatus},
    store::ReceiptStore as _,
  };
  use beleg_store_sqlite::SqliteStore;

  use super::*;

  struct StubOcr {
    result: Option<Extraction>,
  }

  impl OcrExtractor for StubOcr {
    async fn extract(&self, _file_path: &str) -> Option<Extraction> {
      self.result.clone()
    }
  }

  struct StubLedger {
    voucher: Option<String>,
    calls:   AtomicUsize,
  }

  impl LedgerClient for StubLedger {
    async fn create_voucher(&self, _request: &VoucherRequest) -> Option<String> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self.voucher.clone()
    }
  }

  struct StubUploads;

  impl UploadStore for StubUploads {
    type Error = std::convert::Infallible;

    async fn save(&self, _original_name: &str, _bytes: &[u8]) -> Result<String, Self::Error> {
      Ok("/uploads/stub.png".to_string())
    }
  }

  type TestState = AppState<SqliteStore, StubOcr, StubLedger, StubUploads>;

  async fn make_state(ocr: Option<Extraction>, voucher: Option<&str>) -> (TestState, Arc<StubLedger>) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let ledger = Arc::new(StubLedger {
      voucher: voucher.map(str::to_string),
      calls:   AtomicUsize::new(0),
    });
    let state = AppState {
      store:   Arc::new(store),
      ocr:     Arc::new(StubOcr { result: ocr }),
      ledger:  ledger.clone(),
      uploads: Arc::new(StubUploads),
    };
    (state, ledger)
  }

  async fn seed_pending(state: &TestState) -> Uuid {
    let receipt = Receipt {
      id:           Uuid::new_v4(),
      vendor:       "Office Depot AG".into(),
      invoice_date: NaiveDate::from_ymd_opt(2025, 1, 16).unwrap(),
      total:        "89.90".parse().unwrap(),
      vat:          "19.00".parse().unwrap(),
      currency:     "EUR".into(),
      status:       ReceiptStatus::Pending,
      raw_text:     Some("Rechnung".into()),
      file_path:    Some("/uploads/r1.png".into()),
      created_at:   Utc::now(),
      updated_at:   None,
      created_by:   None,
    };
    let id = receipt.id;
    state.store.create(receipt).await.unwrap();
    id
  }

  async fn send_json(
    state: TestState,
    method: &str,
    uri: &str,
    body: serde_json::Value,
  ) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
      serde_json::Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
  }

  async fn get_json(state: TestState, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  const BOUNDARY: &str = "beleg-test-boundary";

  fn multipart_body(field: &str, file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
      format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; \
         name=\"{field}\"; filename=\"{file_name}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
      )
      .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
  }

  async fn send_upload(
    state: TestState,
    field: &str,
    file_name: &str,
    content: &[u8],
  ) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
      .method("POST")
      .uri("/api/upload")
      .header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
      )
      .body(Body::from(multipart_body(field, file_name, content)))
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  // ── Health ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn healthz_returns_ok() {
    let (state, _) = make_state(None, None).await;
    let (status, json) = get_json(state, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
  }

  // ── Upload ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn upload_with_ocr_unavailable_uses_defaults() {
    let (state, _) = make_state(None, None).await;

    let (status, json) = send_upload(state, "file", "scan.png", b"png-bytes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["vendor"], "Uploaded Receipt");
    assert_eq!(json["total"], 0.0);
    assert_eq!(json["vat"], 0.0);
    assert_eq!(json["currency"], "EUR");
    assert_eq!(json["status"], "pending");
    assert!(json["voucherId"].is_null());
  }

  #[tokio::test]
  async fn upload_with_extraction_uses_extracted_fields() {
    let extraction = Extraction {
      vendor:       "Bäckerei Sonnig".into(),
      invoice_date: NaiveDate::from_ymd_opt(2025, 1, 17).unwrap(),
      total:        "5.40".parse().unwrap(),
      vat:          "7.00".parse().unwrap(),
      currency:     "EUR".into(),
      raw_text:     "Bäckerei Sonnig Rechnung".into(),
    };
    let (state, _) = make_state(Some(extraction), None).await;

    let (status, json) = send_upload(state, "file", "r2.png", b"png-bytes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["vendor"], "Bäckerei Sonnig");
    assert_eq!(json["total"], 5.4);
    assert_eq!(json["invoiceDate"], "2025-01-17");
    assert_eq!(json["status"], "pending");
  }

  #[tokio::test]
  async fn upload_without_file_part_is_rejected() {
    let (state, _) = make_state(None, None).await;
    let (status, json) = send_upload(state, "attachment", "scan.png", b"bytes").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("file is required"));
  }

  #[tokio::test]
  async fn upload_with_empty_file_is_rejected() {
    let (state, _) = make_state(None, None).await;
    let (status, _) = send_upload(state, "file", "scan.png", b"").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── Booking ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn book_unknown_receipt_returns_404() {
    let (state, _) = make_state(None, Some("V-100")).await;
    let (status, _) = send_json(
      state,
      "POST",
      "/api/book",
      serde_json::json!({ "receiptId": Uuid::new_v4() }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn book_applies_corrections_and_returns_voucher() {
    let (state, _) = make_state(None, Some("V-100")).await;
    let id = seed_pending(&state).await;

    let (status, json) = send_json(
      state.clone(),
      "POST",
      "/api/book",
      serde_json::json!({
        "receiptId": id,
        "corrections": { "total": "42.50", "invoiceDate": "not-a-date" }
      }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["voucherId"], "V-100");

    let (status, json) = get_json(state, &format!("/api/receipts/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "booked");
    assert_eq!(json["total"], 42.5);
    // The bad date correction was dropped; the original date survives.
    assert_eq!(json["invoiceDate"], "2025-01-16");
    assert_eq!(json["voucherId"], "V-100");
  }

  #[tokio::test]
  async fn book_twice_short_circuits_without_second_ledger_call() {
    let (state, ledger) = make_state(None, Some("V-100")).await;
    let id = seed_pending(&state).await;
    let body = serde_json::json!({ "receiptId": id });

    let (_, first) = send_json(state.clone(), "POST", "/api/book", body.clone()).await;
    let (status, second) = send_json(state, "POST", "/api/book", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["voucherId"], "V-100");
    assert_eq!(second["voucherId"], "V-100");
    assert_eq!(ledger.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn failed_ledger_returns_502_and_receipt_stays_pending() {
    let (state, _) = make_state(None, None).await;
    let id = seed_pending(&state).await;

    let (status, _) = send_json(
      state.clone(),
      "POST",
      "/api/book",
      serde_json::json!({ "receiptId": id }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, json) = get_json(state, &format!("/api/receipts/{id}")).await;
    assert_eq!(json["status"], "pending");
    assert!(json["voucherId"].is_null());
  }

  // ── Receipts ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn receipts_list_filters_by_status() {
    let (state, _) = make_state(None, Some("V-100")).await;
    let pending_id = seed_pending(&state).await;
    let booked_id = seed_pending(&state).await;

    send_json(
      state.clone(),
      "POST",
      "/api/book",
      serde_json::json!({ "receiptId": booked_id }),
    )
    .await;

    let (status, json) = get_json(state.clone(), "/api/receipts?status=booked").await;
    assert_eq!(status, StatusCode::OK);
    let listed = json.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], booked_id.to_string());
    assert_eq!(listed[0]["voucherId"], "V-100");

    // An invalid filter is ignored: both receipts come back.
    let (_, json) = get_json(state, "/api/receipts?status=archived").await;
    let ids: Vec<_> = json
      .as_array()
      .unwrap()
      .iter()
      .map(|r| r["id"].as_str().unwrap().to_string())
      .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&pending_id.to_string()));
    assert!(ids.contains(&booked_id.to_string()));
  }

  #[tokio::test]
  async fn receipt_get_unknown_returns_404() {
    let (state, _) = make_state(None, None).await;
    let (status, _) = get_json(state, &format!("/api/receipts/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}
