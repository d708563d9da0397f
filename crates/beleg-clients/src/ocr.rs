//! Async HTTP client for the external OCR extraction service.

use std::{path::Path, time::Duration};

use chrono::{NaiveDate, Utc};
use reqwest::multipart;
use rust_decimal::Decimal;
use serde::Deserialize;

use beleg_core::{
  extract::{Extraction, FALLBACK_CURRENCY},
  gateway::OcrExtractor,
};

use crate::Result;

/// Connection settings for the OCR service.
#[derive(Debug, Clone)]
pub struct OcrConfig {
  pub api_base: String,
}

/// HTTP implementation of [`OcrExtractor`].
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpOcrClient {
  client: reqwest::Client,
  config: OcrConfig,
}

impl HttpOcrClient {
  pub fn new(config: OcrConfig) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
  }
}

/// Wire shape of the OCR service's JSON response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OcrResponse {
  vendor:       String,
  invoice_date: String,
  #[serde(with = "rust_decimal::serde::float")]
  total:        Decimal,
  #[serde(with = "rust_decimal::serde::float")]
  vat:          Decimal,
  currency:     Option<String>,
  raw_text:     Option<String>,
}

impl OcrResponse {
  fn into_extraction(self) -> Extraction {
    // A bad date inside an otherwise usable payload falls back to today
    // instead of discarding the whole extraction.
    let invoice_date = match self.invoice_date.parse::<NaiveDate>() {
      Ok(date) => date,
      Err(_) => {
        tracing::warn!(value = %self.invoice_date, "unparsable invoice date from OCR, using today");
        Utc::now().date_naive()
      }
    };

    Extraction {
      vendor: self.vendor,
      invoice_date,
      total: self.total,
      vat: self.vat,
      currency: self.currency.unwrap_or_else(|| FALLBACK_CURRENCY.to_string()),
      raw_text: self.raw_text.unwrap_or_default(),
    }
  }
}

impl OcrExtractor for HttpOcrClient {
  async fn extract(&self, file_path: &str) -> Option<Extraction> {
    let bytes = match tokio::fs::read(file_path).await {
      Ok(bytes) => bytes,
      Err(e) => {
        tracing::warn!(file_path, error = %e, "OCR extract called with unreadable file");
        return None;
      }
    };

    let file_name = Path::new(file_path)
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "upload.bin".to_string());

    let part = multipart::Part::bytes(bytes)
      .file_name(file_name)
      .mime_str("application/octet-stream")
      .ok()?;
    let form = multipart::Form::new().part("file", part);

    let response = match self
      .client
      .post(self.url("/ocr/extract"))
      .multipart(form)
      .send()
      .await
    {
      Ok(response) => response,
      Err(e) => {
        tracing::warn!(error = %e, "failed to call OCR service");
        return None;
      }
    };

    if !response.status().is_success() {
      tracing::warn!(status = %response.status(), "OCR service returned non-success");
      return None;
    }

    match response.json::<OcrResponse>().await {
      Ok(payload) => Some(payload.into_extraction()),
      Err(e) => {
        tracing::warn!(error = %e, "unable to deserialise OCR payload");
        None
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use axum::{Json, Router, routing::post};
  use serde_json::json;

  use super::*;

  async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
  }

  fn sample_file() -> tempfile::NamedTempFile {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), b"png-bytes").unwrap();
    file
  }

  fn client(api_base: String) -> HttpOcrClient {
    HttpOcrClient::new(OcrConfig { api_base }).unwrap()
  }

  #[tokio::test]
  async fn extract_parses_structured_response() {
    let app = Router::new().route(
      "/ocr/extract",
      post(|| async {
        Json(json!({
          "vendor": "Office Depot AG",
          "invoiceDate": "2025-01-16",
          "total": 89.90,
          "vat": 19.00,
          "currency": "EUR",
          "rawText": "Office Depot AG Rechnung"
        }))
      }),
    );
    let base = serve(app).await;
    let file = sample_file();

    let extraction = client(base)
      .extract(file.path().to_str().unwrap())
      .await
      .expect("extraction available");

    assert_eq!(extraction.vendor, "Office Depot AG");
    assert_eq!(
      extraction.invoice_date,
      NaiveDate::from_ymd_opt(2025, 1, 16).unwrap(),
    );
    assert_eq!(extraction.total, "89.9".parse().unwrap());
    assert_eq!(extraction.currency, "EUR");
  }

  #[tokio::test]
  async fn bad_invoice_date_falls_back_to_today() {
    let app = Router::new().route(
      "/ocr/extract",
      post(|| async {
        Json(json!({
          "vendor": "Office Depot AG",
          "invoiceDate": "16.01.2025",
          "total": 1.0,
          "vat": 0.0
        }))
      }),
    );
    let base = serve(app).await;
    let file = sample_file();

    let extraction = client(base)
      .extract(file.path().to_str().unwrap())
      .await
      .expect("extraction available");

    assert_eq!(extraction.invoice_date, Utc::now().date_naive());
    // Omitted currency and rawText take their defaults.
    assert_eq!(extraction.currency, "EUR");
    assert_eq!(extraction.raw_text, "");
  }

  #[tokio::test]
  async fn missing_file_is_unavailable() {
    let app = Router::new();
    let base = serve(app).await;

    let result = client(base).extract("/nonexistent/receipt.png").await;
    assert!(result.is_none());
  }

  #[tokio::test]
  async fn non_success_response_is_unavailable() {
    let app = Router::new().route(
      "/ocr/extract",
      post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let base = serve(app).await;
    let file = sample_file();

    let result = client(base).extract(file.path().to_str().unwrap()).await;
    assert!(result.is_none());
  }

  #[tokio::test]
  async fn malformed_payload_is_unavailable() {
    let app = Router::new().route("/ocr/extract", post(|| async { "not json" }));
    let base = serve(app).await;
    let file = sample_file();

    let result = client(base).extract(file.path().to_str().unwrap()).await;
    assert!(result.is_none());
  }

  #[tokio::test]
  async fn unreachable_service_is_unavailable() {
    // Bind a listener to reserve a port, then drop it so nothing answers.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let file = sample_file();

    let result = client(base).extract(file.path().to_str().unwrap()).await;
    assert!(result.is_none());
  }
}
