//! Async HTTP client for the external accounting ledger's voucher API.

use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use beleg_core::gateway::{LedgerClient, VoucherRequest};

use crate::Result;

/// Connection settings for the ledger service. Immutable after startup.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
  pub api_base: String,
  pub api_key:  String,
}

/// HTTP implementation of [`LedgerClient`].
///
/// A single-attempt call with a bounded timeout; retry policy belongs to
/// the caller.
#[derive(Clone)]
pub struct HttpLedgerClient {
  client: reqwest::Client,
  config: LedgerConfig,
}

impl HttpLedgerClient {
  pub fn new(config: LedgerConfig) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
  }
}

/// Wire shape of the voucher-creation request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoucherBody<'a> {
  vendor:   &'a str,
  date:     NaiveDate,
  #[serde(with = "rust_decimal::serde::float")]
  total:    Decimal,
  #[serde(with = "rust_decimal::serde::float")]
  vat:      Decimal,
  currency: &'a str,
  raw_text: Option<&'a str>,
}

impl<'a> VoucherBody<'a> {
  fn from_request(request: &'a VoucherRequest) -> Self {
    Self {
      vendor:   &request.vendor,
      date:     request.date,
      total:    request.total,
      vat:      request.vat,
      currency: &request.currency,
      raw_text: request.raw_text.as_deref(),
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoucherResponse {
  voucher_id: String,
}

impl LedgerClient for HttpLedgerClient {
  async fn create_voucher(&self, request: &VoucherRequest) -> Option<String> {
    let response = match self
      .client
      .post(self.url("/api/v1/vouchers"))
      .header("x-api-key", &self.config.api_key)
      .json(&VoucherBody::from_request(request))
      .send()
      .await
    {
      Ok(response) => response,
      Err(e) => {
        tracing::warn!(error = %e, "failed to call ledger service");
        return None;
      }
    };

    if !response.status().is_success() {
      tracing::warn!(status = %response.status(), "ledger returned non-success");
      return None;
    }

    let parsed = match response.json::<VoucherResponse>().await {
      Ok(parsed) => parsed,
      Err(e) => {
        tracing::warn!(error = %e, "unable to deserialise voucher payload");
        return None;
      }
    };

    // An empty identifier in a 2xx response is still a failed booking.
    if parsed.voucher_id.trim().is_empty() {
      tracing::warn!("ledger returned blank voucher id");
      return None;
    }

    Some(parsed.voucher_id)
  }
}
