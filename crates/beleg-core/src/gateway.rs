//! Contracts for the three external collaborators: the OCR service, the
//! accounting ledger, and the upload file store.
//!
//! The HTTP clients (`beleg-clients`) absorb every transport and payload
//! fault behind these boundaries: the traits signal absence (`None`) instead
//! of erroring, so a caller cannot forget to handle the failure path.

use std::future::Future;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::extract::Extraction;

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// The corrected receipt fields sent to the ledger for voucher creation.
#[derive(Debug, Clone, PartialEq)]
pub struct VoucherRequest {
  pub vendor:   String,
  pub date:     NaiveDate,
  pub total:    Decimal,
  pub vat:      Decimal,
  pub currency: String,
  pub raw_text: Option<String>,
}

/// Client for the external accounting ledger.
///
/// `create_voucher` is a single attempt with a bounded timeout inherited
/// from the transport; retry policy, if any, belongs to the caller. `None`
/// covers every failure mode: non-success response, blank identifier,
/// malformed payload, transport fault.
pub trait LedgerClient: Send + Sync {
  fn create_voucher<'a>(
    &'a self,
    request: &'a VoucherRequest,
  ) -> impl Future<Output = Option<String>> + Send + 'a;
}

// ─── OCR ─────────────────────────────────────────────────────────────────────

/// Client for the external OCR extraction service.
///
/// `None` means "unavailable": missing file, non-success response, malformed
/// payload, or transport fault. An unparsable invoice date inside an
/// otherwise usable payload falls back to today instead of failing the
/// whole extraction.
pub trait OcrExtractor: Send + Sync {
  fn extract<'a>(
    &'a self,
    file_path: &'a str,
  ) -> impl Future<Output = Option<Extraction>> + Send + 'a;
}

// ─── Uploads ─────────────────────────────────────────────────────────────────

/// Durable storage for uploaded files.
///
/// `save` stores the bytes under a generated collision-proof name that
/// preserves the original extension, and returns the stored reference.
pub trait UploadStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn save<'a>(
    &'a self,
    original_name: &'a str,
    bytes: &'a [u8],
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}
