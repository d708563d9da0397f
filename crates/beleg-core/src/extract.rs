//! The OCR extraction result and the fixed ingestion defaults.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A best-effort structured guess produced by the OCR service for one
/// uploaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
  pub vendor:       String,
  pub invoice_date: NaiveDate,
  pub total:        Decimal,
  pub vat:          Decimal,
  pub currency:     String,
  pub raw_text:     String,
}

/// Vendor used when extraction is unavailable.
pub const FALLBACK_VENDOR: &str = "Uploaded Receipt";

/// Currency used when extraction is unavailable or omits one.
pub const FALLBACK_CURRENCY: &str = "EUR";
