//! Receipt and Booking — the two persistent entities of the service.
//!
//! A receipt moves through exactly one status transition in its lifetime:
//! `Pending → Booked`, fired by the booking flow. A booking exists if and
//! only if the receipt is `Booked`, and holds the voucher identifier the
//! external ledger assigned.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Status ──────────────────────────────────────────────────────────────────

/// The booking state of a receipt. There are no other states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
  Pending,
  Booked,
}

impl ReceiptStatus {
  /// The discriminant string stored in the `status` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Booked => "booked",
    }
  }

  /// Case-insensitive parse; `None` for anything unrecognised.
  /// Used for the list filter, where an invalid filter is simply ignored.
  pub fn parse(s: &str) -> Option<Self> {
    match s.to_ascii_lowercase().as_str() {
      "pending" => Some(Self::Pending),
      "booked" => Some(Self::Booked),
      _ => None,
    }
  }
}

// ─── Receipt ─────────────────────────────────────────────────────────────────

/// A scanned invoice under management.
///
/// Amounts are fixed-precision decimals; floating point would drift on
/// VAT arithmetic. `invoice_date` is a calendar date with no time component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
  pub id:           Uuid,
  pub vendor:       String,
  pub invoice_date: NaiveDate,
  pub total:        Decimal,
  pub vat:          Decimal,
  pub currency:     String,
  pub status:       ReceiptStatus,
  pub raw_text:     Option<String>,
  /// Where the uploaded file was stored, if any.
  pub file_path:    Option<String>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   Option<DateTime<Utc>>,
  /// Owning user, when the presentation layer supplies one.
  pub created_by:   Option<Uuid>,
}

// ─── Booking ─────────────────────────────────────────────────────────────────

/// The record of a successful ledger transaction for one receipt.
///
/// At most one booking exists per receipt; the store enforces this with a
/// uniqueness constraint on `receipt_id`. The voucher identifier is opaque
/// to us and immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
  pub id:         Uuid,
  pub receipt_id: Uuid,
  pub voucher_id: String,
  pub booked_at:  DateTime<Utc>,
}

// ─── StoredReceipt ───────────────────────────────────────────────────────────

/// A receipt as read back from the store, together with its booking if one
/// exists. The booking flow's idempotency check depends on seeing both.
#[derive(Debug, Clone)]
pub struct StoredReceipt {
  pub receipt: Receipt,
  pub booking: Option<Booking>,
}

impl StoredReceipt {
  /// The public projection handed to the presentation layer.
  pub fn view(&self) -> ReceiptView {
    ReceiptView {
      id:           self.receipt.id,
      vendor:       self.receipt.vendor.clone(),
      invoice_date: self.receipt.invoice_date,
      total:        self.receipt.total,
      vat:          self.receipt.vat,
      currency:     self.receipt.currency.clone(),
      status:       self.receipt.status,
      created_at:   self.receipt.created_at,
      updated_at:   self.receipt.updated_at,
      raw_text:     self.receipt.raw_text.clone(),
      file_path:    self.receipt.file_path.clone(),
      voucher_id:   self.booking.as_ref().map(|b| b.voucher_id.clone()),
    }
  }
}

// ─── ReceiptView ─────────────────────────────────────────────────────────────

/// Flat, JSON-friendly projection of a receipt and its voucher id (if booked).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptView {
  pub id:           Uuid,
  pub vendor:       String,
  pub invoice_date: NaiveDate,
  #[serde(with = "rust_decimal::serde::float")]
  pub total:        Decimal,
  #[serde(with = "rust_decimal::serde::float")]
  pub vat:          Decimal,
  pub currency:     String,
  pub status:       ReceiptStatus,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   Option<DateTime<Utc>>,
  pub raw_text:     Option<String>,
  pub file_path:    Option<String>,
  pub voucher_id:   Option<String>,
}
