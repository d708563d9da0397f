//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, invoice dates as ISO calendar
//! dates, amounts as decimal strings, UUIDs as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use beleg_core::receipt::{Booking, Receipt, ReceiptStatus, StoredReceipt};

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  s.parse().map_err(|_| Error::DateParse(format!("bad calendar date: {s:?}")))
}

// ─── Decimal ─────────────────────────────────────────────────────────────────

pub fn encode_decimal(d: Decimal) -> String { d.to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> {
  s.parse()
    .map_err(|_| Error::DecimalParse(format!("bad decimal: {s:?}")))
}

// ─── ReceiptStatus ───────────────────────────────────────────────────────────

pub fn encode_status(s: ReceiptStatus) -> &'static str { s.as_str() }

pub fn decode_status(s: &str) -> Result<ReceiptStatus> {
  ReceiptStatus::parse(s).ok_or_else(|| Error::UnknownStatus(s.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read from a `receipts` row left-joined with `bookings`.
pub struct RawStoredReceipt {
  // receipts columns
  pub receipt_id:   String,
  pub vendor:       String,
  pub invoice_date: String,
  pub total:        String,
  pub vat:          String,
  pub currency:     String,
  pub status:       String,
  pub raw_text:     Option<String>,
  pub file_path:    Option<String>,
  pub created_at:   String,
  pub updated_at:   Option<String>,
  pub created_by:   Option<String>,
  // bookings join
  pub booking_id:   Option<String>,
  pub voucher_id:   Option<String>,
  pub booked_at:    Option<String>,
}

impl RawStoredReceipt {
  pub fn into_stored(self) -> Result<StoredReceipt> {
    let receipt_id = decode_uuid(&self.receipt_id)?;

    let receipt = Receipt {
      id:           receipt_id,
      vendor:       self.vendor,
      invoice_date: decode_date(&self.invoice_date)?,
      total:        decode_decimal(&self.total)?,
      vat:          decode_decimal(&self.vat)?,
      currency:     self.currency,
      status:       decode_status(&self.status)?,
      raw_text:     self.raw_text,
      file_path:    self.file_path,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   self.updated_at.as_deref().map(decode_dt).transpose()?,
      created_by:   self.created_by.as_deref().map(decode_uuid).transpose()?,
    };

    let booking = match (self.booking_id, self.voucher_id, self.booked_at) {
      (Some(id), Some(voucher_id), Some(at)) => Some(Booking {
        id: decode_uuid(&id)?,
        receipt_id,
        voucher_id,
        booked_at: decode_dt(&at)?,
      }),
      _ => None,
    };

    Ok(StoredReceipt { receipt, booking })
  }
}

/// Raw strings read from a `bookings` row.
pub struct RawBooking {
  pub booking_id: String,
  pub receipt_id: String,
  pub voucher_id: String,
  pub booked_at:  String,
}

impl RawBooking {
  pub fn into_booking(self) -> Result<Booking> {
    Ok(Booking {
      id:         decode_uuid(&self.booking_id)?,
      receipt_id: decode_uuid(&self.receipt_id)?,
      voucher_id: self.voucher_id,
      booked_at:  decode_dt(&self.booked_at)?,
    })
  }
}
