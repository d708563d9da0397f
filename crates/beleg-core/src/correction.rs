//! User-supplied corrections applied to a receipt before booking.
//!
//! Corrections arrive as raw strings from the presentation layer. The merge
//! degrades per field: a value that is absent, blank, or unparsable leaves
//! the corresponding receipt field unchanged, and never blocks a valid
//! correction to another field in the same request. Unknown JSON keys are
//! dropped during deserialisation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::receipt::Receipt;

/// A fixed set of optional field overrides, keyed by the wire names the
/// frontend sends (`invoiceDate`, `rawText`, ...).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Corrections {
  pub vendor:       Option<String>,
  pub invoice_date: Option<String>,
  pub total:        Option<String>,
  pub vat:          Option<String>,
  pub currency:     Option<String>,
  pub raw_text:     Option<String>,
}

impl Corrections {
  /// Merge these corrections into `receipt`, field by field.
  ///
  /// Dates must parse as ISO `YYYY-MM-DD`; amounts as plain decimals.
  /// A parse failure is logged at debug level and the field is skipped.
  pub fn apply(&self, receipt: &mut Receipt) {
    if let Some(vendor) = non_blank(self.vendor.as_deref()) {
      receipt.vendor = vendor.to_string();
    }

    if let Some(raw) = self.invoice_date.as_deref() {
      match raw.parse::<NaiveDate>() {
        Ok(date) => receipt.invoice_date = date,
        Err(_) => tracing::debug!(value = raw, "skipping unparsable invoiceDate correction"),
      }
    }

    if let Some(raw) = self.total.as_deref() {
      match raw.parse::<Decimal>() {
        Ok(total) => receipt.total = total,
        Err(_) => tracing::debug!(value = raw, "skipping unparsable total correction"),
      }
    }

    if let Some(raw) = self.vat.as_deref() {
      match raw.parse::<Decimal>() {
        Ok(vat) => receipt.vat = vat,
        Err(_) => tracing::debug!(value = raw, "skipping unparsable vat correction"),
      }
    }

    if let Some(currency) = non_blank(self.currency.as_deref()) {
      receipt.currency = currency.to_string();
    }

    // rawText is free text; a supplied value is taken verbatim, blank or not.
    if let Some(raw_text) = &self.raw_text {
      receipt.raw_text = Some(raw_text.clone());
    }
  }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
  value.filter(|v| !v.trim().is_empty())
}
