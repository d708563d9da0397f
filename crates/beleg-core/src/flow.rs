//! The booking and ingestion flows — the orchestration core of the service.
//!
//! [`BookingFlow`] owns the `Pending → Booked` transition and its
//! idempotency contract: repeated booking requests for one receipt return
//! the same voucher id and never create a second booking or a second
//! ledger call. [`IngestFlow`] turns an uploaded file into a `Pending`
//! receipt, degrading to fixed defaults when OCR is unavailable.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
  correction::Corrections,
  error::{BookError, IngestError},
  extract::{FALLBACK_CURRENCY, FALLBACK_VENDOR},
  gateway::{LedgerClient, OcrExtractor, UploadStore, VoucherRequest},
  receipt::{Booking, Receipt, ReceiptStatus, StoredReceipt},
  store::{BookedPersist, ReceiptStore},
};

// ─── Booking ─────────────────────────────────────────────────────────────────

/// Books a receipt into the external ledger at most once.
pub struct BookingFlow<S, L> {
  store:  Arc<S>,
  ledger: Arc<L>,
}

impl<S, L> BookingFlow<S, L>
where
  S: ReceiptStore,
  L: LedgerClient,
{
  pub fn new(store: Arc<S>, ledger: Arc<L>) -> Self {
    Self { store, ledger }
  }

  /// Book the receipt identified by `receipt_id`, applying `corrections`
  /// first. Returns the voucher identifier.
  ///
  /// Already-booked receipts short-circuit to their existing voucher id
  /// without touching the ledger. A ledger failure aborts before anything
  /// is persisted, so the receipt stays `Pending` with no booking — there
  /// is no half-booked state.
  pub async fn book(
    &self,
    receipt_id: Uuid,
    corrections: Option<&Corrections>,
  ) -> Result<String, BookError> {
    let stored = self
      .store
      .get(receipt_id)
      .await
      .map_err(|e| BookError::Store(Box::new(e)))?
      .ok_or(BookError::NotFound)?;

    let StoredReceipt { mut receipt, booking } = stored;

    // Idempotency short-circuit: a booked receipt already has its voucher.
    if receipt.status == ReceiptStatus::Booked
      && let Some(existing) = booking
    {
      return Ok(existing.voucher_id);
    }

    if let Some(corrections) = corrections {
      corrections.apply(&mut receipt);
    }
    receipt.updated_at = Some(Utc::now());

    let request = VoucherRequest {
      vendor:   receipt.vendor.clone(),
      date:     receipt.invoice_date,
      total:    receipt.total,
      vat:      receipt.vat,
      currency: receipt.currency.clone(),
      raw_text: receipt.raw_text.clone(),
    };

    let Some(voucher_id) = self.ledger.create_voucher(&request).await else {
      tracing::warn!(receipt_id = %receipt_id, "ledger booking failed");
      return Err(BookError::Gateway);
    };

    receipt.status = ReceiptStatus::Booked;
    let booking = Booking {
      id:         Uuid::new_v4(),
      receipt_id: receipt.id,
      voucher_id: voucher_id.clone(),
      booked_at:  Utc::now(),
    };

    match self
      .store
      .persist_booked(receipt, booking)
      .await
      .map_err(|e| BookError::Store(Box::new(e)))?
    {
      BookedPersist::Committed => Ok(voucher_id),
      BookedPersist::AlreadyBooked(winner) => {
        // A concurrent request persisted first; adopt its voucher so the
        // caller never sees two identifiers for one receipt.
        tracing::warn!(
          receipt_id = %receipt_id,
          voucher_id = %winner.voucher_id,
          "lost booking race, returning winner's voucher"
        );
        Ok(winner.voucher_id)
      }
    }
  }
}

// ─── Ingestion ───────────────────────────────────────────────────────────────

/// Turns an uploaded file into a `Pending` receipt.
pub struct IngestFlow<S, O, U> {
  store:   Arc<S>,
  ocr:     Arc<O>,
  uploads: Arc<U>,
}

impl<S, O, U> IngestFlow<S, O, U>
where
  S: ReceiptStore,
  O: OcrExtractor,
  U: UploadStore,
{
  pub fn new(store: Arc<S>, ocr: Arc<O>, uploads: Arc<U>) -> Self {
    Self { store, ocr, uploads }
  }

  /// Store the uploaded bytes, run best-effort OCR, and create a `Pending`
  /// receipt. Always succeeds for a non-empty storable file; OCR
  /// unavailability degrades to the fixed defaults.
  pub async fn ingest(
    &self,
    original_name: &str,
    bytes: &[u8],
    created_by: Option<Uuid>,
  ) -> Result<Receipt, IngestError> {
    if bytes.is_empty() {
      return Err(IngestError::EmptyFile);
    }

    let file_path = self
      .uploads
      .save(original_name, bytes)
      .await
      .map_err(|e| IngestError::Upload(Box::new(e)))?;

    let extraction = self.ocr.extract(&file_path).await;
    if extraction.is_none() {
      tracing::warn!(file_path = %file_path, "OCR extraction unavailable, falling back to defaults");
    }

    let now = Utc::now();
    let receipt = match extraction {
      Some(e) => Receipt {
        id:           Uuid::new_v4(),
        vendor:       e.vendor,
        invoice_date: e.invoice_date,
        total:        e.total,
        vat:          e.vat,
        currency:     e.currency,
        status:       ReceiptStatus::Pending,
        raw_text:     Some(e.raw_text),
        file_path:    Some(file_path),
        created_at:   now,
        updated_at:   None,
        created_by,
      },
      None => Receipt {
        id:           Uuid::new_v4(),
        vendor:       FALLBACK_VENDOR.to_string(),
        invoice_date: now.date_naive(),
        total:        Decimal::ZERO,
        vat:          Decimal::ZERO,
        currency:     FALLBACK_CURRENCY.to_string(),
        status:       ReceiptStatus::Pending,
        raw_text:     None,
        file_path:    Some(file_path),
        created_at:   now,
        updated_at:   None,
        created_by,
      },
    };

    self
      .store
      .create(receipt.clone())
      .await
      .map_err(|e| IngestError::Store(Box::new(e)))?;

    Ok(receipt)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
