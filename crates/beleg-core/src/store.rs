//! The `ReceiptStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `beleg-store-sqlite`).
//! Higher layers (`beleg-api`, the flows in this crate) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::receipt::{Booking, Receipt, ReceiptStatus, StoredReceipt};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`ReceiptStore::list`]. Results are ordered newest-first.
#[derive(Debug, Clone)]
pub struct ListQuery {
  /// Restrict to receipts in this status.
  pub status:    Option<ReceiptStatus>,
  /// 1-based page number; values below 1 are clamped up.
  pub page:      u32,
  /// Page size, clamped to `1..=100`.
  pub page_size: u32,
}

impl Default for ListQuery {
  fn default() -> Self {
    Self { status: None, page: 1, page_size: 50 }
  }
}

impl ListQuery {
  /// Clamped `(limit, offset)` pair, so every backend pages identically.
  pub fn limit_offset(&self) -> (u32, u32) {
    let page = self.page.max(1);
    let page_size = self.page_size.clamp(1, 100);
    (page_size, (page - 1) * page_size)
  }
}

// ─── Persist outcome ─────────────────────────────────────────────────────────

/// Outcome of [`ReceiptStore::persist_booked`].
///
/// `AlreadyBooked` means the uniqueness guard on the booking's receipt
/// reference fired: a concurrent request won the race. The loser adopts the
/// winner's booking, so a caller never observes two voucher ids for one
/// receipt.
#[derive(Debug, Clone)]
pub enum BookedPersist {
  Committed,
  AlreadyBooked(Booking),
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a durable receipt store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ReceiptStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a newly created receipt. The caller assigns the id and
  /// timestamps.
  fn create(
    &self,
    receipt: Receipt,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Retrieve a receipt by id, together with its booking if one exists.
  /// Returns `None` if not found.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<StoredReceipt>, Self::Error>> + Send + '_;

  /// List receipts newest-first, optionally filtered by status, paged per
  /// [`ListQuery::limit_offset`].
  fn list(
    &self,
    query: ListQuery,
  ) -> impl Future<Output = Result<Vec<StoredReceipt>, Self::Error>> + Send + '_;

  /// Persist a booked receipt and its booking as one transactional unit:
  /// the field updates, the status flip, and the booking insert commit
  /// together or not at all.
  ///
  /// If a booking already exists for the receipt (a concurrent request won),
  /// nothing is written and the existing booking is returned as
  /// [`BookedPersist::AlreadyBooked`].
  fn persist_booked(
    &self,
    receipt: Receipt,
    booking: Booking,
  ) -> impl Future<Output = Result<BookedPersist, Self::Error>> + Send + '_;
}
