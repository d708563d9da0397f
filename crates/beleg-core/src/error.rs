//! Error types for the booking and ingestion flows.
//!
//! Client-layer faults never appear here — the gateway traits absorb them
//! into absence values. Only flow-level outcomes cross the core's boundary.

use thiserror::Error;

/// An error surfaced by [`crate::flow::BookingFlow::book`].
#[derive(Debug, Error)]
pub enum BookError {
  /// The receipt id is unknown to the store. Nothing was mutated.
  #[error("receipt not found")]
  NotFound,

  /// The ledger was unreachable, rejected the voucher, or returned no
  /// usable identifier. The receipt stays `Pending` and re-bookable.
  #[error("ledger voucher creation failed")]
  Gateway,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// An error surfaced by [`crate::flow::IngestFlow::ingest`].
#[derive(Debug, Error)]
pub enum IngestError {
  /// The uploaded file was empty; nothing was stored.
  #[error("uploaded file is empty")]
  EmptyFile,

  #[error("failed to store uploaded file: {0}")]
  Upload(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}
