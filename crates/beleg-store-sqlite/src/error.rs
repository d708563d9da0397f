//! Error type for `beleg-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("decimal parse error: {0}")]
  DecimalParse(String),

  #[error("unknown receipt status: {0:?}")]
  UnknownStatus(String),

  /// `persist_booked` targeted a receipt id that is not in the store.
  #[error("receipt not found: {0}")]
  ReceiptNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
