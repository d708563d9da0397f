//! HTTP and filesystem implementations of the `beleg-core` gateway traits.
//!
//! The OCR and ledger clients absorb every transport and payload fault and
//! return absence values, as the core contracts require. Each client is
//! constructed once at startup from an immutable configuration value.

pub mod error;
pub mod ledger;
pub mod ocr;
pub mod uploads;

pub use error::{Error, Result};
pub use ledger::{HttpLedgerClient, LedgerConfig};
pub use ocr::{HttpOcrClient, OcrConfig};
pub use uploads::DiskUploadStore;
