//! Error type for `beleg-clients`.
//!
//! Only construction and upload storage can error; extraction and voucher
//! creation absorb their faults into absence values instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http client error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
