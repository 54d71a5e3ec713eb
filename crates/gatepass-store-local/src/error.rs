//! Error type for `gatepass-store-local`.

use gatepass_core::store::{RepositoryError, RepositoryFault};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// The document exists but is not a JSON object of keys.
  #[error("local storage document is not a JSON object")]
  CorruptDocument,

  /// A record with this id is already stored.
  #[error("a visitor with id {0:?} already exists")]
  DuplicateId(String),

  /// A key holds a value of the wrong JSON type.
  #[error("local storage key {0:?} does not hold an array of records")]
  CorruptKey(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl RepositoryError for Error {
  fn fault(&self) -> RepositoryFault {
    match self {
      Self::Io(_) => RepositoryFault::Unavailable,
      Self::DuplicateId(_) => RepositoryFault::Conflict,
      Self::Json(_) | Self::CorruptDocument | Self::CorruptKey(_) => {
        RepositoryFault::Schema
      }
    }
  }
}
