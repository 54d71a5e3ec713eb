//! Error type for `gatepass-store-sqlite`.

use gatepass_core::store::{RepositoryError, RepositoryFault};
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// The record carries a field the `visitors` table has no column for.
  #[error("visitors table has no column {column:?}")]
  MissingColumn { column: String },

  #[error("value for {column:?} is {len} bytes, above the {limit} byte limit")]
  PayloadTooLarge {
    column: String,
    len:    usize,
    limit:  usize,
  },

  #[error("stored row {0} could not be read back")]
  Vanished(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

fn classify_sqlite(e: &rusqlite::Error) -> RepositoryFault {
  match e {
    rusqlite::Error::SqliteFailure(failure, message) => {
      let message = message.as_deref().unwrap_or_default();
      if message.contains("no such column")
        || message.contains("has no column named")
        || message.contains("no such table")
      {
        return RepositoryFault::Schema;
      }
      match failure.code {
        ErrorCode::TooBig => RepositoryFault::PayloadTooLarge,
        ErrorCode::DatabaseBusy
        | ErrorCode::DatabaseLocked
        | ErrorCode::CannotOpen
        | ErrorCode::SystemIoFailure => RepositoryFault::Unavailable,
        ErrorCode::ConstraintViolation
          if failure.extended_code
            == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
          RepositoryFault::Conflict
        }
        _ => RepositoryFault::Other,
      }
    }
    _ => RepositoryFault::Other,
  }
}

impl RepositoryError for Error {
  fn fault(&self) -> RepositoryFault {
    match self {
      Self::Database(tokio_rusqlite::Error::Rusqlite(e)) => classify_sqlite(e),
      Self::Database(tokio_rusqlite::Error::ConnectionClosed) => {
        RepositoryFault::Unavailable
      }
      Self::Database(_) => RepositoryFault::Other,
      Self::MissingColumn { .. } => RepositoryFault::Schema,
      Self::PayloadTooLarge { .. } => RepositoryFault::PayloadTooLarge,
      Self::Vanished(_) => RepositoryFault::Other,
    }
  }
}
