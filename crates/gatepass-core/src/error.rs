//! Error types for `gatepass-core`.

use thiserror::Error;

/// Failure translating a record between domain and storage shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
  #[error("record is not a flat key/value object")]
  NotAnObject,

  #[error("field {field:?} holds a nested object or array")]
  NestedValue { field: String },

  #[error("more than one field maps to {key:?}")]
  KeyCollision { key: String },
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {}", .0.join("; "))]
  Validation(Vec<String>),

  #[error("invalid photo format: expected a `data:image/` payload")]
  InvalidPhotoFormat,

  #[error("mapping error: {0}")]
  Mapping(#[from] MappingError),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
