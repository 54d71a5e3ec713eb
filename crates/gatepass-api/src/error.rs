//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use gatepass_core::{
  Error as CoreError,
  pipeline::PipelineError,
  store::{RepositoryError, RepositoryFault},
  validate::ValidationReport,
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The submission failed validation; carries the full report.
  #[error("visitor rejected: {}", .0.errors.join("; "))]
  Rejected(ValidationReport),

  #[error("could not save visitor: {source}")]
  Store {
    fault:  RepositoryFault,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("internal error: {0}")]
  Internal(String),
}

impl<E: RepositoryError> From<PipelineError<E>> for ApiError {
  fn from(e: PipelineError<E>) -> Self {
    match e {
      PipelineError::Rejected(report) => ApiError::Rejected(report),
      // A stored record that no longer decodes is our fault, not the client's.
      PipelineError::Core(e @ CoreError::Serialization(_)) => {
        ApiError::Internal(e.to_string())
      }
      PipelineError::Core(e) => ApiError::BadRequest(e.to_string()),
      PipelineError::Repository(e) => ApiError::Store {
        fault:  e.fault(),
        source: Box::new(e),
      },
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

fn fault_response(fault: RepositoryFault) -> (StatusCode, &'static str) {
  match fault {
    RepositoryFault::Schema => {
      (StatusCode::INTERNAL_SERVER_ERROR, "schema_mismatch")
    }
    RepositoryFault::PayloadTooLarge => {
      (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large")
    }
    RepositoryFault::Unavailable => {
      (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    }
    RepositoryFault::Conflict => (StatusCode::CONFLICT, "conflict"),
    RepositoryFault::Other => (StatusCode::INTERNAL_SERVER_ERROR, "store"),
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let message = self.to_string();
    match &self {
      ApiError::Store { fault, .. } => {
        tracing::warn!(%fault, error = %message, "visitor store request failed")
      }
      ApiError::Internal(_) => tracing::error!(error = %message, "internal error"),
      _ => tracing::debug!(error = %message, "request refused"),
    }

    match self {
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Rejected(report) => (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
          "error": message,
          "errors": report.errors,
          "warnings": report.warnings,
        })),
      )
        .into_response(),
      ApiError::Store { fault, .. } => {
        let (status, kind) = fault_response(fault);
        (status, Json(json!({ "error": message, "kind": kind })))
          .into_response()
      }
      ApiError::Internal(m) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": m })),
      )
        .into_response(),
    }
  }
}
