//! Handler for `POST /photos/check`.
//!
//! Runs the photo guard on its own so a capture screen can flag a bad or
//! oversized frame before the whole form is submitted.

use std::sync::Arc;

use axum::{Json, extract::State};
use gatepass_core::{
  photo::PhotoWarning,
  pipeline::VisitorPipeline,
  store::VisitorRepository,
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extract::ApiJson};

#[derive(Debug, Deserialize)]
pub struct CheckBody {
  pub photo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
  pub attached: bool,
  pub subtype:  Option<String>,
  pub ceiling:  usize,
  pub warnings: Vec<PhotoWarning>,
}

/// `POST /photos/check`, body `{"photo":"data:image/..."}`; 400 if the
/// payload is not an embedded image.
pub async fn check<R: VisitorRepository>(
  State(pipeline): State<Arc<VisitorPipeline<R>>>,
  ApiJson(body): ApiJson<CheckBody>,
) -> Result<Json<CheckResponse>, ApiError> {
  let guard = pipeline.photo_guard();
  let result = guard
    .check(body.photo.as_deref())
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  Ok(Json(CheckResponse {
    attached: body.photo.is_some(),
    subtype:  result.subtype,
    ceiling:  guard.ceiling(),
    warnings: result.warnings,
  }))
}
