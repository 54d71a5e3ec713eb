//! Handlers for `/visitors` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/visitors` | `?society_id` required; newest entry first |
//! | `POST` | `/visitors` | Body: [`VisitorDraft`]; returns 201 + `{visitor, warnings}` |
//! | `GET`  | `/visitors/:id` | 404 if not found |
//! | `POST` | `/visitors/:id/approve` | |
//! | `POST` | `/visitors/:id/reject` | |
//! | `POST` | `/visitors/:id/exit` | Records the exit time as now |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use gatepass_core::{
  pipeline::VisitorPipeline,
  store::VisitorRepository,
  visitor::{VisitorDraft, VisitorRecord},
};
use serde::Deserialize;

use crate::{error::ApiError, extract::ApiJson};

type Pipeline<R> = State<Arc<VisitorPipeline<R>>>;

fn found(
  id: &str,
  visitor: Option<VisitorRecord>,
) -> Result<Json<VisitorRecord>, ApiError> {
  visitor
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("visitor {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub society_id: String,
}

/// `GET /visitors?society_id=<id>`
pub async fn list<R: VisitorRepository>(
  State(pipeline): Pipeline<R>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<VisitorRecord>>, ApiError> {
  let visitors = pipeline.list_for_society(&params.society_id).await?;
  Ok(Json(visitors))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /visitors`: returns 201 + the stored visitor and any warnings.
pub async fn create<R: VisitorRepository>(
  State(pipeline): Pipeline<R>,
  ApiJson(draft): ApiJson<VisitorDraft>,
) -> Result<impl IntoResponse, ApiError> {
  let submission = pipeline.submit(draft).await?;
  Ok((StatusCode::CREATED, Json(submission)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /visitors/:id`
pub async fn get_one<R: VisitorRepository>(
  State(pipeline): Pipeline<R>,
  Path(id): Path<String>,
) -> Result<Json<VisitorRecord>, ApiError> {
  found(&id, pipeline.get(&id).await?)
}

// ─── Lifecycle ────────────────────────────────────────────────────────────────

/// `POST /visitors/:id/approve`
pub async fn approve<R: VisitorRepository>(
  State(pipeline): Pipeline<R>,
  Path(id): Path<String>,
) -> Result<Json<VisitorRecord>, ApiError> {
  found(&id, pipeline.approve(&id).await?)
}

/// `POST /visitors/:id/reject`
pub async fn reject<R: VisitorRepository>(
  State(pipeline): Pipeline<R>,
  Path(id): Path<String>,
) -> Result<Json<VisitorRecord>, ApiError> {
  found(&id, pipeline.reject(&id).await?)
}

/// `POST /visitors/:id/exit`
pub async fn exit<R: VisitorRepository>(
  State(pipeline): Pipeline<R>,
  Path(id): Path<String>,
) -> Result<Json<VisitorRecord>, ApiError> {
  found(&id, pipeline.record_exit(&id).await?)
}
