//! JSON REST API for gate entry.
//!
//! Exposes an axum [`Router`] backed by any
//! [`gatepass_core::store::VisitorRepository`], wrapped in a
//! [`VisitorPipeline`] so every write goes through the photo guard, the
//! validator and the field mapper. Auth and TLS are the caller's concern.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", gatepass_api::api_router(pipeline))
//! ```

pub mod error;
pub mod extract;
pub mod photos;
pub mod visitors;


use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use gatepass_core::{pipeline::VisitorPipeline, store::VisitorRepository};

pub use error::ApiError;
pub use extract::ApiJson;

/// Request body ceiling. Sits well above the photo guard's advisory ceiling.
pub const BODY_LIMIT: usize = 8 * 1024 * 1024;

/// Build a fully-materialised API router for `pipeline`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<R>(pipeline: VisitorPipeline<R>) -> Router<()>
where
  R: VisitorRepository + 'static,
{
  Router::new()
    // Visitors
    .route(
      "/visitors",
      get(visitors::list::<R>).post(visitors::create::<R>),
    )
    .route("/visitors/{id}", get(visitors::get_one::<R>))
    .route("/visitors/{id}/approve", post(visitors::approve::<R>))
    .route("/visitors/{id}/reject", post(visitors::reject::<R>))
    .route("/visitors/{id}/exit", post(visitors::exit::<R>))
    // Photos
    .route("/photos/check", post(photos::check::<R>))
    .layer(DefaultBodyLimit::max(BODY_LIMIT))
    .with_state(Arc::new(pipeline))
}
