//! Extractors whose rejections render as [`ApiError`].

use axum::{Json, extract::FromRequest};

use crate::error::ApiError;

/// [`Json`], but a body that fails to parse or does not fit `T` is a 400 with
/// the same `{"error": ...}` body as every other failure.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
