//! The `VisitorRepository` trait and its error classification.
//!
//! Implemented by persistence backends (`gatepass-store-sqlite`,
//! `gatepass-store-local`). Repositories exchange [`FlatRecord`]s in the shape
//! they declare through [`VisitorRepository::shape`]; the pipeline does the
//! mapping, backends never do.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{fields::FlatRecord, visitor::VisitStatus};

// ─── Shape ───────────────────────────────────────────────────────────────────

/// The key convention a repository reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecordShape {
  /// Lowercase column names (`residentid`); the relational backend.
  Storage,
  /// camelCase names (`residentId`); the local fallback, which stores records
  /// exactly as the application holds them.
  Domain,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Coarse classification of a backend failure, for callers that need to tell
/// a misconfigured deployment from a transient outage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RepositoryFault {
  /// The backend schema lacks a column or table the record needs.
  Schema,
  /// The backend refused a value as too large.
  PayloadTooLarge,
  /// The backend could not be reached or is busy.
  Unavailable,
  /// A record with the same id already exists.
  Conflict,
  Other,
}

/// Implemented by every repository error type.
pub trait RepositoryError: std::error::Error + Send + Sync + 'static {
  fn fault(&self) -> RepositoryFault;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a visitor persistence backend.
///
/// A `create` is all-or-nothing from the caller's side. Nothing is retried.
pub trait VisitorRepository: Send + Sync {
  type Error: RepositoryError;

  /// The key convention of records passed to and returned by this backend.
  fn shape(&self) -> RecordShape;

  /// Persist `record` and return it as stored. An absent `id` is generated.
  fn create(
    &self,
    record: FlatRecord,
  ) -> impl Future<Output = Result<FlatRecord, Self::Error>> + Send + '_;

  /// Retrieve a record by id. Returns `None` if not found.
  fn get_by_id<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<FlatRecord>, Self::Error>> + Send + 'a;

  /// All visits for a society, newest entry first.
  fn list_by_society<'a>(
    &'a self,
    society_id: &'a str,
  ) -> impl Future<Output = Result<Vec<FlatRecord>, Self::Error>> + Send + 'a;

  /// Move a visit to `status`. Returns `None` if the id is unknown.
  fn set_status<'a>(
    &'a self,
    id: &'a str,
    status: VisitStatus,
  ) -> impl Future<Output = Result<Option<FlatRecord>, Self::Error>> + Send + 'a;

  /// Record the visitor leaving at `at`. Returns `None` if the id is unknown.
  fn record_exit<'a>(
    &'a self,
    id: &'a str,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<FlatRecord>, Self::Error>> + Send + 'a;
}
