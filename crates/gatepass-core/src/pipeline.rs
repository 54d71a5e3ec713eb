//! The submission pipeline: Photo Guard → Validator → Field Mapper →
//! repository → Field Mapper.
//!
//! [`VisitorPipeline`] owns an injected repository and applies the mapping its
//! [`RecordShape`] calls for, so callers only ever see domain-shape
//! [`VisitorRecord`]s.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::{
  Error,
  fields::{self, FlatRecord},
  photo::PhotoGuard,
  store::{RecordShape, RepositoryError, VisitorRepository},
  validate::{ValidationReport, validate},
  visitor::{self, VisitStatus, VisitorDraft, VisitorRecord},
};

/// Failure of a pipeline operation.
///
/// `Rejected` and `Core` are resolved before the repository is touched;
/// `Repository` wraps whatever the backend returned.
#[derive(Debug, Error)]
pub enum PipelineError<E: std::error::Error + 'static> {
  #[error("visitor rejected: {}", .0.errors.join("; "))]
  Rejected(ValidationReport),

  #[error(transparent)]
  Core(#[from] Error),

  #[error("repository error: {0}")]
  Repository(#[source] E),
}

/// A draft that passed every local check, ready to hand to the repository.
#[derive(Debug, Clone)]
pub struct Prepared {
  pub record:   VisitorRecord,
  /// `record` in the repository's shape.
  pub outgoing: FlatRecord,
  pub warnings: Vec<String>,
}

/// The confirmed result of [`VisitorPipeline::submit`].
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
  pub visitor:  VisitorRecord,
  pub warnings: Vec<String>,
}

pub struct VisitorPipeline<R> {
  repo:  Arc<R>,
  guard: PhotoGuard,
}

impl<R> Clone for VisitorPipeline<R> {
  fn clone(&self) -> Self {
    Self { repo: Arc::clone(&self.repo), guard: self.guard }
  }
}

impl<R: VisitorRepository> VisitorPipeline<R> {
  pub fn new(repo: Arc<R>) -> Self {
    Self { repo, guard: PhotoGuard::default() }
  }

  pub fn with_photo_guard(mut self, guard: PhotoGuard) -> Self {
    self.guard = guard;
    self
  }

  pub fn repository(&self) -> &R { &self.repo }

  pub fn photo_guard(&self) -> PhotoGuard { self.guard }

  /// Run the local stages for `draft` as of `at`. Performs no I/O.
  pub fn prepare(
    &self,
    draft: VisitorDraft,
    at: DateTime<Utc>,
  ) -> Result<Prepared, PipelineError<R::Error>> {
    let photo = self.guard.check(draft.photo.as_deref())?;

    let report = validate(&draft);
    if !report.is_valid {
      tracing::info!(errors = ?report.errors, "visitor submission rejected");
      return Err(PipelineError::Rejected(report));
    }

    let mut warnings: Vec<String> =
      photo.warnings.iter().map(ToString::to_string).collect();
    warnings.extend(report.warnings);

    let record = draft.into_record(at)?;
    let outgoing = self.outgoing(&record)?;

    Ok(Prepared { record, outgoing, warnings })
  }

  /// Check, map and persist `draft`; return the stored visitor.
  pub async fn submit(
    &self,
    draft: VisitorDraft,
  ) -> Result<Submission, PipelineError<R::Error>> {
    let Prepared { outgoing, warnings, .. } =
      self.prepare(draft, visitor::now())?;

    let stored = self.repo.create(outgoing).await.map_err(repository_failure)?;
    let visitor = self.incoming(stored)?;

    tracing::info!(
      id = %visitor.id,
      society = %visitor.society_id,
      warnings = warnings.len(),
      "visitor recorded"
    );
    Ok(Submission { visitor, warnings })
  }

  pub async fn get(
    &self,
    id: &str,
  ) -> Result<Option<VisitorRecord>, PipelineError<R::Error>> {
    let stored = self.repo.get_by_id(id).await.map_err(repository_failure)?;
    Ok(stored.map(|r| self.incoming(r)).transpose()?)
  }

  pub async fn list_for_society(
    &self,
    society_id: &str,
  ) -> Result<Vec<VisitorRecord>, PipelineError<R::Error>> {
    let stored = self
      .repo
      .list_by_society(society_id)
      .await
      .map_err(repository_failure)?;
    // One undecodable row must not hide the rest of the society's visits.
    Ok(
      stored
        .into_iter()
        .filter_map(|r| {
          let id = r.get("id").and_then(|v| v.as_str()).map(str::to_owned);
          self
            .incoming(r)
            .inspect_err(|e| {
              tracing::warn!(?id, error = %e, "skipping undecodable visitor row")
            })
            .ok()
        })
        .collect(),
    )
  }

  pub async fn approve(
    &self,
    id: &str,
  ) -> Result<Option<VisitorRecord>, PipelineError<R::Error>> {
    self.transition(id, VisitStatus::Approved).await
  }

  pub async fn reject(
    &self,
    id: &str,
  ) -> Result<Option<VisitorRecord>, PipelineError<R::Error>> {
    self.transition(id, VisitStatus::Rejected).await
  }

  pub async fn record_exit(
    &self,
    id: &str,
  ) -> Result<Option<VisitorRecord>, PipelineError<R::Error>> {
    let stored = self
      .repo
      .record_exit(id, visitor::now())
      .await
      .map_err(repository_failure)?;
    Ok(stored.map(|r| self.incoming(r)).transpose()?)
  }

  async fn transition(
    &self,
    id: &str,
    status: VisitStatus,
  ) -> Result<Option<VisitorRecord>, PipelineError<R::Error>> {
    let stored = self
      .repo
      .set_status(id, status)
      .await
      .map_err(repository_failure)?;
    if stored.is_some() {
      tracing::info!(%id, %status, "visit status changed");
    }
    Ok(stored.map(|r| self.incoming(r)).transpose()?)
  }

  fn outgoing(&self, record: &VisitorRecord) -> Result<FlatRecord, Error> {
    let flat = record.to_flat()?;
    match self.repo.shape() {
      RecordShape::Storage => Ok(fields::to_storage(&flat)?),
      RecordShape::Domain => Ok(flat),
    }
  }

  fn incoming(&self, stored: FlatRecord) -> Result<VisitorRecord, Error> {
    let flat = match self.repo.shape() {
      RecordShape::Storage => fields::to_domain(&stored)?,
      RecordShape::Domain => stored,
    };
    VisitorRecord::from_flat(flat)
  }
}

fn repository_failure<E: RepositoryError>(e: E) -> PipelineError<E> {
  tracing::error!(fault = %e.fault(), error = %e, "visitor repository failed");
  PipelineError::Repository(e)
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  };

  use serde_json::{Value, json};

  use super::*;
  use crate::store::RepositoryFault;

  #[derive(Debug, Error)]
  #[error("backend offline")]
  struct Offline;

  impl RepositoryError for Offline {
    fn fault(&self) -> RepositoryFault { RepositoryFault::Unavailable }
  }

  /// Keeps records in memory and echoes them back, like a backend would.
  struct EchoRepository {
    shape:   RecordShape,
    rows:    Mutex<Vec<FlatRecord>>,
    creates: AtomicUsize,
    offline: bool,
  }

  impl EchoRepository {
    fn new(shape: RecordShape) -> Self {
      Self {
        shape,
        rows: Mutex::new(Vec::new()),
        creates: AtomicUsize::new(0),
        offline: false,
      }
    }

    fn status_key(&self) -> &'static str { "status" }

    fn society_key(&self) -> &'static str {
      match self.shape {
        RecordShape::Storage => "societyid",
        RecordShape::Domain => "societyId",
      }
    }

    fn exit_key(&self) -> &'static str {
      match self.shape {
        RecordShape::Storage => "exittime",
        RecordShape::Domain => "exitTime",
      }
    }

    fn update(&self, id: &str, key: &str, value: Value) -> Option<FlatRecord> {
      let mut rows = self.rows.lock().unwrap();
      let row = rows.iter_mut().find(|r| r.get("id") == Some(&json!(id)))?;
      row.insert(key.to_owned(), value);
      Some(row.clone())
    }
  }

  impl VisitorRepository for EchoRepository {
    type Error = Offline;

    fn shape(&self) -> RecordShape { self.shape }

    async fn create(&self, record: FlatRecord) -> Result<FlatRecord, Offline> {
      self.creates.fetch_add(1, Ordering::SeqCst);
      if self.offline {
        return Err(Offline);
      }
      self.rows.lock().unwrap().push(record.clone());
      Ok(record)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<FlatRecord>, Offline> {
      let rows = self.rows.lock().unwrap();
      Ok(rows.iter().find(|r| r.get("id") == Some(&json!(id))).cloned())
    }

    async fn list_by_society(
      &self,
      society_id: &str,
    ) -> Result<Vec<FlatRecord>, Offline> {
      let key = self.society_key();
      let rows = self.rows.lock().unwrap();
      Ok(
        rows
          .iter()
          .rev()
          .filter(|r| r.get(key) == Some(&json!(society_id)))
          .cloned()
          .collect(),
      )
    }

    async fn set_status(
      &self,
      id: &str,
      status: VisitStatus,
    ) -> Result<Option<FlatRecord>, Offline> {
      Ok(self.update(id, self.status_key(), json!(status)))
    }

    async fn record_exit(
      &self,
      id: &str,
      at: DateTime<Utc>,
    ) -> Result<Option<FlatRecord>, Offline> {
      Ok(self.update(id, self.exit_key(), json!(visitor::format_timestamp(at))))
    }
  }

  fn pipeline(shape: RecordShape) -> VisitorPipeline<EchoRepository> {
    VisitorPipeline::new(Arc::new(EchoRepository::new(shape)))
  }

  fn ravi() -> VisitorDraft {
    VisitorDraft {
      name: Some("Ravi Kumar".into()),
      resident_id: Some("r1".into()),
      society_id: Some("s1".into()),
      contact_number: Some("9876543210".into()),
      photo: Some("data:image/jpeg;base64,AAAA".into()),
      ..Default::default()
    }
  }

  #[tokio::test]
  async fn submission_reaches_storage_in_storage_shape() {
    let p = pipeline(RecordShape::Storage);
    let submission = p.submit(ravi()).await.unwrap();

    let rows = p.repository().rows.lock().unwrap().clone();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row["name"], json!("Ravi Kumar"));
    assert_eq!(row["residentid"], json!("r1"));
    assert_eq!(row["societyid"], json!("s1"));
    assert_eq!(row["contactnumber"], json!("9876543210"));
    assert_eq!(row["photo"], json!("data:image/jpeg;base64,AAAA"));
    assert_eq!(row["status"], json!("pending"));
    let entry = row["entrytime"].as_str().unwrap();
    assert!(DateTime::parse_from_rfc3339(entry).is_ok());
    assert!(!row.contains_key("residentId"));

    let visitor = submission.visitor;
    assert_eq!(visitor.id, row["id"].as_str().unwrap());
    assert_eq!(visitor.name, "Ravi Kumar");
    assert_eq!(visitor.resident_id, "r1");
    assert_eq!(visitor.society_id, "s1");
    assert_eq!(visitor.contact_number.as_deref(), Some("9876543210"));
    assert_eq!(visitor.photo.as_deref(), Some("data:image/jpeg;base64,AAAA"));
    assert_eq!(visitor.status, VisitStatus::Pending);
    assert_eq!(visitor::format_timestamp(visitor.entry_time), entry);
  }

  #[tokio::test]
  async fn domain_shape_repository_gets_unmapped_keys() {
    let p = pipeline(RecordShape::Domain);
    let submission = p.submit(ravi()).await.unwrap();

    let rows = p.repository().rows.lock().unwrap().clone();
    assert_eq!(rows[0]["residentId"], json!("r1"));
    assert!(!rows[0].contains_key("residentid"));
    assert_eq!(submission.visitor.resident_id, "r1");
  }

  #[tokio::test]
  async fn rejected_draft_never_reaches_the_repository() {
    let p = pipeline(RecordShape::Storage);
    for draft in [
      VisitorDraft { name: None, ..ravi() },
      VisitorDraft { resident_id: None, ..ravi() },
      VisitorDraft { society_id: Some(" ".into()), ..ravi() },
    ] {
      match p.submit(draft).await {
        Err(PipelineError::Rejected(report)) => {
          assert!(!report.is_valid);
          assert_eq!(report.errors.len(), 1);
        }
        other => panic!("expected rejection, got {other:?}"),
      }
    }
    assert_eq!(p.repository().creates.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn bad_photo_is_rejected_before_validation() {
    let p = pipeline(RecordShape::Storage);
    let draft = VisitorDraft {
      name: None,
      photo: Some("not-an-image-string".into()),
      ..ravi()
    };
    let err = p.submit(draft).await.unwrap_err();
    assert!(matches!(err, PipelineError::Core(Error::InvalidPhotoFormat)));
    assert_eq!(p.repository().creates.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn warnings_are_carried_through() {
    let p = pipeline(RecordShape::Storage)
      .with_photo_guard(PhotoGuard::with_ceiling(10));
    let draft = VisitorDraft { contact_number: Some("12345".into()), ..ravi() };

    let submission = p.submit(draft).await.unwrap();
    assert!(submission.warnings[0].starts_with("photo payload is"));
    assert!(
      submission
        .warnings
        .iter()
        .any(|w| w.starts_with("contactNumber should have"))
    );
  }

  #[tokio::test]
  async fn repository_failure_is_surfaced_once() {
    let mut repo = EchoRepository::new(RecordShape::Storage);
    repo.offline = true;
    let p = VisitorPipeline::new(Arc::new(repo));

    let err = p.submit(ravi()).await.unwrap_err();
    match err {
      PipelineError::Repository(e) => {
        assert_eq!(e.fault(), RepositoryFault::Unavailable)
      }
      other => panic!("expected repository error, got {other:?}"),
    }
    assert_eq!(p.repository().creates.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn lifecycle_transitions_map_back() {
    let p = pipeline(RecordShape::Storage);
    let id = p.submit(ravi()).await.unwrap().visitor.id;

    let approved = p.approve(&id).await.unwrap().unwrap();
    assert_eq!(approved.status, VisitStatus::Approved);

    let exited = p.record_exit(&id).await.unwrap().unwrap();
    assert!(exited.exit_time.is_some());

    assert!(p.reject("missing").await.unwrap().is_none());

    let listed = p.list_for_society("s1").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(p.get(&id).await.unwrap().unwrap(), exited);
  }

  #[tokio::test]
  async fn sparse_rows_decode_and_broken_rows_are_skipped() {
    let p = pipeline(RecordShape::Storage);
    let id = p.submit(ravi()).await.unwrap().visitor.id;
    {
      let mut rows = p.repository().rows.lock().unwrap();
      rows.push(
        fields::flat_record(json!({
          "id": "legacy",
          "name": "Old Entry",
          "residentid": "r1",
          "societyid": "s1",
          "status": "approved",
          "entrytime": "2026-01-02T08:00:00.000Z",
        }))
        .unwrap(),
      );
      rows.push(
        fields::flat_record(json!({
          "id": "broken",
          "name": "No Entry Time",
          "residentid": "r1",
          "societyid": "s1",
        }))
        .unwrap(),
      );
    }

    let legacy = p.get("legacy").await.unwrap().unwrap();
    assert_eq!(legacy.created_by, visitor::SELF_REGISTERED);
    assert_eq!(legacy.created_at, None);

    let ids: Vec<String> = p
      .list_for_society("s1")
      .await
      .unwrap()
      .into_iter()
      .map(|v| v.id)
      .collect();
    assert_eq!(ids, ["legacy".to_owned(), id]);
  }
}
