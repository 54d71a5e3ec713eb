//! [`LocalStore`]: a JSON key/value document standing in for browser local
//! storage.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use chrono::{DateTime, Utc};
use gatepass_core::{
  fields::FlatRecord,
  store::{RecordShape, VisitorRepository},
  visitor::{VisitStatus, format_timestamp},
};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{Error, Result};

/// The single key all visitor records are kept under.
pub const VISITORS_KEY: &str = "visitors";

type Document = Map<String, Value>;

/// Cloning is cheap; clones share the same document.
#[derive(Clone)]
pub struct LocalStore {
  doc:  Arc<Mutex<Document>>,
  /// Backing file; `None` keeps everything in memory.
  path: Option<Arc<PathBuf>>,
}

impl LocalStore {
  /// Open the document at `path`, starting empty if the file does not exist.
  pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
    let path = path.into();
    let doc = read_document(&path).await?;

    tracing::debug!(path = %path.display(), keys = doc.len(), "opened local store");
    Ok(Self { doc: Arc::new(Mutex::new(doc)), path: Some(Arc::new(path)) })
  }

  /// A store that never touches disk.
  pub fn in_memory() -> Self {
    Self { doc: Arc::new(Mutex::new(Document::new())), path: None }
  }

  pub async fn get_item(&self, key: &str) -> Option<Value> {
    self.doc.lock().await.get(key).cloned()
  }

  pub async fn set_item(&self, key: &str, value: Value) -> Result<()> {
    self
      .mutate(|doc| {
        doc.insert(key.to_owned(), value);
        Ok(())
      })
      .await
  }

  /// Apply `f` to the document in place, then persist it.
  ///
  /// `f` must check before it changes anything. If the write fails, the
  /// in-memory document is reloaded from the file, which still holds the
  /// last good state.
  async fn mutate<T>(
    &self,
    f: impl FnOnce(&mut Document) -> Result<T>,
  ) -> Result<T> {
    let mut doc = self.doc.lock().await;
    let out = f(&mut *doc)?;
    if let Some(path) = &self.path
      && let Err(e) = write_document(path, &*doc).await
    {
      tracing::warn!(path = %path.display(), error = %e, "local store write failed");
      *doc = read_document(path).await?;
      return Err(e);
    }
    Ok(out)
  }

  async fn update_field(
    &self,
    id: &str,
    field: &str,
    value: Value,
  ) -> Result<Option<FlatRecord>> {
    self
      .mutate(|doc| {
        let Some(index) = position(visitors(doc)?, id)? else {
          return Ok(None);
        };
        let record = visitors_mut(doc)?[index]
          .as_object_mut()
          .ok_or_else(corrupt)?;
        record.insert(field.to_owned(), value);
        Ok(Some(record.clone()))
      })
      .await
  }
}

async fn read_document(path: &Path) -> Result<Document> {
  match tokio::fs::read_to_string(path).await {
    Ok(text) if text.trim().is_empty() => Ok(Document::new()),
    Ok(text) => match serde_json::from_str::<Value>(&text)? {
      Value::Object(doc) => Ok(doc),
      _ => Err(Error::CorruptDocument),
    },
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::new()),
    Err(e) => Err(e.into()),
  }
}

async fn write_document(path: &Path, doc: &Document) -> Result<()> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    tokio::fs::create_dir_all(parent).await?;
  }
  let tmp = path.with_extension("json.tmp");
  tokio::fs::write(&tmp, serde_json::to_vec_pretty(doc)?).await?;
  tokio::fs::rename(&tmp, path).await?;
  Ok(())
}

fn corrupt() -> Error { Error::CorruptKey(VISITORS_KEY.to_owned()) }

fn visitors(doc: &Document) -> Result<&[Value]> {
  match doc.get(VISITORS_KEY) {
    None => Ok(&[]),
    Some(Value::Array(items)) => Ok(items),
    Some(_) => Err(corrupt()),
  }
}

fn visitors_mut(doc: &mut Document) -> Result<&mut Vec<Value>> {
  doc
    .entry(VISITORS_KEY)
    .or_insert_with(|| Value::Array(Vec::new()))
    .as_array_mut()
    .ok_or_else(corrupt)
}

fn as_record(item: &Value) -> Result<&FlatRecord> {
  item.as_object().ok_or_else(corrupt)
}

fn has_id(record: &FlatRecord, id: &str) -> bool {
  record.get("id").and_then(Value::as_str) == Some(id)
}

/// Index of the record with `id`, if any.
fn position(items: &[Value], id: &str) -> Result<Option<usize>> {
  for (index, item) in items.iter().enumerate() {
    if has_id(as_record(item)?, id) {
      return Ok(Some(index));
    }
  }
  Ok(None)
}

// ─── VisitorRepository impl ──────────────────────────────────────────────────

impl VisitorRepository for LocalStore {
  type Error = Error;

  fn shape(&self) -> RecordShape { RecordShape::Domain }

  async fn create(&self, mut record: FlatRecord) -> Result<FlatRecord> {
    let id = match record.get("id").and_then(Value::as_str) {
      Some(id) if !id.trim().is_empty() => id.to_owned(),
      _ => {
        let id = Uuid::new_v4().to_string();
        record.insert("id".to_owned(), Value::String(id.clone()));
        id
      }
    };

    self
      .mutate(|doc| {
        if position(visitors(doc)?, &id)?.is_some() {
          return Err(Error::DuplicateId(id.clone()));
        }
        visitors_mut(doc)?.push(Value::Object(record.clone()));
        Ok(())
      })
      .await?;
    Ok(record)
  }

  async fn get_by_id(&self, id: &str) -> Result<Option<FlatRecord>> {
    let doc = self.doc.lock().await;
    let items = visitors(&doc)?;
    Ok(position(items, id)?.map(|i| as_record(&items[i])).transpose()?.cloned())
  }

  async fn list_by_society(&self, society_id: &str) -> Result<Vec<FlatRecord>> {
    let doc = self.doc.lock().await;
    let mut visits = Vec::new();
    for item in visitors(&doc)?.iter().rev() {
      let record = as_record(item)?;
      if record.get("societyId").and_then(Value::as_str) == Some(society_id) {
        visits.push(record.clone());
      }
    }
    drop(doc);

    // Stable sort on the fixed-width timestamp text keeps later inserts first
    // among equal entry times.
    visits.sort_by(|a, b| {
      let entry = |r: &FlatRecord| {
        r.get("entryTime").and_then(Value::as_str).unwrap_or_default().to_owned()
      };
      entry(b).cmp(&entry(a))
    });
    Ok(visits)
  }

  async fn set_status(
    &self,
    id: &str,
    status: VisitStatus,
  ) -> Result<Option<FlatRecord>> {
    self
      .update_field(id, "status", Value::String(status.as_ref().to_owned()))
      .await
  }

  async fn record_exit(
    &self,
    id: &str,
    at: DateTime<Utc>,
  ) -> Result<Option<FlatRecord>> {
    self
      .update_field(id, "exitTime", Value::String(format_timestamp(at)))
      .await
  }
}
