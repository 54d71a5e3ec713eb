//! [`SqliteStore`], the SQLite implementation of [`VisitorRepository`].

use std::{path::Path, sync::Arc};

use chrono::{DateTime, Utc};
use gatepass_core::{
  fields::{FlatRecord, mapped_storage_columns},
  store::{RecordShape, VisitorRepository},
  visitor::{VisitStatus, format_timestamp},
};
use rusqlite::OptionalExtension as _;
use serde_json::Value;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{RawRow, encode_record},
  schema::{SCHEMA, TABLE},
};

/// Largest value accepted for any column, in bytes. Photos are the only
/// values that come close.
pub const DEFAULT_MAX_VALUE_LEN: usize = 5 * 1024 * 1024;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A visitor store backed by a single SQLite file.
///
/// Clones share one connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  /// Columns of the `visitors` table as found at open time.
  columns:        Arc<Vec<String>>,
  max_value_len:  usize,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open a fresh in-memory database.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;

    let mut store = Self {
      conn,
      columns: Arc::new(Vec::new()),
      max_value_len: DEFAULT_MAX_VALUE_LEN,
    };
    store.reload_columns().await?;
    Ok(store)
  }

  /// Reject any single value longer than `limit` bytes.
  pub fn with_max_value_len(mut self, limit: usize) -> Self {
    self.max_value_len = limit;
    self
  }

  /// Columns the table lacks for fields the application writes.
  pub fn missing_columns(&self) -> Vec<&'static str> {
    mapped_storage_columns()
      .filter(|c| !self.columns.iter().any(|have| have == c))
      .collect()
  }

  /// Re-read the table's column list, e.g. after an out-of-band migration.
  pub(crate) async fn reload_columns(&mut self) -> Result<()> {
    let columns: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({TABLE})"))?;
        let names = stmt
          .query_map([], |row| row.get::<_, String>(1))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
      })
      .await?;

    self.columns = Arc::new(columns);
    let missing = self.missing_columns();
    if !missing.is_empty() {
      tracing::warn!(?missing, "visitors table is missing columns");
    }
    Ok(())
  }

  fn select_list(&self) -> String { self.columns.join(", ") }

  async fn query_rows(
    &self,
    clause: &'static str,
    param: String,
  ) -> Result<Vec<FlatRecord>> {
    let columns = Arc::clone(&self.columns);
    let sql = format!("SELECT {} FROM {TABLE} {clause}", self.select_list());

    let raws: Vec<RawRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![param], |row| RawRow::read(row, &columns))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawRow::into_record).collect())
  }

  /// Set one column of one row; `None` if no row has `id`.
  async fn update_column(
    &self,
    id: &str,
    column: &'static str,
    text: String,
  ) -> Result<Option<FlatRecord>> {
    let id_str = id.to_owned();
    let sql = format!("UPDATE {TABLE} SET {column} = ?2 WHERE id = ?1");

    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params![id_str, text])?))
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_by_id(id).await
  }
}

// ─── VisitorRepository impl ──────────────────────────────────────────────────

impl VisitorRepository for SqliteStore {
  type Error = Error;

  fn shape(&self) -> RecordShape { RecordShape::Storage }

  async fn create(&self, mut record: FlatRecord) -> Result<FlatRecord> {
    let existing = record
      .get("id")
      .and_then(Value::as_str)
      .filter(|id| !id.trim().is_empty())
      .map(str::to_owned);
    let id = match existing {
      Some(id) => id,
      None => {
        let id = Uuid::new_v4().to_string();
        record.insert("id".to_owned(), Value::String(id.clone()));
        id
      }
    };

    let cells = encode_record(&record, &self.columns, self.max_value_len)?;
    let names: Vec<&str> = cells.iter().map(|c| c.column.as_str()).collect();
    let placeholders: Vec<String> =
      (1..=cells.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
      "INSERT INTO {TABLE} ({}) VALUES ({})",
      names.join(", "),
      placeholders.join(", ")
    );
    let values: Vec<Option<String>> = cells.into_iter().map(|c| c.text).collect();

    self
      .conn
      .call(move |conn| {
        conn.execute(&sql, rusqlite::params_from_iter(values.iter()))?;
        Ok(())
      })
      .await?;

    self.get_by_id(&id).await?.ok_or(Error::Vanished(id))
  }

  async fn get_by_id(&self, id: &str) -> Result<Option<FlatRecord>> {
    let columns = Arc::clone(&self.columns);
    let sql = format!("SELECT {} FROM {TABLE} WHERE id = ?1", self.select_list());
    let id_str = id.to_owned();

    let raw: Option<RawRow> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], |row| {
              RawRow::read(row, &columns)
            })
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawRow::into_record))
  }

  async fn list_by_society(&self, society_id: &str) -> Result<Vec<FlatRecord>> {
    self
      .query_rows(
        "WHERE societyid = ?1 ORDER BY entrytime DESC, rowid DESC",
        society_id.to_owned(),
      )
      .await
  }

  async fn set_status(
    &self,
    id: &str,
    status: VisitStatus,
  ) -> Result<Option<FlatRecord>> {
    self.update_column(id, "status", status.as_ref().to_owned()).await
  }

  async fn record_exit(
    &self,
    id: &str,
    at: DateTime<Utc>,
  ) -> Result<Option<FlatRecord>> {
    self.update_column(id, "exittime", format_timestamp(at)).await
  }
}
