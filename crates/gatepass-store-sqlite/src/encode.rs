//! Encoding between storage-shape flat records and SQLite text columns.
//!
//! Every column is text. Strings are stored as-is, `null` as SQL `NULL`, other
//! scalars by their JSON rendering. Reads produce strings only; `NULL` columns
//! are left out of the record so absent fields stay absent.

use gatepass_core::fields::FlatRecord;
use serde_json::Value;

use crate::{Error, Result};

/// One column of a row about to be written.
pub struct Cell {
  pub column: String,
  pub text:   Option<String>,
}

pub fn encode_value(value: &Value) -> Option<String> {
  match value {
    Value::Null => None,
    Value::String(s) => Some(s.clone()),
    other => Some(other.to_string()),
  }
}

/// Turn `record` into cells, checking every key against `columns` and every
/// value against `limit` bytes.
pub fn encode_record(
  record: &FlatRecord,
  columns: &[String],
  limit: usize,
) -> Result<Vec<Cell>> {
  record
    .iter()
    .map(|(column, value)| {
      if !columns.iter().any(|c| c == column) {
        return Err(Error::MissingColumn { column: column.clone() });
      }
      let text = encode_value(value);
      if let Some(len) = text.as_ref().map(String::len)
        && len > limit
      {
        return Err(Error::PayloadTooLarge { column: column.clone(), len, limit });
      }
      Ok(Cell { column: column.clone(), text })
    })
    .collect()
}

/// Raw text read from a `visitors` row, paired with its column names.
pub struct RawRow {
  pub cells: Vec<(String, Option<String>)>,
}

impl RawRow {
  pub fn read(row: &rusqlite::Row<'_>, columns: &[String]) -> rusqlite::Result<Self> {
    let cells = columns
      .iter()
      .enumerate()
      .map(|(i, c)| Ok((c.clone(), row.get::<_, Option<String>>(i)?)))
      .collect::<rusqlite::Result<_>>()?;
    Ok(Self { cells })
  }

  pub fn into_record(self) -> FlatRecord {
    self
      .cells
      .into_iter()
      .filter_map(|(c, text)| text.map(|t| (c, Value::String(t))))
      .collect()
  }
}
