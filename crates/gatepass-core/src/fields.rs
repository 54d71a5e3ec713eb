//! Field Mapper: translation between domain-shape and storage-shape keys.
//!
//! Domain-shape records use the camelCase names the forms submit
//! (`residentId`, `contactNumber`). The persistence backend stores flattened
//! lowercase column names (`residentid`, `contactnumber`). [`FIELDS`] is the
//! single table both directions are derived from; keys outside it are
//! lowercased on the way in and passed through untouched on the way out.

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::error::MappingError;

/// A flat field-name → value record, in either shape.
pub type FlatRecord = Map<String, Value>;

/// The one field allowed to carry an opaque (possibly non-scalar) value.
pub const PHOTO_FIELD: &str = "photo";

// ─── Static table ────────────────────────────────────────────────────────────

/// A domain key and the storage column it is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
  pub domain:  &'static str,
  pub storage: &'static str,
}

const fn field(domain: &'static str, storage: &'static str) -> FieldMapping {
  FieldMapping { domain, storage }
}

/// Every field the application writes, in storage column order.
pub const FIELDS: &[FieldMapping] = &[
  field("id", "id"),
  field("name", "name"),
  field("gender", "gender"),
  field("contactNumber", "contactnumber"),
  field("idProofDescription", "idproof"),
  field("comingFrom", "comingfrom"),
  field("purpose", "purpose"),
  field("residentId", "residentid"),
  field("societyId", "societyid"),
  field("status", "status"),
  field("entryTime", "entrytime"),
  field("exitTime", "exittime"),
  field("photo", "photo"),
  field("createdBy", "createdby"),
  field("createdAt", "createdat"),
];

/// Storage columns a backend must provide to hold every known field.
pub fn mapped_storage_columns() -> impl Iterator<Item = &'static str> {
  FIELDS.iter().map(|f| f.storage)
}

// ─── Key translation ─────────────────────────────────────────────────────────

/// Which way a record is being translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  ToStorage,
  ToDomain,
}

/// The storage key for `domain`: the table entry if there is one, otherwise
/// the lowercased key.
pub fn storage_key(domain: &str) -> Cow<'_, str> {
  match FIELDS.iter().find(|f| f.domain == domain) {
    Some(f) => Cow::Borrowed(f.storage),
    None => Cow::Owned(domain.to_lowercase()),
  }
}

/// The domain key for `storage`. Keys outside the table come back unchanged;
/// their original casing is not recoverable.
pub fn domain_key(storage: &str) -> &str {
  FIELDS
    .iter()
    .find(|f| f.storage == storage)
    .map_or(storage, |f| f.domain)
}

// ─── Record translation ──────────────────────────────────────────────────────

/// Translate every key of `record` in `direction`.
pub fn map_record(
  record: &FlatRecord,
  direction: Direction,
) -> Result<FlatRecord, MappingError> {
  let mut out = FlatRecord::new();

  for (key, value) in record {
    if key != PHOTO_FIELD && matches!(value, Value::Object(_) | Value::Array(_))
    {
      return Err(MappingError::NestedValue { field: key.clone() });
    }

    let mapped = match direction {
      Direction::ToStorage => storage_key(key).into_owned(),
      Direction::ToDomain => domain_key(key).to_owned(),
    };

    if out.contains_key(&mapped) {
      return Err(MappingError::KeyCollision { key: mapped });
    }
    out.insert(mapped, value.clone());
  }

  Ok(out)
}

/// Domain shape → storage shape.
pub fn to_storage(record: &FlatRecord) -> Result<FlatRecord, MappingError> {
  map_record(record, Direction::ToStorage)
}

/// Storage shape → domain shape.
pub fn to_domain(record: &FlatRecord) -> Result<FlatRecord, MappingError> {
  map_record(record, Direction::ToDomain)
}

/// Unwrap a JSON value that must be a flat record.
pub fn flat_record(value: Value) -> Result<FlatRecord, MappingError> {
  match value {
    Value::Object(map) => Ok(map),
    _ => Err(MappingError::NotAnObject),
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn record(value: Value) -> FlatRecord { flat_record(value).unwrap() }

  #[test]
  fn irregular_keys_use_the_table() {
    assert_eq!(storage_key("idProofDescription"), "idproof");
    assert_eq!(storage_key("residentId"), "residentid");
    assert_eq!(domain_key("idproof"), "idProofDescription");
    assert_eq!(domain_key("createdat"), "createdAt");
  }

  #[test]
  fn unknown_keys_are_lowercased_then_passed_through() {
    assert_eq!(storage_key("vehicleNumber"), "vehiclenumber");
    assert_eq!(domain_key("vehiclenumber"), "vehiclenumber");
  }

  #[test]
  fn table_is_a_bijection() {
    for (i, a) in FIELDS.iter().enumerate() {
      for b in &FIELDS[i + 1..] {
        assert_ne!(a.domain, b.domain);
        assert_ne!(a.storage, b.storage);
      }
    }
  }

  #[test]
  fn to_storage_maps_a_submission() {
    let domain = record(json!({
      "name": "Ravi Kumar",
      "residentId": "r1",
      "societyId": "s1",
      "contactNumber": "9876543210",
      "idProofDescription": "Aadhaar",
    }));

    let storage = to_storage(&domain).unwrap();
    assert_eq!(
      Value::Object(storage),
      json!({
        "name": "Ravi Kumar",
        "residentid": "r1",
        "societyid": "s1",
        "contactnumber": "9876543210",
        "idproof": "Aadhaar",
      })
    );
  }

  #[test]
  fn unknown_field_loses_its_casing_on_round_trip() {
    let domain = record(json!({ "vehicleNumber": "KA01AB1234" }));
    let back = to_domain(&to_storage(&domain).unwrap()).unwrap();
    assert!(back.contains_key("vehiclenumber"));
    assert!(!back.contains_key("vehicleNumber"));
  }

  #[test]
  fn nested_values_are_rejected() {
    let domain = record(json!({ "name": "A", "purpose": { "kind": "delivery" } }));
    assert_eq!(
      to_storage(&domain),
      Err(MappingError::NestedValue { field: "purpose".into() })
    );

    let domain = record(json!({ "name": "A", "residentId": ["r1", "r2"] }));
    assert!(matches!(
      to_storage(&domain),
      Err(MappingError::NestedValue { .. })
    ));
  }

  #[test]
  fn photo_may_hold_an_opaque_value() {
    let domain = record(json!({ "photo": { "pending": true } }));
    let storage = to_storage(&domain).unwrap();
    assert_eq!(storage["photo"], json!({ "pending": true }));
  }

  #[test]
  fn colliding_keys_are_rejected() {
    let domain = record(json!({ "residentId": "r1", "residentid": "r2" }));
    assert_eq!(
      to_storage(&domain),
      Err(MappingError::KeyCollision { key: "residentid".into() })
    );
  }

  #[test]
  fn non_object_is_not_a_record() {
    assert_eq!(flat_record(json!([1, 2])), Err(MappingError::NotAnObject));
    assert_eq!(flat_record(json!("x")), Err(MappingError::NotAnObject));
  }

  #[test]
  fn null_values_survive_mapping() {
    let domain = record(json!({ "exitTime": null }));
    let storage = to_storage(&domain).unwrap();
    assert_eq!(storage["exittime"], Value::Null);
  }
}
