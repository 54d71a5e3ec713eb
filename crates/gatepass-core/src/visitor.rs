//! Visitor types: the record a gate submission becomes.
//!
//! A [`VisitorDraft`] is what a form posts: every field optional, nothing
//! checked. A [`VisitorRecord`] is what gets persisted, with identity,
//! ownership, status and timestamps filled in.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  fields::{FlatRecord, flat_record},
};

/// `createdBy` value for visits a guest registered without a signed-in user.
pub const SELF_REGISTERED: &str = "self-registered";

// ─── Enums ───────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Gender {
  #[default]
  Male,
  Female,
  Other,
}

/// Where a visit sits in the approval workflow.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VisitStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// Render a timestamp the way every record stores it: RFC 3339, UTC,
/// millisecond precision. Fixed width keeps text ordering chronological.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
  at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The current time at the precision records keep.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(3) }

mod timestamp {
  use chrono::{DateTime, Utc};
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(
    at: &DateTime<Utc>,
    s: S,
  ) -> Result<S::Ok, S::Error> {
    s.serialize_str(&super::format_timestamp(*at))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    d: D,
  ) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(d)?;
    DateTime::parse_from_rfc3339(&raw)
      .map(|dt| dt.with_timezone(&Utc))
      .map_err(serde::de::Error::custom)
  }

  pub mod option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
      at: &Option<DateTime<Utc>>,
      s: S,
    ) -> Result<S::Ok, S::Error> {
      match at {
        Some(at) => super::serialize(at, s),
        None => s.serialize_none(),
      }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
      d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
      Option::<String>::deserialize(d)?
        .map(|raw| {
          DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
  }
}

// ─── VisitorRecord ───────────────────────────────────────────────────────────

/// A persisted visit, in domain shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorRecord {
  pub id:                   String,
  pub name:                 String,
  #[serde(default)]
  pub gender:               Gender,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id_proof_description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub coming_from:          Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub purpose:              Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub contact_number:       Option<String>,
  pub resident_id:          String,
  pub society_id:           String,
  /// User who registered the visit, or [`SELF_REGISTERED`].
  #[serde(default = "self_registered")]
  pub created_by:           String,
  /// Embedded-image data string (`data:image/...;base64,...`).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub photo:                Option<String>,
  #[serde(default)]
  pub status:               VisitStatus,
  #[serde(with = "timestamp")]
  pub entry_time:           DateTime<Utc>,
  #[serde(
    default,
    with = "timestamp::option",
    skip_serializing_if = "Option::is_none"
  )]
  pub exit_time:            Option<DateTime<Utc>>,
  /// Absent on rows written before the column existed.
  #[serde(
    default,
    with = "timestamp::option",
    skip_serializing_if = "Option::is_none"
  )]
  pub created_at:           Option<DateTime<Utc>>,
}

fn self_registered() -> String { SELF_REGISTERED.to_owned() }

impl VisitorRecord {
  /// Serialise into a flat domain-shape record.
  pub fn to_flat(&self) -> Result<FlatRecord> {
    Ok(flat_record(serde_json::to_value(self)?)?)
  }

  /// Deserialise from a flat domain-shape record.
  pub fn from_flat(record: FlatRecord) -> Result<Self> {
    Ok(serde_json::from_value(serde_json::Value::Object(record))?)
  }

  pub fn is_self_registered(&self) -> bool {
    self.created_by == SELF_REGISTERED
  }
}

// ─── VisitorDraft ────────────────────────────────────────────────────────────

/// A visitor as submitted by a form, before any checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisitorDraft {
  pub id:                   Option<String>,
  pub name:                 Option<String>,
  pub gender:               Option<Gender>,
  pub id_proof_description: Option<String>,
  pub coming_from:          Option<String>,
  pub purpose:              Option<String>,
  pub contact_number:       Option<String>,
  pub resident_id:          Option<String>,
  pub society_id:           Option<String>,
  pub created_by:           Option<String>,
  pub photo:                Option<String>,
}

/// `Some` only for a value with non-whitespace content.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
  value.as_deref().filter(|v| !v.trim().is_empty())
}

fn owned_present(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

impl VisitorDraft {
  /// Build the record persisted for this draft at time `at`.
  ///
  /// `name`, `residentId` and `societyId` are trimmed and blank optional
  /// fields are dropped. A missing `id` is generated, a missing `createdBy`
  /// becomes [`SELF_REGISTERED`]. Fails only when a required field is absent,
  /// which [`crate::validate::validate`] reports first.
  pub fn into_record(self, at: DateTime<Utc>) -> Result<VisitorRecord> {
    let mut missing = Vec::new();
    if present(&self.name).is_none() {
      missing.push("name is required".to_owned());
    }
    if present(&self.resident_id).is_none() {
      missing.push("residentId is required".to_owned());
    }
    if present(&self.society_id).is_none() {
      missing.push("societyId is required".to_owned());
    }
    let (Some(name), Some(resident_id), Some(society_id)) = (
      owned_present(self.name),
      owned_present(self.resident_id),
      owned_present(self.society_id),
    ) else {
      return Err(Error::Validation(missing));
    };

    Ok(VisitorRecord {
      id: owned_present(self.id).unwrap_or_else(|| Uuid::new_v4().to_string()),
      name: name.trim().to_owned(),
      gender: self.gender.unwrap_or_default(),
      id_proof_description: owned_present(self.id_proof_description),
      coming_from: owned_present(self.coming_from),
      purpose: owned_present(self.purpose),
      contact_number: owned_present(self.contact_number),
      resident_id: resident_id.trim().to_owned(),
      society_id: society_id.trim().to_owned(),
      created_by: owned_present(self.created_by)
        .unwrap_or_else(self_registered),
      photo: owned_present(self.photo),
      status: VisitStatus::Pending,
      entry_time: at,
      exit_time: None,
      created_at: Some(at),
    })
  }
}
