//! Visitor Validator. Gates a draft before it is mapped and persisted.
//!
//! Identity and ownership fields are hard requirements: a visit must always be
//! attributable to a resident and a society. Descriptive fields only produce
//! warnings.

use serde::Serialize;

use crate::visitor::{SELF_REGISTERED, VisitorDraft, present};

/// Digits a contact number must have once punctuation is stripped.
pub const CONTACT_DIGITS: usize = 10;

/// Outcome of [`validate`]. Errors block persistence; warnings do not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
  pub is_valid: bool,
  pub errors:   Vec<String>,
  pub warnings: Vec<String>,
}

/// The digits of a contact number, everything else removed.
pub fn contact_digits(raw: &str) -> String {
  raw.chars().filter(char::is_ascii_digit).collect()
}

/// Check `draft`.
///
/// Required fields are checked in order `name`, `residentId`, `societyId`,
/// stopping at the first one missing. Soft checks always run.
pub fn validate(draft: &VisitorDraft) -> ValidationReport {
  let required = [
    ("name", &draft.name),
    ("residentId", &draft.resident_id),
    ("societyId", &draft.society_id),
  ];

  let errors: Vec<String> = required
    .iter()
    .find(|(_, value)| present(value).is_none())
    .map(|(field, _)| format!("{field} is required"))
    .into_iter()
    .collect();

  let mut warnings = Vec::new();

  match present(&draft.created_by) {
    None => warnings
      .push("createdBy is missing; visit recorded as self-registered".into()),
    Some(SELF_REGISTERED) => warnings
      .push("visit is self-registered and not attributed to a user".into()),
    Some(_) => {}
  }

  if let Some(number) = present(&draft.contact_number) {
    let digits = contact_digits(number).len();
    if digits != CONTACT_DIGITS {
      warnings.push(format!(
        "contactNumber should have exactly {CONTACT_DIGITS} digits, found \
         {digits}"
      ));
    }
  }

  if draft.gender.is_none() {
    warnings.push("gender not provided; defaulting to male".into());
  }
  for (field, value) in [
    ("idProofDescription", &draft.id_proof_description),
    ("comingFrom", &draft.coming_from),
    ("purpose", &draft.purpose),
  ] {
    if present(value).is_none() {
      warnings.push(format!("{field} not provided"));
    }
  }

  if let Some(first) = errors.first() {
    tracing::debug!(error = %first, "visitor draft failed validation");
  }

  ValidationReport { is_valid: errors.is_empty(), errors, warnings }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::visitor::Gender;

  fn complete() -> VisitorDraft {
    VisitorDraft {
      name: Some("Ravi Kumar".into()),
      gender: Some(Gender::Male),
      id_proof_description: Some("Aadhaar XXXX-1234".into()),
      coming_from: Some("Indiranagar".into()),
      purpose: Some("Delivery".into()),
      contact_number: Some("9876543210".into()),
      resident_id: Some("r1".into()),
      society_id: Some("s1".into()),
      created_by: Some("guard-1".into()),
      ..Default::default()
    }
  }

  #[test]
  fn complete_draft_is_clean() {
    let report = validate(&complete());
    assert!(report.is_valid);
    assert!(report.errors.is_empty());
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
  }

  #[test]
  fn missing_name_is_an_error() {
    let mut d = complete();
    d.name = Some("   ".into());
    let report = validate(&d);
    assert!(!report.is_valid);
    assert_eq!(report.errors, vec!["name is required"]);
  }

  #[test]
  fn missing_resident_is_an_error() {
    let mut d = complete();
    d.resident_id = None;
    let report = validate(&d);
    assert!(!report.is_valid);
    assert_eq!(report.errors, vec!["residentId is required"]);
  }

  #[test]
  fn missing_society_is_an_error() {
    let mut d = complete();
    d.society_id = Some(String::new());
    let report = validate(&d);
    assert!(!report.is_valid);
    assert_eq!(report.errors, vec!["societyId is required"]);
  }

  #[test]
  fn required_checks_stop_at_the_first_violation() {
    let report = validate(&VisitorDraft::default());
    assert_eq!(report.errors, vec!["name is required"]);
  }

  #[test]
  fn bad_contact_number_only_warns() {
    let mut d = complete();
    d.contact_number = Some("98765-4321".into());
    let report = validate(&d);
    assert!(report.is_valid);
    assert_eq!(
      report.warnings,
      vec!["contactNumber should have exactly 10 digits, found 9"]
    );
  }

  #[test]
  fn formatted_contact_number_is_accepted() {
    let mut d = complete();
    d.contact_number = Some("(987) 654-3210".into());
    assert!(validate(&d).warnings.is_empty());
  }

  #[test]
  fn missing_descriptive_fields_warn_in_order() {
    let d = VisitorDraft {
      name: Some("A".into()),
      resident_id: Some("r1".into()),
      society_id: Some("s1".into()),
      created_by: Some("guard-1".into()),
      ..Default::default()
    };
    let report = validate(&d);
    assert!(report.is_valid);
    assert_eq!(
      report.warnings,
      vec![
        "gender not provided; defaulting to male",
        "idProofDescription not provided",
        "comingFrom not provided",
        "purpose not provided",
      ]
    );
  }

  #[test]
  fn created_by_is_never_a_hard_failure() {
    let mut d = complete();
    d.created_by = None;
    let report = validate(&d);
    assert!(report.is_valid);
    assert_eq!(
      report.warnings,
      vec!["createdBy is missing; visit recorded as self-registered"]
    );

    d.created_by = Some(SELF_REGISTERED.into());
    let report = validate(&d);
    assert!(report.is_valid);
    assert_eq!(
      report.warnings,
      vec!["visit is self-registered and not attributed to a user"]
    );
  }

  #[test]
  fn contact_digits_strips_punctuation() {
    assert_eq!(contact_digits("+91 98765-43210"), "919876543210");
  }
}
