//! Competency: a gradable item belonging to exactly one subject.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{audit::Audit, patch::Patch, subject::SubjectSummary};

/// Inclusive bounds for [`Competency::marks`].
pub const MIN_MARKS: u8 = 0;
pub const MAX_MARKS: u8 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competency {
  pub id:         i64,
  /// Unique within the parent subject; 2–100 characters.
  pub name:       String,
  pub marks:      u8,
  pub subject_id: i64,
  /// The parent relation. Omitted when it was not loaded, e.g. when the
  /// competency is nested inside its subject.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subject:    Option<SubjectSummary>,
  #[serde(flatten)]
  pub audit:      Audit,
}

/// Input to [`crate::store::GradeStore::insert_competency`].
#[derive(Debug, Clone)]
pub struct NewCompetency {
  pub name:       String,
  pub marks:      u8,
  pub subject_id: i64,
}

/// Request payload for creating a competency under a subject.
///
/// `marks` is kept as raw JSON so numeric strings are accepted the same way
/// as numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCompetency {
  pub name:  String,
  pub marks: Value,
}

/// Request payload for a partial competency update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCompetency {
  #[serde(default)]
  pub name:  Patch<String>,
  #[serde(default)]
  pub marks: Patch<Value>,
}
