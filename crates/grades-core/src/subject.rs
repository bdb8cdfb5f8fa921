//! Subject, the top-level graded entity.
//!
//! A subject owns its competencies: removing a subject removes them too.

use serde::{Deserialize, Serialize};

use crate::{audit::Audit, competency::Competency, patch::Patch};

/// A subject as loaded from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
  pub id:           i64,
  /// Unique among active subjects; 2–100 characters.
  pub name:         String,
  pub description:  Option<String>,
  #[serde(flatten)]
  pub audit:        Audit,
  /// `None` when the relation was not loaded. The rules layer replaces it
  /// with an empty vector before a subject is handed to callers.
  pub competencies: Option<Vec<Competency>>,
}

impl Subject {
  pub fn summary(&self) -> SubjectSummary {
    SubjectSummary {
      id:          self.id,
      name:        self.name.clone(),
      description: self.description.clone(),
      audit:       self.audit.clone(),
    }
  }
}

/// A subject without its competency relation, embedded in
/// [`Competency::subject`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSummary {
  pub id:          i64,
  pub name:        String,
  pub description: Option<String>,
  #[serde(flatten)]
  pub audit:       Audit,
}

impl From<Subject> for SubjectSummary {
  fn from(s: Subject) -> Self {
    Self {
      id:          s.id,
      name:        s.name,
      description: s.description,
      audit:       s.audit,
    }
  }
}

/// Input to [`crate::store::GradeStore::insert_subject`]. Fields are already
/// validated; the store assigns the id and audit fields.
#[derive(Debug, Clone)]
pub struct NewSubject {
  pub name:        String,
  pub description: Option<String>,
}

/// Request payload for creating a subject.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSubject {
  pub name:        String,
  pub description: Option<String>,
}

/// Request payload for a partial subject update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateSubject {
  #[serde(default)]
  pub name:        Patch<String>,
  #[serde(default)]
  pub description: Patch<String>,
}
