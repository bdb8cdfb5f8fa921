//! Rules for [`Competency`]: names are unique within the parent subject and
//! marks stay in `[MIN_MARKS, MAX_MARKS]`.

use serde_json::Value;

use crate::{
  Error, Result,
  competency::{Competency, MAX_MARKS, MIN_MARKS},
  guard,
  patch::Patch,
  rules::clean_name,
  store::GradeStore,
  subject::{Subject, SubjectSummary},
};

const NAME_FIELD: &str = "Competency name";
const MARKS_FIELD: &str = "Marks";

/// The cleaned subset of a create or update payload. `None` means the field
/// was not supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidCompetency {
  pub name:  Option<String>,
  pub marks: Option<u8>,
}

/// Coerce and range-check a raw marks value.
pub fn validate_marks(raw: &Value) -> Result<u8> {
  let marks = guard::safe_number(Some(raw), 0.0);

  let range = f64::from(MIN_MARKS)..=f64::from(MAX_MARKS);
  if !range.contains(&marks) {
    tracing::warn!("Invalid marks value: {marks}");
    return Err(Error::invalid(format!(
      "{MARKS_FIELD} must be between {MIN_MARKS} and {MAX_MARKS}"
    )));
  }
  if marks.fract() != 0.0 {
    tracing::warn!("Invalid marks value: {marks}");
    return Err(Error::invalid(format!("{MARKS_FIELD} must be an integer")));
  }

  // In range and integral, so the cast is exact.
  Ok(marks as u8)
}

/// Validate whichever fields are present. An explicit `null` is rejected for
/// both: neither field can be cleared.
pub fn validate_input(
  name: Patch<&str>,
  marks: Patch<&Value>,
) -> Result<ValidCompetency> {
  let mut valid = ValidCompetency::default();

  match name {
    Patch::Absent => {}
    Patch::Null => return Err(cannot_clear(NAME_FIELD)),
    Patch::Value(name) => {
      valid.name = Some(clean_name(Some(name), NAME_FIELD)?);
    }
  }

  match marks {
    Patch::Absent => {}
    Patch::Null => return Err(cannot_clear(MARKS_FIELD)),
    Patch::Value(raw) => valid.marks = Some(validate_marks(raw)?),
  }

  tracing::debug!("Validated competency input: {valid:?}");
  Ok(valid)
}

/// Fetch a prospective parent subject (without its competencies).
pub async fn find_subject_by_id_or_throw<S: GradeStore>(
  store: &S,
  id: i64,
) -> Result<Subject> {
  let id = guard::validate_id(Some(id), "Subject")?;
  tracing::debug!("Finding subject by ID: {id}");

  store
    .find_subject(id, false)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| {
      tracing::warn!("Subject with ID {id} not found");
      Error::SubjectNotFound(id)
    })
}

/// Fetch a competency with its subject relation.
///
/// A competency whose relation did not load means the store broke the
/// foreign-key invariant; that is an [`Error::Internal`], not a user error.
pub async fn find_competency_by_id_or_throw<S: GradeStore>(
  store: &S,
  id: i64,
) -> Result<Competency> {
  let id = guard::validate_id(Some(id), "Competency")?;
  tracing::debug!("Finding competency by ID: {id}");

  let Some(competency) =
    store.find_competency(id).await.map_err(Error::store)?
  else {
    tracing::warn!("Competency with ID {id} not found");
    return Err(Error::CompetencyNotFound(id));
  };

  if competency.subject.is_none() {
    tracing::error!("Competency {id} has null subject relation");
    return Err(Error::Internal(
      "Competency subject relation is missing".to_owned(),
    ));
  }

  tracing::debug!("Found competency: {}", competency.name);
  Ok(competency)
}

/// Look up a competency by (trimmed) name within one subject.
///
/// An invalid subject id or a store failure is logged and reported as no
/// match.
pub async fn find_by_name_in_subject<S: GradeStore>(
  store: &S,
  name: &str,
  subject_id: i64,
) -> Option<Competency> {
  if guard::is_null_or_empty(Some(name)) {
    return None;
  }

  let subject_id = match guard::validate_id(Some(subject_id), "Subject") {
    Ok(id) => id,
    Err(e) => {
      tracing::error!("Failed to find competency by name: {e}");
      return None;
    }
  };

  let name = name.trim();
  tracing::debug!(
    "Finding competency by name: {name} in subject: {subject_id}"
  );

  match store.find_competency_by_name(name, subject_id).await {
    Ok(found) => found,
    Err(e) => {
      tracing::error!("Failed to find competency by name: {e}");
      None
    }
  }
}

/// Fail with [`Error::CompetencyAlreadyExists`] if another competency of
/// `subject` already uses `name`.
pub async fn ensure_unique_name<S: GradeStore>(
  store: &S,
  name: &str,
  subject: &SubjectSummary,
  exclude_id: Option<i64>,
) -> Result<()> {
  if let Some(existing) = find_by_name_in_subject(store, name, subject.id).await
    && Some(existing.id) != exclude_id
  {
    tracing::warn!(
      "Attempt to create/update duplicate competency: {name} in subject: {}",
      subject.name
    );
    return Err(Error::CompetencyAlreadyExists {
      name:    name.to_owned(),
      subject: subject.name.clone(),
    });
  }

  tracing::debug!(
    "Competency name '{name}' is unique in subject '{}'",
    subject.name
  );
  Ok(())
}

/// Backfill a missing subject relation with `parent` so every returned
/// competency carries its subject.
pub fn validate_array(
  mut competencies: Vec<Competency>,
  parent: &SubjectSummary,
) -> Vec<Competency> {
  for competency in &mut competencies {
    if competency.subject.is_none() {
      tracing::warn!(
        "Competency {} has null subject, setting to parent",
        competency.id
      );
      competency.subject = Some(parent.clone());
    }
  }

  tracing::debug!("Validated {} competencies", competencies.len());
  competencies
}

/// Apply the fields present in `valid`.
pub fn update_fields(competency: &mut Competency, valid: ValidCompetency) {
  if let Some(name) = valid.name {
    tracing::debug!("Updated competency name to: {name}");
    competency.name = name;
  }
  if let Some(marks) = valid.marks {
    tracing::debug!("Updated competency marks to: {marks}");
    competency.marks = marks;
  }
}

fn cannot_clear(field: &str) -> Error {
  Error::invalid(format!("{field} cannot be cleared"))
}
