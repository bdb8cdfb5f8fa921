//! Rules for [`Subject`]: names are unique across all active subjects.

use crate::{
  Error, Result, guard,
  patch::Patch,
  rules::clean_name,
  store::GradeStore,
  subject::{CreateSubject, Subject, UpdateSubject},
};

const NAME_FIELD: &str = "Subject name";

/// Cleaned fields of a [`CreateSubject`] payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubject {
  pub name:        String,
  pub description: Option<String>,
}

/// Validate and trim a subject name.
pub fn validate_name(name: Option<&str>) -> Result<String> {
  clean_name(name, NAME_FIELD)
}

/// Clean a create payload. The description is passed through as given.
pub fn validate_input(dto: &CreateSubject) -> Result<ValidSubject> {
  Ok(ValidSubject {
    name:        validate_name(Some(&dto.name))?,
    description: dto.description.clone(),
  })
}

/// Replace an unloaded competency relation with an empty one.
pub fn ensure_competencies(subject: &mut Subject) {
  subject.competencies.get_or_insert_with(Vec::new);
}

/// Fetch a subject with its competencies, failing with
/// [`Error::SubjectNotFound`] if it does not exist.
pub async fn find_by_id_or_throw<S: GradeStore>(
  store: &S,
  id: i64,
) -> Result<Subject> {
  let id = guard::validate_id(Some(id), "Subject")?;
  tracing::debug!("Finding subject by ID: {id}");

  let Some(mut subject) =
    store.find_subject(id, true).await.map_err(Error::store)?
  else {
    tracing::warn!("Subject with ID {id} not found");
    return Err(Error::SubjectNotFound(id));
  };

  ensure_competencies(&mut subject);
  tracing::debug!("Found subject: {}", subject.name);
  Ok(subject)
}

/// Look up an active subject by (trimmed) name.
///
/// A store failure is logged and reported as no match.
pub async fn find_by_name<S: GradeStore>(
  store: &S,
  name: &str,
) -> Option<Subject> {
  if guard::is_null_or_empty(Some(name)) {
    return None;
  }

  let name = name.trim();
  tracing::debug!("Finding subject by name: {name}");

  match store.find_subject_by_name(name).await {
    Ok(found) => found,
    Err(e) => {
      tracing::error!("Failed to find subject by name: {e}");
      None
    }
  }
}

/// Fail with [`Error::SubjectAlreadyExists`] if another subject already uses
/// `name`. `exclude_id` is the subject being renamed, if any, so keeping its
/// current name passes.
pub async fn ensure_unique_name<S: GradeStore>(
  store: &S,
  name: &str,
  exclude_id: Option<i64>,
) -> Result<()> {
  if let Some(existing) = find_by_name(store, name).await
    && Some(existing.id) != exclude_id
  {
    tracing::warn!("Attempt to create/update duplicate subject: {name}");
    return Err(Error::SubjectAlreadyExists(name.to_owned()));
  }

  tracing::debug!("Subject name '{name}' is unique");
  Ok(())
}

/// Apply the fields present in `update`. Absent fields are left untouched;
/// a `null` description clears it, a `null` name is rejected.
pub fn update_fields(subject: &mut Subject, update: UpdateSubject) -> Result<()> {
  match update.name {
    Patch::Absent => {}
    Patch::Null => {
      return Err(Error::invalid(format!("{NAME_FIELD} cannot be cleared")));
    }
    Patch::Value(name) => {
      subject.name = validate_name(Some(&name))?;
      tracing::debug!("Updated subject name to: {}", subject.name);
    }
  }

  match update.description {
    Patch::Absent => {}
    Patch::Null => {
      subject.description = None;
      tracing::debug!("Cleared subject description");
    }
    Patch::Value(description) => {
      tracing::debug!("Updated subject description to: {description}");
      subject.description = Some(description);
    }
  }

  Ok(())
}

/// Normalise a listing so every subject carries a loaded relation.
pub fn validate_array(mut subjects: Vec<Subject>) -> Vec<Subject> {
  subjects.iter_mut().for_each(ensure_competencies);
  tracing::debug!("Validated {} subjects", subjects.len());
  subjects
}
