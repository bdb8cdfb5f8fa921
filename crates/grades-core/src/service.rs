//! Use-case orchestration: validation, rules and store calls composed per
//! operation.
//!
//! Every operation is a short fail-fast pipeline with at most one write. The
//! first failing step aborts the rest, so a failed call never leaves a
//! partial write behind. Failures are logged once here and propagated
//! unchanged.

use std::{future::Future, sync::Arc};

use crate::{
  Error, Result,
  competency::{
    Competency, CreateCompetency, MAX_MARKS, MIN_MARKS, NewCompetency,
    UpdateCompetency,
  },
  guard,
  patch::Patch,
  rules::{competency as competency_rules, subject as subject_rules},
  store::{GradeStore, StoreError, Violation},
  subject::{CreateSubject, NewSubject, Subject, SubjectSummary, UpdateSubject},
};

/// Run one operation's pipeline, logging a failure before handing the error
/// back.
async fn reported<T>(
  operation: &str,
  pipeline: impl Future<Output = Result<T>>,
) -> Result<T> {
  pipeline
    .await
    .inspect_err(|e| tracing::error!("Failed to {operation}: {e}"))
}

// ─── Subjects ────────────────────────────────────────────────────────────────

/// Subject use cases over a shared store handle.
pub struct SubjectService<S> {
  store: Arc<S>,
}

impl<S> Clone for SubjectService<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: GradeStore> SubjectService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  fn write_error(e: S::Error, name: &str) -> Error {
    match e.violation() {
      Some(Violation::Unique) => Error::SubjectAlreadyExists(name.to_owned()),
      _ => Error::store(e),
    }
  }

  /// Create a subject with a unique name. Returns it re-fetched, with its
  /// (empty) competency relation loaded.
  pub async fn create(&self, dto: CreateSubject) -> Result<Subject> {
    tracing::info!("Creating new subject: {}", dto.name);
    let store = self.store.as_ref();

    reported("create subject", async move {
      let valid = subject_rules::validate_input(&dto)?;
      subject_rules::ensure_unique_name(store, &valid.name, None).await?;

      let saved = store
        .insert_subject(NewSubject {
          name:        valid.name.clone(),
          description: valid.description,
        })
        .await
        .map_err(|e| Self::write_error(e, &valid.name))?;
      tracing::info!("Successfully created subject with ID: {}", saved.id);

      subject_rules::find_by_id_or_throw(store, saved.id).await
    })
    .await
  }

  /// All subjects with their competencies, oldest first.
  pub async fn get_all(&self) -> Result<Vec<Subject>> {
    tracing::info!("Fetching all subjects");
    let store = self.store.as_ref();

    reported("fetch all subjects", async move {
      let subjects = store.list_subjects().await.map_err(Error::store)?;
      let subjects = subject_rules::validate_array(subjects);
      tracing::info!("Retrieved {} subjects", subjects.len());
      Ok(subjects)
    })
    .await
  }

  pub async fn get_by_id(&self, id: i64) -> Result<Subject> {
    tracing::info!("Fetching subject with ID: {id}");
    let store = self.store.as_ref();

    reported("fetch subject by ID", async move {
      let subject = subject_rules::find_by_id_or_throw(store, id).await?;
      tracing::info!("Successfully retrieved subject: {}", subject.name);
      Ok(subject)
    })
    .await
  }

  /// Apply a partial update. Renaming a subject to its current name passes
  /// the uniqueness check.
  pub async fn update(&self, id: i64, update: UpdateSubject) -> Result<Subject> {
    tracing::info!("Updating subject with ID: {id}");
    let store = self.store.as_ref();

    reported("update subject", async move {
      let mut subject = subject_rules::find_by_id_or_throw(store, id).await?;

      if let Patch::Value(name) = &update.name {
        let name = subject_rules::validate_name(Some(name))?;
        subject_rules::ensure_unique_name(store, &name, Some(subject.id))
          .await?;
      }

      subject_rules::update_fields(&mut subject, update)?;

      let name = subject.name.clone();
      let updated = store
        .save_subject(subject)
        .await
        .map_err(|e| Self::write_error(e, &name))?;
      tracing::info!("Successfully updated subject: {}", updated.name);
      Ok(updated)
    })
    .await
  }

  /// Delete a subject and, through the store, all of its competencies.
  /// Returns the subject as it was before removal.
  pub async fn delete(&self, id: i64) -> Result<Subject> {
    tracing::info!("Deleting subject with ID: {id}");
    let store = self.store.as_ref();

    reported("delete subject", async move {
      let subject = subject_rules::find_by_id_or_throw(store, id).await?;
      store.remove_subject(subject.id).await.map_err(Error::store)?;
      tracing::info!(
        "Successfully deleted subject: {} and its competencies",
        subject.name
      );
      Ok(subject)
    })
    .await
  }
}

// ─── Competencies ────────────────────────────────────────────────────────────

/// Competency use cases over a shared store handle.
pub struct CompetencyService<S> {
  store: Arc<S>,
}

impl<S> Clone for CompetencyService<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

/// The loaded parent of `competency`.
fn parent_of(competency: &Competency) -> Result<&SubjectSummary> {
  competency.subject.as_ref().ok_or_else(|| {
    Error::Internal("Competency subject relation is missing".to_owned())
  })
}

impl<S: GradeStore> CompetencyService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  fn write_error(e: S::Error, name: &str, subject: &SubjectSummary) -> Error {
    match e.violation() {
      Some(Violation::Unique) => Error::CompetencyAlreadyExists {
        name:    name.to_owned(),
        subject: subject.name.clone(),
      },
      Some(Violation::ForeignKey) => Error::SubjectNotFound(subject.id),
      Some(Violation::Check) => Error::invalid(format!(
        "Marks must be between {MIN_MARKS} and {MAX_MARKS}"
      )),
      None => Error::store(e),
    }
  }

  /// Create a competency under an existing subject.
  pub async fn create(
    &self,
    subject_id: i64,
    dto: CreateCompetency,
  ) -> Result<Competency> {
    tracing::info!(
      "Creating new competency: {} for subject ID: {subject_id}",
      dto.name
    );
    let store = self.store.as_ref();

    reported("create competency", async move {
      let valid = competency_rules::validate_input(
        Patch::Value(dto.name.as_str()),
        Patch::Value(&dto.marks),
      )?;
      let name = guard::require_non_null(valid.name, "Competency name")?;
      let marks = guard::require_non_null(valid.marks, "Marks")?;

      let subject = SubjectSummary::from(
        competency_rules::find_subject_by_id_or_throw(store, subject_id).await?,
      );
      competency_rules::ensure_unique_name(store, &name, &subject, None)
        .await?;

      let mut competency = store
        .insert_competency(NewCompetency {
          name: name.clone(),
          marks,
          subject_id: subject.id,
        })
        .await
        .map_err(|e| Self::write_error(e, &name, &subject))?;
      competency.subject = Some(subject);

      tracing::info!(
        "Successfully created competency with ID: {}",
        competency.id
      );
      Ok(competency)
    })
    .await
  }

  /// Competencies of one subject, oldest first, each with its subject.
  pub async fn list_by_subject(&self, subject_id: i64) -> Result<Vec<Competency>> {
    tracing::info!("Fetching competencies for subject ID: {subject_id}");
    let store = self.store.as_ref();

    reported("fetch competencies by subject", async move {
      let subject = SubjectSummary::from(
        competency_rules::find_subject_by_id_or_throw(store, subject_id).await?,
      );
      let competencies = store
        .list_competencies(subject.id)
        .await
        .map_err(Error::store)?;
      let competencies = competency_rules::validate_array(competencies, &subject);

      tracing::info!(
        "Retrieved {} competencies for subject: {}",
        competencies.len(),
        subject.name
      );
      Ok(competencies)
    })
    .await
  }

  pub async fn get_by_id(&self, id: i64) -> Result<Competency> {
    tracing::info!("Fetching competency with ID: {id}");
    let store = self.store.as_ref();

    reported("fetch competency by ID", async move {
      let competency =
        competency_rules::find_competency_by_id_or_throw(store, id).await?;
      tracing::info!("Successfully retrieved competency: {}", competency.name);
      Ok(competency)
    })
    .await
  }

  /// Apply a partial update. Uniqueness is only re-checked when the name
  /// actually changes.
  pub async fn update(
    &self,
    id: i64,
    update: UpdateCompetency,
  ) -> Result<Competency> {
    tracing::info!("Updating competency with ID: {id}");
    let store = self.store.as_ref();

    reported("update competency", async move {
      let mut competency =
        competency_rules::find_competency_by_id_or_throw(store, id).await?;

      let valid = competency_rules::validate_input(
        update.name.as_ref().map(String::as_str),
        update.marks.as_ref(),
      )?;

      if let Some(name) = &valid.name
        && *name != competency.name
      {
        let subject = parent_of(&competency)?;
        competency_rules::ensure_unique_name(store, name, subject, Some(id))
          .await?;
      }

      competency_rules::update_fields(&mut competency, valid);

      let name = competency.name.clone();
      let subject = parent_of(&competency)?.clone();
      let updated = store
        .save_competency(competency)
        .await
        .map_err(|e| Self::write_error(e, &name, &subject))?;

      tracing::info!("Successfully updated competency: {}", updated.name);
      Ok(updated)
    })
    .await
  }

  /// Delete a competency. Returns it as it was before removal.
  pub async fn delete(&self, id: i64) -> Result<Competency> {
    tracing::info!("Deleting competency with ID: {id}");
    let store = self.store.as_ref();

    reported("delete competency", async move {
      let competency =
        competency_rules::find_competency_by_id_or_throw(store, id).await?;
      store
        .remove_competency(competency.id)
        .await
        .map_err(Error::store)?;
      tracing::info!("Successfully deleted competency: {}", competency.name);
      Ok(competency)
    })
    .await
  }
}
