//! The `GradeStore` trait, the persistence collaborator.
//!
//! Implemented by storage backends (e.g. `grades-store-sqlite`). The rules and
//! service layers depend on this abstraction only.
//!
//! Backends are expected to enforce the same invariants as the rules layer at
//! the storage level (unique subject names, unique competency names per
//! subject, marks range, cascading delete). Those constraints are the
//! authoritative guard when two writers race past the application checks;
//! their failures are reported through [`StoreError::violation`].

use std::future::Future;

use crate::{
  competency::{Competency, NewCompetency},
  subject::{NewSubject, Subject},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// The kind of storage constraint a failed write ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
  /// A unique index rejected the row.
  Unique,
  /// A referenced row does not exist.
  ForeignKey,
  /// A `CHECK` constraint rejected a value.
  Check,
}

/// Error type of a [`GradeStore`] backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// If this error is a constraint violation, which kind.
  fn violation(&self) -> Option<Violation> { None }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a grade store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait GradeStore: Send + Sync {
  type Error: StoreError;

  /// Cheap round-trip used by health checks.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// Retrieve a subject by id. When `with_competencies` is set the
  /// competency relation is loaded, ordered by creation time.
  fn find_subject(
    &self,
    id: i64,
    with_competencies: bool,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Retrieve an active subject by exact name. The relation is not loaded.
  fn find_subject_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + 'a;

  /// All subjects with their competencies, both ordered by creation time
  /// ascending.
  fn list_subjects(
    &self,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Persist a new subject. The store assigns `id` and audit fields.
  fn insert_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// Write back `name` and `description` and refresh `updated_at`. The
  /// competency relation is returned untouched.
  fn save_subject(
    &self,
    subject: Subject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// Delete a subject together with all of its competencies.
  fn remove_subject(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Competencies ──────────────────────────────────────────────────────

  /// Retrieve a competency by id with its subject relation loaded.
  fn find_competency(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Competency>, Self::Error>> + Send + '_;

  /// Retrieve the competency named `name` within subject `subject_id`.
  fn find_competency_by_name<'a>(
    &'a self,
    name: &'a str,
    subject_id: i64,
  ) -> impl Future<Output = Result<Option<Competency>, Self::Error>> + Send + 'a;

  /// Competencies of a subject ordered by creation time, each with its
  /// subject relation loaded.
  fn list_competencies(
    &self,
    subject_id: i64,
  ) -> impl Future<Output = Result<Vec<Competency>, Self::Error>> + Send + '_;

  /// Persist a new competency. The subject relation is not loaded on the
  /// returned value.
  fn insert_competency(
    &self,
    input: NewCompetency,
  ) -> impl Future<Output = Result<Competency, Self::Error>> + Send + '_;

  /// Write back `name` and `marks` and refresh `updated_at`.
  fn save_competency(
    &self,
    competency: Competency,
  ) -> impl Future<Output = Result<Competency, Self::Error>> + Send + '_;

  fn remove_competency(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
