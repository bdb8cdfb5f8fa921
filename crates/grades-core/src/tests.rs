//! Service and rule tests against an in-memory `GradeStore`.
//!
//! The in-memory store mirrors the SQLite backend's constraints (unique
//! names, foreign keys, marks range, cascade) and can be told to fail name
//! lookups or to drop the competency → subject relation.

use std::sync::{
  Arc, Mutex,
  atomic::{AtomicBool, Ordering},
};

use chrono::Utc;
use serde_json::{Value, json};

use crate::{
  CompetencyService, Error, ErrorKind, Patch, SubjectService,
  audit::Audit,
  competency::{Competency, CreateCompetency, NewCompetency, UpdateCompetency},
  rules,
  store::{GradeStore, StoreError, Violation},
  subject::{CreateSubject, NewSubject, Subject, SubjectSummary, UpdateSubject},
};

// ─── In-memory store ─────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum MemoryError {
  #[error("store unavailable")]
  Unavailable,
  #[error("constraint violated: {0:?}")]
  Constraint(Violation),
}

impl StoreError for MemoryError {
  fn violation(&self) -> Option<Violation> {
    match self {
      Self::Unavailable => None,
      Self::Constraint(v) => Some(*v),
    }
  }
}

#[derive(Default)]
struct Tables {
  next_id:      i64,
  subjects:     Vec<Subject>,
  competencies: Vec<Competency>,
}

impl Tables {
  fn next_id(&mut self) -> i64 {
    self.next_id += 1;
    self.next_id
  }

  fn summary(&self, subject_id: i64) -> Option<SubjectSummary> {
    self
      .subjects
      .iter()
      .find(|s| s.id == subject_id)
      .map(Subject::summary)
  }
}

#[derive(Default)]
struct MemoryStore {
  tables:            Mutex<Tables>,
  fail_name_lookups: AtomicBool,
  drop_relations:    AtomicBool,
}

impl MemoryStore {
  fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
    self.tables.lock().expect("tables lock")
  }

  fn with_relation(&self, t: &Tables, mut c: Competency) -> Competency {
    c.subject = if self.drop_relations.load(Ordering::SeqCst) {
      None
    } else {
      t.summary(c.subject_id)
    };
    c
  }

  fn competency_count(&self) -> usize { self.tables().competencies.len() }
}

impl GradeStore for MemoryStore {
  type Error = MemoryError;

  async fn ping(&self) -> Result<(), MemoryError> { Ok(()) }

  async fn find_subject(
    &self,
    id: i64,
    with_competencies: bool,
  ) -> Result<Option<Subject>, MemoryError> {
    let t = self.tables();
    Ok(t.subjects.iter().find(|s| s.id == id).cloned().map(|mut s| {
      if with_competencies {
        s.competencies = Some(
          t.competencies
            .iter()
            .filter(|c| c.subject_id == id)
            .cloned()
            .collect(),
        );
      }
      s
    }))
  }

  async fn find_subject_by_name(
    &self,
    name: &str,
  ) -> Result<Option<Subject>, MemoryError> {
    if self.fail_name_lookups.load(Ordering::SeqCst) {
      return Err(MemoryError::Unavailable);
    }
    let t = self.tables();
    Ok(
      t.subjects
        .iter()
        .find(|s| s.audit.is_active && s.name == name)
        .cloned(),
    )
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>, MemoryError> {
    let t = self.tables();
    Ok(
      t.subjects
        .iter()
        .cloned()
        .map(|mut s| {
          s.competencies = Some(
            t.competencies
              .iter()
              .filter(|c| c.subject_id == s.id)
              .cloned()
              .collect(),
          );
          s
        })
        .collect(),
    )
  }

  async fn insert_subject(
    &self,
    input: NewSubject,
  ) -> Result<Subject, MemoryError> {
    let mut t = self.tables();
    if t.subjects.iter().any(|s| s.name == input.name) {
      return Err(MemoryError::Constraint(Violation::Unique));
    }
    let subject = Subject {
      id:           t.next_id(),
      name:         input.name,
      description:  input.description,
      audit:        Audit::created(Utc::now()),
      competencies: None,
    };
    t.subjects.push(subject.clone());
    Ok(subject)
  }

  async fn save_subject(&self, mut subject: Subject) -> Result<Subject, MemoryError> {
    let mut t = self.tables();
    if t
      .subjects
      .iter()
      .any(|s| s.id != subject.id && s.name == subject.name)
    {
      return Err(MemoryError::Constraint(Violation::Unique));
    }
    subject.audit.updated_at = Utc::now();
    if let Some(row) = t.subjects.iter_mut().find(|s| s.id == subject.id) {
      row.name = subject.name.clone();
      row.description = subject.description.clone();
      row.audit = subject.audit.clone();
    }
    Ok(subject)
  }

  async fn remove_subject(&self, id: i64) -> Result<(), MemoryError> {
    let mut t = self.tables();
    t.subjects.retain(|s| s.id != id);
    t.competencies.retain(|c| c.subject_id != id);
    Ok(())
  }

  async fn find_competency(
    &self,
    id: i64,
  ) -> Result<Option<Competency>, MemoryError> {
    let t = self.tables();
    let found = t.competencies.iter().find(|c| c.id == id).cloned();
    Ok(found.map(|c| self.with_relation(&t, c)))
  }

  async fn find_competency_by_name(
    &self,
    name: &str,
    subject_id: i64,
  ) -> Result<Option<Competency>, MemoryError> {
    if self.fail_name_lookups.load(Ordering::SeqCst) {
      return Err(MemoryError::Unavailable);
    }
    let t = self.tables();
    let found = t
      .competencies
      .iter()
      .find(|c| c.subject_id == subject_id && c.name == name)
      .cloned();
    Ok(found.map(|c| self.with_relation(&t, c)))
  }

  async fn list_competencies(
    &self,
    subject_id: i64,
  ) -> Result<Vec<Competency>, MemoryError> {
    let t = self.tables();
    let rows: Vec<Competency> = t
      .competencies
      .iter()
      .filter(|c| c.subject_id == subject_id)
      .cloned()
      .collect();
    Ok(rows.into_iter().map(|c| self.with_relation(&t, c)).collect())
  }

  async fn insert_competency(
    &self,
    input: NewCompetency,
  ) -> Result<Competency, MemoryError> {
    let mut t = self.tables();
    if !t.subjects.iter().any(|s| s.id == input.subject_id) {
      return Err(MemoryError::Constraint(Violation::ForeignKey));
    }
    if t
      .competencies
      .iter()
      .any(|c| c.subject_id == input.subject_id && c.name == input.name)
    {
      return Err(MemoryError::Constraint(Violation::Unique));
    }
    if input.marks > 10 {
      return Err(MemoryError::Constraint(Violation::Check));
    }
    let competency = Competency {
      id:         t.next_id(),
      name:       input.name,
      marks:      input.marks,
      subject_id: input.subject_id,
      subject:    None,
      audit:      Audit::created(Utc::now()),
    };
    t.competencies.push(competency.clone());
    Ok(competency)
  }

  async fn save_competency(
    &self,
    mut competency: Competency,
  ) -> Result<Competency, MemoryError> {
    let mut t = self.tables();
    if t.competencies.iter().any(|c| {
      c.id != competency.id
        && c.subject_id == competency.subject_id
        && c.name == competency.name
    }) {
      return Err(MemoryError::Constraint(Violation::Unique));
    }
    competency.audit.updated_at = Utc::now();
    if let Some(row) = t.competencies.iter_mut().find(|c| c.id == competency.id)
    {
      row.name = competency.name.clone();
      row.marks = competency.marks;
      row.audit = competency.audit.clone();
    }
    Ok(competency)
  }

  async fn remove_competency(&self, id: i64) -> Result<(), MemoryError> {
    self.tables().competencies.retain(|c| c.id != id);
    Ok(())
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn services() -> (
  Arc<MemoryStore>,
  SubjectService<MemoryStore>,
  CompetencyService<MemoryStore>,
) {
  let store = Arc::new(MemoryStore::default());
  (
    Arc::clone(&store),
    SubjectService::new(Arc::clone(&store)),
    CompetencyService::new(store),
  )
}

fn new_subject(name: &str) -> CreateSubject {
  CreateSubject { name: name.into(), description: None }
}

fn new_competency(name: &str, marks: Value) -> CreateCompetency {
  CreateCompetency { name: name.into(), marks }
}

fn assert_kind<T: std::fmt::Debug>(result: crate::Result<T>, kind: ErrorKind) {
  match result {
    Ok(v) => panic!("expected {kind:?}, got Ok({v:?})"),
    Err(e) => assert_eq!(e.kind(), kind, "unexpected error: {e}"),
  }
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_subject_trims_name() {
  let (_, subjects, _) = services();
  let s = subjects.create(new_subject("  Math  ")).await.unwrap();
  assert_eq!(s.name, "Math");
  assert!(s.id > 0);
  assert!(s.audit.is_active);
}

#[tokio::test]
async fn created_subject_has_empty_competencies() {
  let (_, subjects, _) = services();
  let s = subjects.create(new_subject("Math")).await.unwrap();
  assert_eq!(s.competencies.as_deref().map(<[_]>::len), Some(0));

  let fetched = subjects.get_by_id(s.id).await.unwrap();
  assert!(fetched.competencies.is_some_and(|c| c.is_empty()));
}

#[tokio::test]
async fn create_subject_with_taken_name_conflicts() {
  let (_, subjects, _) = services();
  subjects.create(new_subject("Math")).await.unwrap();

  let err = subjects.create(new_subject(" Math ")).await.unwrap_err();
  assert!(matches!(err, Error::SubjectAlreadyExists(ref n) if n == "Math"));
  assert_eq!(err.to_string(), "Subject with name 'Math' already exists");
}

#[tokio::test]
async fn create_subject_rejects_blank_and_overlong_names() {
  let (store, subjects, _) = services();
  assert_kind(subjects.create(new_subject("   ")).await, ErrorKind::InvalidInput);
  assert_kind(
    subjects.create(new_subject(&"x".repeat(101))).await,
    ErrorKind::InvalidInput,
  );
  assert!(store.tables().subjects.is_empty());
}

#[tokio::test]
async fn names_shorter_than_two_characters_after_trimming_are_rejected() {
  let (store, subjects, competencies) = services();

  let err = subjects.create(new_subject("  x  ")).await.unwrap_err();
  assert_eq!(
    err.to_string(),
    "Subject name must be between 2 and 100 characters"
  );
  assert!(store.tables().subjects.is_empty());

  let math = subjects.create(new_subject(" xy ")).await.unwrap();
  assert_eq!(math.name, "xy");

  let rename = UpdateSubject { name: Patch::Value(" x ".into()), ..Default::default() };
  assert_kind(subjects.update(math.id, rename).await, ErrorKind::InvalidInput);
  assert_eq!(subjects.get_by_id(math.id).await.unwrap().name, "xy");

  let err = competencies
    .create(math.id, new_competency(" y ", json!(5)))
    .await
    .unwrap_err();
  assert_eq!(
    err.to_string(),
    "Competency name must be between 2 and 100 characters"
  );
  assert_eq!(store.competency_count(), 0);

  let algebra = competencies
    .create(math.id, new_competency("Algebra", json!(5)))
    .await
    .unwrap();
  let rename = UpdateCompetency { name: Patch::Value(" y ".into()), ..Default::default() };
  assert_kind(competencies.update(algebra.id, rename).await, ErrorKind::InvalidInput);
}

#[tokio::test]
async fn create_subject_keeps_description_verbatim() {
  let (_, subjects, _) = services();
  let s = subjects
    .create(CreateSubject {
      name:        "History".into(),
      description: Some("  ancient & modern ".into()),
    })
    .await
    .unwrap();
  assert_eq!(s.description.as_deref(), Some("  ancient & modern "));
}

#[tokio::test]
async fn get_subject_by_missing_or_invalid_id() {
  let (_, subjects, _) = services();
  let err = subjects.get_by_id(42).await.unwrap_err();
  assert_eq!(err.to_string(), "Subject with ID 42 not found");
  assert_kind(subjects.get_by_id(0).await, ErrorKind::InvalidInput);
  assert_kind(subjects.get_by_id(-3).await, ErrorKind::InvalidInput);
}

#[tokio::test]
async fn get_all_lists_in_creation_order_with_relations() {
  let (_, subjects, competencies) = services();
  let math = subjects.create(new_subject("Math")).await.unwrap();
  subjects.create(new_subject("Art")).await.unwrap();
  competencies
    .create(math.id, new_competency("Algebra", json!(8)))
    .await
    .unwrap();

  let all = subjects.get_all().await.unwrap();
  let names: Vec<_> = all.iter().map(|s| s.name.as_str()).collect();
  assert_eq!(names, ["Math", "Art"]);
  assert_eq!(all[0].competencies.as_ref().unwrap().len(), 1);
  assert_eq!(all[1].competencies.as_ref().unwrap().len(), 0);
}

#[tokio::test]
async fn rename_subject_to_its_own_name_succeeds() {
  let (_, subjects, _) = services();
  let s = subjects.create(new_subject("Math")).await.unwrap();

  let update = UpdateSubject { name: Patch::Value("Math".into()), ..Default::default() };
  let updated = subjects.update(s.id, update).await.unwrap();
  assert_eq!(updated.name, "Math");
}

#[tokio::test]
async fn rename_subject_to_taken_name_conflicts() {
  let (_, subjects, _) = services();
  subjects.create(new_subject("Math")).await.unwrap();
  let art = subjects.create(new_subject("Art")).await.unwrap();

  let update = UpdateSubject { name: Patch::Value("Math".into()), ..Default::default() };
  assert_kind(subjects.update(art.id, update).await, ErrorKind::AlreadyExists);
  assert_eq!(subjects.get_by_id(art.id).await.unwrap().name, "Art");
}

#[tokio::test]
async fn update_subject_partial_semantics() {
  let (_, subjects, _) = services();
  let s = subjects
    .create(CreateSubject {
      name:        "Math".into(),
      description: Some("numbers".into()),
    })
    .await
    .unwrap();

  // Absent fields stay untouched.
  let updated = subjects.update(s.id, UpdateSubject::default()).await.unwrap();
  assert_eq!(updated.name, "Math");
  assert_eq!(updated.description.as_deref(), Some("numbers"));

  // Name is trimmed; description replaced.
  let update = UpdateSubject {
    name:        Patch::Value("  Maths ".into()),
    description: Patch::Value("shapes".into()),
  };
  let updated = subjects.update(s.id, update).await.unwrap();
  assert_eq!(updated.name, "Maths");
  assert_eq!(updated.description.as_deref(), Some("shapes"));

  // An explicit null clears the description.
  let update = UpdateSubject { description: Patch::Null, ..Default::default() };
  let updated = subjects.update(s.id, update).await.unwrap();
  assert_eq!(updated.description, None);

  // A name cannot be cleared.
  let update = UpdateSubject { name: Patch::Null, ..Default::default() };
  assert_kind(subjects.update(s.id, update).await, ErrorKind::InvalidInput);

  // An empty description is stored as given, unlike null.
  let update = UpdateSubject {
    description: Patch::Value(String::new()),
    ..Default::default()
  };
  let updated = subjects.update(s.id, update).await.unwrap();
  assert_eq!(updated.description.as_deref(), Some(""));
}

#[tokio::test]
async fn update_missing_subject_is_not_found() {
  let (_, subjects, _) = services();
  assert_kind(
    subjects.update(9, UpdateSubject::default()).await,
    ErrorKind::NotFound,
  );
}

#[tokio::test]
async fn delete_subject_cascades_to_competencies() {
  let (store, subjects, competencies) = services();
  let math = subjects.create(new_subject("Math")).await.unwrap();
  let art = subjects.create(new_subject("Art")).await.unwrap();
  competencies.create(math.id, new_competency("Algebra", json!(8))).await.unwrap();
  competencies.create(math.id, new_competency("Geometry", json!(6))).await.unwrap();
  competencies.create(art.id, new_competency("Drawing", json!(9))).await.unwrap();

  let removed = subjects.delete(math.id).await.unwrap();
  assert_eq!(removed.name, "Math");
  assert_eq!(store.competency_count(), 1);
  assert_kind(subjects.get_by_id(math.id).await, ErrorKind::NotFound);
  assert_kind(subjects.delete(math.id).await, ErrorKind::NotFound);
}

#[tokio::test]
async fn failed_name_lookup_falls_back_to_store_constraint() {
  let (store, subjects, _) = services();
  subjects.create(new_subject("Math")).await.unwrap();

  // The lookup error is swallowed, so the application check passes and the
  // store's unique constraint decides.
  store.fail_name_lookups.store(true, Ordering::SeqCst);
  assert!(rules::subject::find_by_name(store.as_ref(), "Math").await.is_none());

  let err = subjects.create(new_subject("Math")).await.unwrap_err();
  assert!(matches!(err, Error::SubjectAlreadyExists(_)));
}

// ─── Competencies ────────────────────────────────────────────────────────────

#[tokio::test]
async fn marks_boundaries() {
  let (_, subjects, competencies) = services();
  let s = subjects.create(new_subject("Math")).await.unwrap();

  let low = competencies.create(s.id, new_competency("Low", json!(0))).await;
  assert_eq!(low.unwrap().marks, 0);
  let high = competencies.create(s.id, new_competency("High", json!(10))).await;
  assert_eq!(high.unwrap().marks, 10);

  for marks in [json!(-1), json!(11), json!(7.5)] {
    assert_kind(
      competencies.create(s.id, new_competency("Bad", marks)).await,
      ErrorKind::InvalidInput,
    );
  }
}

#[tokio::test]
async fn marks_accept_numeric_strings() {
  let (_, subjects, competencies) = services();
  let s = subjects.create(new_subject("Math")).await.unwrap();
  let c = competencies
    .create(s.id, new_competency("Algebra", json!("7")))
    .await
    .unwrap();
  assert_eq!(c.marks, 7);
}

#[tokio::test]
async fn update_marks_out_of_range_is_rejected() {
  let (_, subjects, competencies) = services();
  let s = subjects.create(new_subject("Math")).await.unwrap();
  let c = competencies.create(s.id, new_competency("Algebra", json!(8))).await.unwrap();

  for marks in [json!(11), json!(-1)] {
    let update = UpdateCompetency { marks: Patch::Value(marks), ..Default::default() };
    assert_kind(competencies.update(c.id, update).await, ErrorKind::InvalidInput);
  }
  assert_eq!(competencies.get_by_id(c.id).await.unwrap().marks, 8);

  let update = UpdateCompetency { marks: Patch::Value(json!(10)), ..Default::default() };
  assert_eq!(competencies.update(c.id, update).await.unwrap().marks, 10);
}

#[tokio::test]
async fn duplicate_competency_in_same_subject_conflicts() {
  let (store, subjects, competencies) = services();
  let math = subjects.create(new_subject("Math")).await.unwrap();

  let first = competencies
    .create(math.id, new_competency("Algebra", json!(8)))
    .await
    .unwrap();
  let err = competencies
    .create(math.id, new_competency("Algebra", json!(5)))
    .await
    .unwrap_err();
  assert_eq!(
    err.to_string(),
    "Competency with name 'Algebra' already exists in subject 'Math'"
  );

  let unchanged = competencies.get_by_id(first.id).await.unwrap();
  assert_eq!(unchanged.marks, 8);
  assert_eq!(store.competency_count(), 1);
}

#[tokio::test]
async fn same_competency_name_in_other_subject_is_allowed() {
  let (_, subjects, competencies) = services();
  let math = subjects.create(new_subject("Math")).await.unwrap();
  let physics = subjects.create(new_subject("Physics")).await.unwrap();

  competencies.create(math.id, new_competency("Vectors", json!(6))).await.unwrap();
  let c = competencies
    .create(physics.id, new_competency("Vectors", json!(7)))
    .await
    .unwrap();
  assert_eq!(c.subject.map(|s| s.name), Some("Physics".to_owned()));
}

#[tokio::test]
async fn create_competency_under_missing_subject_writes_nothing() {
  let (store, _, competencies) = services();
  let err = competencies
    .create(999_999, new_competency("Algebra", json!(8)))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::SubjectNotFound(999_999)));
  assert_eq!(store.competency_count(), 0);
}

#[tokio::test]
async fn invalid_input_is_reported_before_subject_lookup() {
  let (_, _, competencies) = services();
  // Subject 999 does not exist, but the marks check runs first.
  assert_kind(
    competencies.create(999, new_competency("Algebra", json!(12))).await,
    ErrorKind::InvalidInput,
  );
}

#[tokio::test]
async fn rename_competency() {
  let (_, subjects, competencies) = services();
  let s = subjects.create(new_subject("Math")).await.unwrap();
  let algebra = competencies.create(s.id, new_competency("Algebra", json!(8))).await.unwrap();
  competencies.create(s.id, new_competency("Geometry", json!(6))).await.unwrap();

  // Same name: no uniqueness failure.
  let update = UpdateCompetency { name: Patch::Value("Algebra".into()), ..Default::default() };
  assert!(competencies.update(algebra.id, update).await.is_ok());

  // A sibling's name: conflict.
  let update = UpdateCompetency { name: Patch::Value("Geometry".into()), ..Default::default() };
  assert_kind(competencies.update(algebra.id, update).await, ErrorKind::AlreadyExists);

  // A fresh name, trimmed.
  let update = UpdateCompetency { name: Patch::Value(" Calculus ".into()), ..Default::default() };
  let renamed = competencies.update(algebra.id, update).await.unwrap();
  assert_eq!(renamed.name, "Calculus");
  assert_eq!(renamed.marks, 8);
}

#[tokio::test]
async fn competency_null_fields_are_rejected() {
  let (_, subjects, competencies) = services();
  let s = subjects.create(new_subject("Math")).await.unwrap();
  let c = competencies.create(s.id, new_competency("Algebra", json!(8))).await.unwrap();

  let update = UpdateCompetency { marks: Patch::Null, ..Default::default() };
  assert_kind(competencies.update(c.id, update).await, ErrorKind::InvalidInput);
  let update = UpdateCompetency { name: Patch::Null, ..Default::default() };
  assert_kind(competencies.update(c.id, update).await, ErrorKind::InvalidInput);
}

#[tokio::test]
async fn competency_without_subject_relation_is_internal_error() {
  let (store, subjects, competencies) = services();
  let s = subjects.create(new_subject("Math")).await.unwrap();
  let c = competencies.create(s.id, new_competency("Algebra", json!(8))).await.unwrap();

  store.drop_relations.store(true, Ordering::SeqCst);
  let err = competencies.get_by_id(c.id).await.unwrap_err();
  assert!(matches!(err, Error::Internal(_)));
}

#[tokio::test]
async fn list_by_subject_backfills_missing_relation() {
  let (store, subjects, competencies) = services();
  let s = subjects.create(new_subject("Math")).await.unwrap();
  competencies.create(s.id, new_competency("Algebra", json!(8))).await.unwrap();
  competencies.create(s.id, new_competency("Geometry", json!(6))).await.unwrap();

  store.drop_relations.store(true, Ordering::SeqCst);
  let listed = competencies.list_by_subject(s.id).await.unwrap();
  assert_eq!(listed.len(), 2);
  assert!(listed.iter().all(|c| c.subject.as_ref().is_some_and(|p| p.id == s.id)));
  assert_eq!(listed[0].name, "Algebra");
}

#[tokio::test]
async fn list_by_missing_subject_is_not_found() {
  let (_, _, competencies) = services();
  assert_kind(competencies.list_by_subject(5).await, ErrorKind::NotFound);
}

#[tokio::test]
async fn delete_competency() {
  let (store, subjects, competencies) = services();
  let s = subjects.create(new_subject("Math")).await.unwrap();
  let c = competencies.create(s.id, new_competency("Algebra", json!(8))).await.unwrap();

  let removed = competencies.delete(c.id).await.unwrap();
  assert_eq!(removed.id, c.id);
  assert_eq!(store.competency_count(), 0);
  assert_kind(competencies.delete(c.id).await, ErrorKind::NotFound);
  assert!(subjects.get_by_id(s.id).await.is_ok());
}
