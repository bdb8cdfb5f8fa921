//! [`SqliteStore`], the SQLite implementation of [`GradeStore`].

use std::{collections::HashMap, path::Path};

use rusqlite::OptionalExtension as _;

use grades_core::{
  audit::Audit,
  competency::{Competency, NewCompetency},
  store::GradeStore,
  subject::{NewSubject, Subject},
};

use crate::{
  Error, Result,
  encode::{
    COMPETENCY_COLUMNS, RawCompetency, RawSubject, SUBJECT_COLUMNS, encode_dt,
    now,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A grade store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("SQLite schema initialised");
    Ok(())
  }

  /// Run a raw SQL statement. Test-only escape hatch for simulating a store
  /// that violates its own invariants.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Query helpers (run on the connection thread) ────────────────────────────

fn select_subject(
  conn: &rusqlite::Connection,
  id: i64,
) -> rusqlite::Result<Option<RawSubject>> {
  conn
    .query_row(
      &format!("SELECT {SUBJECT_COLUMNS} FROM subjects s WHERE s.id = ?1"),
      rusqlite::params![id],
      |row| RawSubject::from_row(row, 0),
    )
    .optional()
}

/// Competencies matching `filter` (a `WHERE` clause over alias `c`), each
/// joined with its subject, oldest first.
fn select_competencies(
  conn: &rusqlite::Connection,
  filter: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<RawCompetency>> {
  let sql = format!(
    "SELECT {COMPETENCY_COLUMNS}, {SUBJECT_COLUMNS}
     FROM competencies c
     LEFT JOIN subjects s ON s.id = c.subject_id
     WHERE {filter}
     ORDER BY c.created_at ASC, c.id ASC"
  );
  let mut stmt = conn.prepare(&sql)?;
  stmt
    .query_map(params, RawCompetency::from_joined_row)?
    .collect()
}

fn into_competencies(raws: Vec<RawCompetency>) -> Result<Vec<Competency>> {
  raws.into_iter().map(RawCompetency::into_competency).collect()
}

// ─── GradeStore impl ─────────────────────────────────────────────────────────

impl GradeStore for SqliteStore {
  type Error = Error;

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn find_subject(
    &self,
    id: i64,
    with_competencies: bool,
  ) -> Result<Option<Subject>> {
    let found: Option<(RawSubject, Option<Vec<RawCompetency>>)> = self
      .conn
      .call(move |conn| {
        let Some(subject) = select_subject(conn, id)? else {
          return Ok(None);
        };
        let competencies = if with_competencies {
          Some(select_competencies(
            conn,
            "c.subject_id = ?1",
            rusqlite::params![id],
          )?)
        } else {
          None
        };
        Ok(Some((subject, competencies)))
      })
      .await?;

    let Some((subject, competencies)) = found else {
      return Ok(None);
    };
    // Nested competencies do not repeat their parent.
    let competencies = competencies
      .map(|raws| {
        into_competencies(raws).map(|cs| {
          cs.into_iter()
            .map(|c| Competency { subject: None, ..c })
            .collect()
        })
      })
      .transpose()?;
    subject.into_subject(competencies).map(Some)
  }

  async fn find_subject_by_name(&self, name: &str) -> Result<Option<Subject>> {
    let name = name.to_owned();

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {SUBJECT_COLUMNS} FROM subjects s
                 WHERE s.name = ?1 AND s.is_active = 1"
              ),
              rusqlite::params![name],
              |row| RawSubject::from_row(row, 0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(|r| r.into_subject(None)).transpose()
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    let (subjects, competencies): (Vec<RawSubject>, Vec<RawCompetency>) = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBJECT_COLUMNS} FROM subjects s
           ORDER BY s.created_at ASC, s.id ASC"
        ))?;
        let subjects = stmt
          .query_map([], |row| RawSubject::from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {COMPETENCY_COLUMNS} FROM competencies c
           ORDER BY c.created_at ASC, c.id ASC"
        ))?;
        let competencies = stmt
          .query_map([], RawCompetency::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((subjects, competencies))
      })
      .await?;

    let mut by_subject: HashMap<i64, Vec<Competency>> = HashMap::new();
    for raw in competencies {
      let competency = raw.into_competency()?;
      by_subject
        .entry(competency.subject_id)
        .or_default()
        .push(competency);
    }

    subjects
      .into_iter()
      .map(|raw| {
        let competencies = by_subject.remove(&raw.id).unwrap_or_default();
        raw.into_subject(Some(competencies))
      })
      .collect()
  }

  async fn insert_subject(&self, input: NewSubject) -> Result<Subject> {
    let at = now();
    let at_str = encode_dt(at);
    let name = input.name.clone();
    let description = input.description.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (name, description, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?3)",
          rusqlite::params![name, description, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    // Matches a read-back; see `now()`.
    Ok(Subject {
      id,
      name: input.name,
      description: input.description,
      audit: Audit::created(at),
      competencies: None,
    })
  }

  async fn save_subject(&self, mut subject: Subject) -> Result<Subject> {
    subject.audit.updated_at = now();

    let id = subject.id;
    let name = subject.name.clone();
    let description = subject.description.clone();
    let updated_by = subject.audit.updated_by;
    let at_str = encode_dt(subject.audit.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE subjects
           SET name = ?1, description = ?2, updated_by = ?3, updated_at = ?4
           WHERE id = ?5",
          rusqlite::params![name, description, updated_by, at_str, id],
        )?;
        Ok(())
      })
      .await?;

    Ok(subject)
  }

  async fn remove_subject(&self, id: i64) -> Result<()> {
    // Competencies go with it through ON DELETE CASCADE.
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM subjects WHERE id = ?1", rusqlite::params![id])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Competencies ──────────────────────────────────────────────────────────

  async fn find_competency(&self, id: i64) -> Result<Option<Competency>> {
    let raws: Vec<RawCompetency> = self
      .conn
      .call(move |conn| {
        Ok(select_competencies(conn, "c.id = ?1", rusqlite::params![id])?)
      })
      .await?;

    raws.into_iter().next().map(RawCompetency::into_competency).transpose()
  }

  async fn find_competency_by_name(
    &self,
    name: &str,
    subject_id: i64,
  ) -> Result<Option<Competency>> {
    let name = name.to_owned();

    let raws: Vec<RawCompetency> = self
      .conn
      .call(move |conn| {
        Ok(select_competencies(
          conn,
          "c.name = ?1 AND c.subject_id = ?2",
          rusqlite::params![name, subject_id],
        )?)
      })
      .await?;

    raws.into_iter().next().map(RawCompetency::into_competency).transpose()
  }

  async fn list_competencies(&self, subject_id: i64) -> Result<Vec<Competency>> {
    let raws: Vec<RawCompetency> = self
      .conn
      .call(move |conn| {
        Ok(select_competencies(
          conn,
          "c.subject_id = ?1",
          rusqlite::params![subject_id],
        )?)
      })
      .await?;

    into_competencies(raws)
  }

  async fn insert_competency(&self, input: NewCompetency) -> Result<Competency> {
    let at = now();
    let at_str = encode_dt(at);
    let name = input.name.clone();
    let marks = input.marks;
    let subject_id = input.subject_id;

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO competencies (name, marks, subject_id, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)",
          rusqlite::params![name, marks, subject_id, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    // `now()` is already truncated to the stored precision, so this audit
    // matches what a later read returns.
    Ok(Competency {
      id,
      name: input.name,
      marks,
      subject_id,
      subject: None,
      audit: Audit::created(at),
    })
  }

  async fn save_competency(&self, mut competency: Competency) -> Result<Competency> {
    competency.audit.updated_at = now();

    let id = competency.id;
    let name = competency.name.clone();
    let marks = competency.marks;
    let updated_by = competency.audit.updated_by;
    let at_str = encode_dt(competency.audit.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE competencies
           SET name = ?1, marks = ?2, updated_by = ?3, updated_at = ?4
           WHERE id = ?5",
          rusqlite::params![name, marks, updated_by, at_str, id],
        )?;
        Ok(())
      })
      .await?;

    Ok(competency)
  }

  async fn remove_competency(&self, id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM competencies WHERE id = ?1",
          rusqlite::params![id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
