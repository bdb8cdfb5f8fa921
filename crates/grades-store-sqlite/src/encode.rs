//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond
//! precision, so lexicographic order equals chronological order.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use grades_core::{
  audit::Audit,
  competency::Competency,
  subject::{Subject, SubjectSummary},
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Column lists ────────────────────────────────────────────────────────────

/// Subject columns, in the order [`RawSubject::from_row`] reads them.
pub const SUBJECT_COLUMNS: &str = "s.id, s.name, s.description, s.is_active, \
   s.created_by, s.updated_by, s.created_at, s.updated_at";

/// Competency columns, in the order [`RawCompetency::from_row`] reads them.
pub const COMPETENCY_COLUMNS: &str = "c.id, c.name, c.marks, c.subject_id, \
   c.is_active, c.created_by, c.updated_by, c.created_at, c.updated_at";

#[cfg(test)]
const SUBJECT_WIDTH: usize = 8;
const COMPETENCY_WIDTH: usize = 9;

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `subjects` row.
pub struct RawSubject {
  pub id:          i64,
  pub name:        String,
  pub description: Option<String>,
  pub is_active:   bool,
  pub created_by:  Option<i64>,
  pub updated_by:  Option<i64>,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawSubject {
  /// Read [`SUBJECT_COLUMNS`] starting at column `at`.
  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(at)?,
      name:        row.get(at + 1)?,
      description: row.get(at + 2)?,
      is_active:   row.get(at + 3)?,
      created_by:  row.get(at + 4)?,
      updated_by:  row.get(at + 5)?,
      created_at:  row.get(at + 6)?,
      updated_at:  row.get(at + 7)?,
    })
  }

  /// Like [`Self::from_row`] for the nullable side of a `LEFT JOIN`.
  pub fn from_joined_row(
    row: &Row<'_>,
    at: usize,
  ) -> rusqlite::Result<Option<Self>> {
    match row.get::<_, Option<i64>>(at)? {
      Some(_) => Self::from_row(row, at).map(Some),
      None => Ok(None),
    }
  }

  fn audit(&self) -> Result<Audit> {
    Ok(Audit {
      is_active:  self.is_active,
      created_by: self.created_by,
      updated_by: self.updated_by,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }

  pub fn into_subject(
    self,
    competencies: Option<Vec<Competency>>,
  ) -> Result<Subject> {
    Ok(Subject {
      audit: self.audit()?,
      id: self.id,
      name: self.name,
      description: self.description,
      competencies,
    })
  }

  pub fn into_summary(self) -> Result<SubjectSummary> {
    Ok(SubjectSummary {
      audit:       self.audit()?,
      id:          self.id,
      name:        self.name,
      description: self.description,
    })
  }
}

/// Raw values read from a `competencies` row, optionally joined with its
/// subject.
pub struct RawCompetency {
  pub id:         i64,
  pub name:       String,
  pub marks:      i64,
  pub subject_id: i64,
  pub is_active:  bool,
  pub created_by: Option<i64>,
  pub updated_by: Option<i64>,
  pub created_at: String,
  pub updated_at: String,
  // subjects join
  pub subject:    Option<RawSubject>,
}

impl RawCompetency {
  /// Read [`COMPETENCY_COLUMNS`] starting at column 0.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      name:       row.get(1)?,
      marks:      row.get(2)?,
      subject_id: row.get(3)?,
      is_active:  row.get(4)?,
      created_by: row.get(5)?,
      updated_by: row.get(6)?,
      created_at: row.get(7)?,
      updated_at: row.get(8)?,
      subject:    None,
    })
  }

  /// Read [`COMPETENCY_COLUMNS`] followed by the `LEFT JOIN`ed
  /// [`SUBJECT_COLUMNS`].
  pub fn from_joined_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    let mut raw = Self::from_row(row)?;
    raw.subject = RawSubject::from_joined_row(row, COMPETENCY_WIDTH)?;
    Ok(raw)
  }

  pub fn into_competency(self) -> Result<Competency> {
    let marks = u8::try_from(self.marks).map_err(|_| Error::Column {
      column: "marks",
      value:  self.marks,
    })?;

    Ok(Competency {
      id: self.id,
      name: self.name,
      marks,
      subject_id: self.subject_id,
      subject: self.subject.map(RawSubject::into_summary).transpose()?,
      audit: Audit {
        is_active:  self.is_active,
        created_by: self.created_by,
        updated_by: self.updated_by,
        created_at: decode_dt(&self.created_at)?,
        updated_at: decode_dt(&self.updated_at)?,
      },
    })
  }
}
