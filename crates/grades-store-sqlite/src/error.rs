//! Error type for `grades-store-sqlite`.

use grades_core::store::{StoreError, Violation};
use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored integer does not fit the domain type (e.g. marks above 255).
  #[error("invalid {column} value in database: {value}")]
  Column { column: &'static str, value: i64 },
}

impl StoreError for Error {
  fn violation(&self) -> Option<Violation> {
    let Error::Database(tokio_rusqlite::Error::Rusqlite(
      rusqlite::Error::SqliteFailure(e, _),
    )) = self
    else {
      return None;
    };

    match e.extended_code {
      ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
        Some(Violation::Unique)
      }
      ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Violation::ForeignKey),
      ffi::SQLITE_CONSTRAINT_CHECK => Some(Violation::Check),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
