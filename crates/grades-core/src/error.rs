//! Error types for `grades-core`.

use thiserror::Error;

/// Coarse classification of an [`Error`], used by boundaries to pick a
/// response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  InvalidInput,
  NotFound,
  AlreadyExists,
  Internal,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  InvalidInput(String),

  #[error("Subject with ID {0} not found")]
  SubjectNotFound(i64),

  #[error("Competency with ID {0} not found")]
  CompetencyNotFound(i64),

  #[error("Subject with name '{0}' already exists")]
  SubjectAlreadyExists(String),

  #[error("Competency with name '{name}' already exists in subject '{subject}'")]
  CompetencyAlreadyExists { name: String, subject: String },

  /// An invariant that the store should have upheld did not hold.
  #[error("internal error: {0}")]
  Internal(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn invalid(message: impl Into<String>) -> Self {
    Self::InvalidInput(message.into())
  }

  /// Box a backend error as-is. Write paths check
  /// [`crate::store::StoreError::violation`] before falling back to this.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::InvalidInput(_) => ErrorKind::InvalidInput,
      Self::SubjectNotFound(_) | Self::CompetencyNotFound(_) => {
        ErrorKind::NotFound
      }
      Self::SubjectAlreadyExists(_) | Self::CompetencyAlreadyExists { .. } => {
        ErrorKind::AlreadyExists
      }
      Self::Internal(_) | Self::Store(_) => ErrorKind::Internal,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
