//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! A handler's error response carries only its status and message. The
//! [`crate::envelope`] middleware completes it with the request path and a
//! timestamp once the response is on its way out.

use axum::{
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use grades_core::ErrorKind;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  BadRequest(String),

  #[error("{0}")]
  Conflict(String),

  /// The request body could not be read as JSON of the expected shape.
  #[error("{message}")]
  Body { status: StatusCode, message: String },

  #[error("internal error: {0}")]
  Internal(#[source] grades_core::Error),
}

/// The user-facing message of an error response, picked up by the envelope
/// middleware.
#[derive(Debug, Clone)]
pub struct ErrorMessage(pub String);

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Body { status, .. } => *status,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn public_message(&self) -> String {
    match self {
      // Details stay in the log.
      ApiError::Internal(_) => "Internal server error".to_owned(),
      other => other.to_string(),
    }
  }
}

impl From<grades_core::Error> for ApiError {
  fn from(e: grades_core::Error) -> Self {
    match e.kind() {
      ErrorKind::InvalidInput => ApiError::BadRequest(e.to_string()),
      ErrorKind::NotFound => ApiError::NotFound(e.to_string()),
      ErrorKind::AlreadyExists => ApiError::Conflict(e.to_string()),
      ErrorKind::Internal => ApiError::Internal(e),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    // Malformed or mistyped bodies are plain bad requests; only a missing
    // content type keeps its own status.
    let status = match &rejection {
      JsonRejection::MissingJsonContentType(_) => rejection.status(),
      _ => StatusCode::BAD_REQUEST,
    };
    ApiError::Body {
      status,
      message: rejection.body_text(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    if let ApiError::Internal(e) = &self {
      tracing::error!("Unexpected error: {e}");
    }
    let message = self.public_message();
    let mut response = (self.status(), message.clone()).into_response();
    response.extensions_mut().insert(ErrorMessage(message));
    response
  }
}
