//! Request body validation ahead of the service layer.
//!
//! [`Valid<T>`] deserialises a JSON body and runs the shape checks declared
//! for `T`. Semantic rules (trimming, uniqueness, existence) stay in
//! `grades-core`.

use axum::{
  Json,
  extract::{FromRequest, Request},
};
use grades_core::{
  Patch,
  competency::{CreateCompetency, MAX_MARKS, MIN_MARKS, UpdateCompetency},
  rules::{NAME_MAX_LENGTH, NAME_MIN_LENGTH},
  subject::{CreateSubject, UpdateSubject},
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// Shape checks for a request payload.
pub trait Validate {
  fn validate(&self) -> Result<(), ApiError>;
}

/// A JSON body that passed [`Validate`].
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
  T: DeserializeOwned + Validate,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, ApiError> {
    let Json(value) = Json::<T>::from_request(req, state).await?;
    value.validate()?;
    Ok(Self(value))
  }
}

// ─── Field checks ────────────────────────────────────────────────────────────

fn check_name(entity: &str, name: &str, required: bool) -> Result<(), ApiError> {
  if name.is_empty() {
    let message = if required {
      format!("{entity} name is required")
    } else {
      format!("{entity} name cannot be empty")
    };
    return Err(ApiError::BadRequest(message));
  }
  let len = name.chars().count();
  if !(NAME_MIN_LENGTH..=NAME_MAX_LENGTH).contains(&len) {
    return Err(ApiError::BadRequest(format!(
      "{entity} name must be between {NAME_MIN_LENGTH} and {NAME_MAX_LENGTH} \
       characters"
    )));
  }
  Ok(())
}

/// Marks must be an integer, given either as a JSON number or as a numeric
/// string.
fn check_marks(raw: &Value) -> Result<(), ApiError> {
  let marks = match raw {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok(),
    _ => None,
  };
  let Some(marks) = marks.filter(|m| m.is_finite() && m.fract() == 0.0) else {
    return Err(ApiError::BadRequest("Marks must be an integer".to_owned()));
  };

  if marks < f64::from(MIN_MARKS) {
    return Err(ApiError::BadRequest("Marks cannot be negative".to_owned()));
  }
  if marks > f64::from(MAX_MARKS) {
    return Err(ApiError::BadRequest(format!(
      "Marks cannot be more than {MAX_MARKS}"
    )));
  }
  Ok(())
}

// ─── Payloads ────────────────────────────────────────────────────────────────

impl Validate for CreateSubject {
  fn validate(&self) -> Result<(), ApiError> {
    check_name("Subject", &self.name, true)
  }
}

impl Validate for UpdateSubject {
  fn validate(&self) -> Result<(), ApiError> {
    // An explicit null is left to the service, which rejects it for names.
    if let Patch::Value(name) = &self.name {
      check_name("Subject", name, false)?;
    }
    Ok(())
  }
}

impl Validate for CreateCompetency {
  fn validate(&self) -> Result<(), ApiError> {
    check_name("Competency", &self.name, true)?;
    check_marks(&self.marks)
  }
}

impl Validate for UpdateCompetency {
  fn validate(&self) -> Result<(), ApiError> {
    if let Patch::Value(name) = &self.name {
      check_name("Competency", name, false)?;
    }
    if let Patch::Value(marks) = &self.marks {
      check_marks(marks)?;
    }
    Ok(())
  }
}
