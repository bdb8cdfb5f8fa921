//! Handlers for `/subjects` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/subjects` | Every subject with its competencies |
//! | `POST`   | `/subjects` | Body: `{"name":"Mathematics","description":"..."}` |
//! | `GET`    | `/subjects/{id}` | 404 if not found |
//! | `PATCH`  | `/subjects/{id}` | Partial body; `name` cannot be `null` |
//! | `DELETE` | `/subjects/{id}` | Cascades to competencies |

use axum::{
  extract::{Path, State},
  response::IntoResponse,
};
use grades_core::{
  guard,
  store::GradeStore,
  subject::{CreateSubject, UpdateSubject},
};

use crate::{AppState, envelope, error::ApiError, schema::Valid};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /subjects`
pub async fn list<S: GradeStore>(
  State(state): State<AppState<S>>,
) -> Result<impl IntoResponse, ApiError> {
  let subjects = state.subjects.get_all().await?;
  let message = format!("Retrieved {} subjects successfully", subjects.len());
  Ok(envelope::ok(subjects, message))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /subjects`
pub async fn create<S: GradeStore>(
  State(state): State<AppState<S>>,
  Valid(body): Valid<CreateSubject>,
) -> Result<impl IntoResponse, ApiError> {
  tracing::debug!("POST /subjects - Creating subject: {}", body.name);
  let subject = state.subjects.create(body).await?;
  Ok(envelope::created(subject, "Subject created successfully"))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /subjects/{id}`
pub async fn get_one<S: GradeStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  let id = guard::parse_id(&id, "Subject")?;
  let subject = state.subjects.get_by_id(id).await?;
  Ok(envelope::ok(subject, "Subject retrieved successfully"))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PATCH /subjects/{id}`
pub async fn update<S: GradeStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Valid(body): Valid<UpdateSubject>,
) -> Result<impl IntoResponse, ApiError> {
  let id = guard::parse_id(&id, "Subject")?;
  let subject = state.subjects.update(id, body).await?;
  Ok(envelope::ok(subject, "Subject updated successfully"))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /subjects/{id}`
pub async fn delete<S: GradeStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  let id = guard::parse_id(&id, "Subject")?;
  state.subjects.delete(id).await?;
  Ok(envelope::ok(
    (),
    "Subject and its competencies deleted successfully",
  ))
}
