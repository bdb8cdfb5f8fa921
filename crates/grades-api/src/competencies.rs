//! Handlers for competency endpoints.
//!
//! Competencies are created and listed through their parent subject and
//! addressed directly by id otherwise.

use axum::{
  extract::{Path, State},
  response::IntoResponse,
};
use grades_core::{
  competency::{CreateCompetency, UpdateCompetency},
  guard,
  store::GradeStore,
};

use crate::{AppState, envelope, error::ApiError, schema::Valid};

/// `POST /subjects/{subject_id}/competencies`
pub async fn create<S: GradeStore>(
  State(state): State<AppState<S>>,
  Path(subject_id): Path<String>,
  Valid(body): Valid<CreateCompetency>,
) -> Result<impl IntoResponse, ApiError> {
  let subject_id = guard::parse_id(&subject_id, "Subject")?;
  let competency = state.competencies.create(subject_id, body).await?;
  Ok(envelope::created(competency, "Competency created successfully"))
}

/// `GET /subjects/{subject_id}/competencies`
pub async fn list_by_subject<S: GradeStore>(
  State(state): State<AppState<S>>,
  Path(subject_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  let subject_id = guard::parse_id(&subject_id, "Subject")?;
  let competencies = state.competencies.list_by_subject(subject_id).await?;
  let message = format!(
    "Retrieved {} competencies successfully",
    competencies.len()
  );
  Ok(envelope::ok(competencies, message))
}

/// `GET /competencies/{id}`
pub async fn get_one<S: GradeStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  let id = guard::parse_id(&id, "Competency")?;
  let competency = state.competencies.get_by_id(id).await?;
  Ok(envelope::ok(competency, "Competency retrieved successfully"))
}

/// `PATCH /competencies/{id}`
pub async fn update<S: GradeStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Valid(body): Valid<UpdateCompetency>,
) -> Result<impl IntoResponse, ApiError> {
  let id = guard::parse_id(&id, "Competency")?;
  let competency = state.competencies.update(id, body).await?;
  Ok(envelope::ok(competency, "Competency updated successfully"))
}

/// `DELETE /competencies/{id}`
pub async fn delete<S: GradeStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  let id = guard::parse_id(&id, "Competency")?;
  state.competencies.delete(id).await?;
  Ok(envelope::ok((), "Competency deleted successfully"))
}
