//! `GET /health`: liveness plus a store round-trip.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{SecondsFormat, Utc};
use grades_core::store::GradeStore;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
  pub status:    &'static str,
  pub message:   &'static str,
  pub timestamp: String,
  pub database:  &'static str,
}

/// `GET /health`
pub async fn handler<S: GradeStore>(
  State(state): State<AppState<S>>,
) -> (StatusCode, Json<Health>) {
  let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

  match state.store.ping().await {
    Ok(()) => (
      StatusCode::OK,
      Json(Health {
        status: "OK",
        message: "Service is running",
        timestamp,
        database: "connected",
      }),
    ),
    Err(e) => {
      tracing::error!("Health check failed: {e}");
      (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(Health {
          status: "ERROR",
          message: "Database unavailable",
          timestamp,
          database: "disconnected",
        }),
      )
    }
  }
}
