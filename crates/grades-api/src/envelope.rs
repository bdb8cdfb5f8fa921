//! Response envelopes shared by every endpoint.
//!
//! Successes are `{"success":true,"data":..,"message":..}`. Failures are
//! rewritten by [`failures`] into
//! `{"success":false,"message","timestamp","path","statusCode"}`.

use axum::{
  Json,
  extract::{OriginalUri, Request},
  http::{Method, StatusCode},
  middleware::Next,
  response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::{ApiError, ErrorMessage};

// ─── Success ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Success<T> {
  pub success: bool,
  pub data:    T,
  pub message: String,
}

/// `200 OK` with `data` wrapped in the success envelope.
pub fn ok<T: Serialize>(data: T, message: impl Into<String>) -> Json<Success<T>> {
  Json(Success {
    success: true,
    data,
    message: message.into(),
  })
}

/// `201 Created` with `data` wrapped in the success envelope.
pub fn created<T: Serialize>(
  data: T,
  message: impl Into<String>,
) -> (StatusCode, Json<Success<T>>) {
  (StatusCode::CREATED, ok(data, message))
}

// ─── Failure ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Failure {
  success:     bool,
  message:     String,
  timestamp:   String,
  path:        String,
  status_code: u16,
}

/// Middleware: turn every [`ApiError`] response into the failure envelope
/// and log it against the request that caused it.
pub async fn failures(request: Request, next: Next) -> Response {
  let method = request.method().clone();
  let path = request
    .extensions()
    .get::<OriginalUri>()
    .map_or(request.uri(), |OriginalUri(uri)| uri)
    .path_and_query()
    .map_or_else(|| "/".to_owned(), |pq| pq.as_str().to_owned());

  let response = next.run(request).await;
  let Some(ErrorMessage(message)) =
    response.extensions().get::<ErrorMessage>().cloned()
  else {
    return response;
  };

  let status = response.status();
  tracing::error!(
    "HTTP {} Error: {message} - {method} {path}",
    status.as_u16()
  );

  let body = Failure {
    success: false,
    message,
    timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    path,
    status_code: status.as_u16(),
  };
  (status, Json(body)).into_response()
}

/// Fallback for unmatched routes.
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
  ApiError::NotFound(format!("Cannot {method} {}", uri.path()))
}
