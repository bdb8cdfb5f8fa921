//! JSON REST API for the grade management service.
//!
//! Exposes an axum [`Router`] backed by any [`grades_core::store::GradeStore`].
//! TLS, CORS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = grades_api::api_router(store.clone()).layer(TraceLayer::new_for_http());
//! ```

pub mod competencies;
pub mod envelope;
pub mod error;
pub mod health;
pub mod schema;
pub mod subjects;

use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use grades_core::{CompetencyService, SubjectService, store::GradeStore};

pub use error::ApiError;

/// Shared handler state: one service per entity over the same store.
pub struct AppState<S> {
  pub subjects:     SubjectService<S>,
  pub competencies: CompetencyService<S>,
  pub store:        Arc<S>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      subjects:     self.subjects.clone(),
      competencies: self.competencies.clone(),
      store:        Arc::clone(&self.store),
    }
  }
}

impl<S: GradeStore> AppState<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      subjects:     SubjectService::new(Arc::clone(&store)),
      competencies: CompetencyService::new(Arc::clone(&store)),
      store,
    }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be merged or nested into any parent router
/// regardless of its own state type. Every error response, including those
/// for unknown routes, uses the failure envelope.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: GradeStore + 'static,
{
  Router::new()
    // Subjects
    .route("/subjects", get(subjects::list::<S>).post(subjects::create::<S>))
    .route(
      "/subjects/{id}",
      get(subjects::get_one::<S>)
        .patch(subjects::update::<S>)
        .delete(subjects::delete::<S>),
    )
    // Competencies
    .route(
      "/subjects/{subject_id}/competencies",
      get(competencies::list_by_subject::<S>)
        .post(competencies::create::<S>),
    )
    .route(
      "/competencies/{id}",
      get(competencies::get_one::<S>)
        .patch(competencies::update::<S>)
        .delete(competencies::delete::<S>),
    )
    // Health
    .route("/health", get(health::handler::<S>))
    .fallback(envelope::not_found)
    .method_not_allowed_fallback(envelope::not_found)
    .layer(middleware::from_fn(envelope::failures))
    .with_state(AppState::new(store))
}
