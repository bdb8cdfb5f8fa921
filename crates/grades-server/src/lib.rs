//! HTTP server assembly for the grade management service.
//!
//! Wraps the [`grades_api`] router with CORS for the frontend and request
//! tracing. Configuration is read from an optional TOML file layered with
//! `GRADES_*` environment variables.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::{
  Router,
  http::{HeaderValue, Method, header},
};
use grades_core::store::GradeStore;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  pub database_path: PathBuf,
  /// The single origin allowed to call the API from a browser.
  pub frontend_url:  String,
}

impl ServerConfig {
  /// Load from `path` if it exists, then from the environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    Self::from_file(config::File::from(path).required(false))
  }

  fn from_file<F>(file: F) -> Result<Self, config::ConfigError>
  where
    F: config::Source + Send + Sync + 'static,
  {
    config::Config::builder()
      .set_default("host", "0.0.0.0")?
      .set_default("port", 3001)?
      .set_default("database_path", "grades.db")?
      .set_default("frontend_url", "http://localhost:3003")?
      .add_source(file)
      .add_source(config::Environment::with_prefix("GRADES"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the complete application router for `store`.
pub fn app<S>(store: Arc<S>, config: &ServerConfig) -> anyhow::Result<Router>
where
  S: GradeStore + 'static,
{
  let origin = HeaderValue::from_str(&config.frontend_url)
    .with_context(|| format!("invalid frontend_url {:?}", config.frontend_url))?;

  let cors = CorsLayer::new()
    .allow_origin(origin)
    .allow_credentials(true)
    .allow_methods([
      Method::GET,
      Method::POST,
      Method::PATCH,
      Method::DELETE,
      Method::OPTIONS,
    ])
    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

  Ok(
    grades_api::api_router(store)
      .layer(cors)
      .layer(TraceLayer::new_for_http()),
  )
}

// ─── Tests ───────────────────────────────────────────────────────────────────
