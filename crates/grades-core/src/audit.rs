//! Bookkeeping columns shared by every persisted entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-maintained audit fields. Flattened into the owning entity's JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
  pub is_active:  bool,
  pub created_by: Option<i64>,
  pub updated_by: Option<i64>,
  /// Set once by the store on insert.
  pub created_at: DateTime<Utc>,
  /// Refreshed by the store on every save.
  pub updated_at: DateTime<Utc>,
}

impl Audit {
  /// Audit fields for a row created at `at` by an unknown actor.
  pub fn created(at: DateTime<Utc>) -> Self {
    Self {
      is_active:  true,
      created_by: None,
      updated_by: None,
      created_at: at,
      updated_at: at,
    }
  }
}
