//! Domain rules: semantic validation, existence checks and name-uniqueness
//! scoping, one module per entity.
//!
//! Rules combine the pure [`crate::guard`] checks with read-only store
//! lookups. They never write; persisting is the service layer's job.

use crate::{Error, Result, guard};

pub mod competency;
pub mod subject;

/// Shortest permitted subject or competency name, in characters, after
/// trimming.
pub const NAME_MIN_LENGTH: usize = 2;
/// Longest permitted subject or competency name, in characters.
pub const NAME_MAX_LENGTH: usize = 100;

/// Trim a name and check it against [`NAME_MIN_LENGTH`] and
/// [`NAME_MAX_LENGTH`].
fn clean_name(name: Option<&str>, field_name: &str) -> Result<String> {
  let clean =
    guard::validate_and_clean_string(name, field_name, NAME_MAX_LENGTH)?;
  if clean.chars().count() < NAME_MIN_LENGTH {
    tracing::warn!("{field_name} too short after trimming: {clean:?}");
    return Err(Error::invalid(format!(
      "{field_name} must be between {NAME_MIN_LENGTH} and {NAME_MAX_LENGTH} \
       characters"
    )));
  }
  Ok(clean)
}
