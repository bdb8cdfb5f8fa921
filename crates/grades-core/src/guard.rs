//! Input guards: the base layer every rule and service builds on.
//!
//! Each function is pure: no store access, no logging, and calling it twice
//! on its own output yields the same result. Failures are always
//! [`Error::InvalidInput`] with a message naming the offending field.

use std::fmt::Display;

use serde_json::Value;

use crate::{Error, Result};

/// Length limit applied when a caller has no field-specific maximum.
pub const DEFAULT_MAX_LENGTH: usize = 255;

/// Unwrap `value`, failing if it is absent.
pub fn require_non_null<T>(value: Option<T>, field_name: &str) -> Result<T> {
  value.ok_or_else(|| {
    Error::invalid(format!("{field_name} cannot be null or undefined"))
  })
}

/// `true` if `s` is absent or contains only whitespace.
pub fn is_null_or_empty(s: Option<&str>) -> bool {
  s.is_none_or(|s| s.trim().is_empty())
}

/// `s`, or `default` when absent. Used to keep log lines readable.
pub fn safe_string(s: Option<&str>, default: &str) -> String {
  s.unwrap_or(default).to_owned()
}

/// Require a non-blank string no longer than `max_length` characters and
/// return it trimmed.
pub fn validate_and_clean_string(
  input: Option<&str>,
  field_name: &str,
  max_length: usize,
) -> Result<String> {
  let Some(input) = input.filter(|s| !s.trim().is_empty()) else {
    return Err(Error::invalid(format!(
      "{field_name} is required and cannot be empty"
    )));
  };

  let clean = input.trim();
  if clean.chars().count() > max_length {
    return Err(Error::invalid(format!(
      "{field_name} cannot exceed {max_length} characters"
    )));
  }

  Ok(clean.to_owned())
}

/// Require a positive identifier.
pub fn validate_id(id: Option<i64>, entity_name: &str) -> Result<i64> {
  match id {
    Some(id) if id > 0 => Ok(id),
    other => Err(invalid_id(entity_name, display_opt(other))),
  }
}

/// [`validate_id`] for an identifier still in its textual form (a URL path
/// segment). Non-numeric input is rejected the same way as a non-positive id.
pub fn parse_id(raw: &str, entity_name: &str) -> Result<i64> {
  match raw.trim().parse::<i64>() {
    Ok(id) => validate_id(Some(id), entity_name),
    Err(_) => Err(invalid_id(entity_name, raw)),
  }
}

/// Coerce a loosely-typed JSON value to a number, falling back to `default`.
///
/// Numbers pass through, numeric strings are parsed (a blank string is `0`),
/// booleans map to `0`/`1`. Everything else, including non-finite results,
/// yields `default`. Never fails.
pub fn safe_number(value: Option<&Value>, default: f64) -> f64 {
  let coerced = match value {
    Some(Value::Number(n)) => n.as_f64(),
    Some(Value::String(s)) if s.trim().is_empty() => Some(0.0),
    Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
    Some(Value::Bool(b)) => Some(f64::from(u8::from(*b))),
    _ => None,
  };
  coerced.filter(|n| n.is_finite()).unwrap_or(default)
}

fn invalid_id(entity_name: &str, received: impl Display) -> Error {
  Error::invalid(format!(
    "Valid {entity_name} ID is required. Received: {received}"
  ))
}

fn display_opt(id: Option<i64>) -> String {
  id.map_or_else(|| "undefined".to_owned(), |id| id.to_string())
}
