//! Tri-state field for partial updates.

use serde::{Deserialize, Deserializer};

/// A field in a partial-update payload.
///
/// Distinguishes a field the caller left out ([`Patch::Absent`], "no change")
/// from one explicitly sent as `null` ([`Patch::Null`], "clear it").
///
/// Deserialises from `Option<T>`; pair with `#[serde(default)]` so a missing
/// key becomes `Absent`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
  #[default]
  Absent,
  Null,
  Value(T),
}

impl<T> Patch<T> {
  pub fn is_absent(&self) -> bool { matches!(self, Self::Absent) }

  pub fn as_ref(&self) -> Patch<&T> {
    match self {
      Self::Absent => Patch::Absent,
      Self::Null => Patch::Null,
      Self::Value(v) => Patch::Value(v),
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
    match self {
      Self::Absent => Patch::Absent,
      Self::Null => Patch::Null,
      Self::Value(v) => Patch::Value(f(v)),
    }
  }

  /// The supplied value, if any. Both `Absent` and `Null` yield `None`.
  pub fn value(self) -> Option<T> {
    match self {
      Self::Value(v) => Some(v),
      _ => None,
    }
  }
}

impl<T> From<Option<T>> for Patch<T> {
  fn from(opt: Option<T>) -> Self {
    match opt {
      Some(v) => Self::Value(v),
      None => Self::Null,
    }
  }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
  T: Deserialize<'de>,
{
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    Option::<T>::deserialize(deserializer).map(Into::into)
  }
}
