//! Present/absent wrapper for partial updates.

use serde::{Deserialize, Deserializer};

/// A field in a partial update.
///
/// `Keep` means the field was absent from the request; `Set` carries the new
/// value, which may legitimately be empty, zero or `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Keep,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Self::Keep => Patch::Keep,
            Self::Set(v) => Patch::Set(f(v)),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Keep => None,
            Self::Set(v) => Some(v),
        }
    }

    /// Overwrite `target` when a value is present. Returns whether it changed.
    pub fn apply_to(self, target: &mut T) -> bool {
        match self {
            Self::Keep => false,
            Self::Set(v) => {
                *target = v;
                true
            }
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Keep
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Set(v),
            None => Self::Keep,
        }
    }
}

/// Absent fields come from `#[serde(default)]`; anything present is `Set`.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::Set)
    }
}
