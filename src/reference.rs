//! Tri-state lazy references.
//!
//! A [`Ref`] is a pointer to another document location, that pointer together
//! with the value it was resolved to, or a value written in place.
//!
//! Serialization keeps the pointer whenever there is one, so a resolved
//! reference writes back exactly as it was read.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The state of a [`Ref`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefState {
    Unresolved,
    Resolved,
    Inline,
}

/// A reference that is unresolved, resolved, or inline.
#[derive(Debug, Clone, PartialEq)]
pub enum Ref<T> {
    /// A `$ref` path that has not been followed.
    Unresolved(String),
    /// A `$ref` path and the value found by following it.
    Resolved { path: String, value: T },
    /// A value written directly in place.
    Inline(T),
}

impl<T> Ref<T> {
    /// An unresolved reference to `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Ref::Unresolved(path.into())
    }

    pub fn inline(value: T) -> Self {
        Ref::Inline(value)
    }

    pub fn resolved(path: impl Into<String>, value: T) -> Self {
        Ref::Resolved {
            path: path.into(),
            value,
        }
    }

    pub fn state(&self) -> RefState {
        match self {
            Ref::Unresolved(_) => RefState::Unresolved,
            Ref::Resolved { .. } => RefState::Resolved,
            Ref::Inline(_) => RefState::Inline,
        }
    }

    /// The `$ref` path, if this is a pointer.
    pub fn path(&self) -> Option<&str> {
        match self {
            Ref::Unresolved(path) | Ref::Resolved { path, .. } => Some(path),
            Ref::Inline(_) => None,
        }
    }

    /// True for `Unresolved` and `Resolved`.
    pub fn is_ref(&self) -> bool {
        self.path().is_some()
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Ref::Inline(_))
    }

    /// True when a value is available (`Resolved` or `Inline`).
    pub fn is_resolved(&self) -> bool {
        self.get().is_some()
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Ref::Unresolved(_) => None,
            Ref::Resolved { value, .. } | Ref::Inline(value) => Some(value),
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Ref::Unresolved(_) => None,
            Ref::Resolved { value, .. } | Ref::Inline(value) => Some(value),
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Ref::Unresolved(_) => None,
            Ref::Resolved { value, .. } | Ref::Inline(value) => Some(value),
        }
    }

    /// Attach a value.
    ///
    /// A pointer becomes `Resolved`; an inline value is replaced and stays
    /// `Inline`.
    pub fn resolve(&mut self, value: T) {
        let next = match std::mem::replace(self, Ref::Unresolved(String::new())) {
            Ref::Unresolved(path) | Ref::Resolved { path, .. } => Ref::Resolved { path, value },
            Ref::Inline(_) => Ref::Inline(value),
        };
        *self = next;
    }
}

impl<T: Serialize> Serialize for Ref<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Ref::Unresolved(path) | Ref::Resolved { path, .. } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$ref", path)?;
                map.end()
            }
            Ref::Inline(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Ref<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let node = Value::deserialize(deserializer)?;
        if let Some(target) = node.get("$ref") {
            return match target.as_str() {
                Some("") => Err(de::Error::custom("$ref must not be empty")),
                Some(path) => Ok(Ref::Unresolved(path.to_string())),
                None => Err(de::Error::custom("$ref must be a string")),
            };
        }
        T::deserialize(node)
            .map(Ref::Inline)
            .map_err(de::Error::custom)
    }
}
