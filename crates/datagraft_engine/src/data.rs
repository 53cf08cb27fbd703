//! Borrowed views over input data.
//!
//! Input documents arrive as `serde_json::Value` trees. A [`DataView`] hides
//! the per-node reserved keys (`$name`, `$type`, `$inherit`) from descriptor
//! population without copying the underlying mapping.

use std::sync::Arc;

use datagraft_foundation::{DataKind, Error, ErrorKind, GMap, List, Result, Value};
use serde_json::Value as Json;

/// Name under which a top-level entry is stored.
pub const NAME_KEY: &str = "$name";
/// Explicit descriptor name for a node.
pub const TYPE_KEY: &str = "$type";
/// Name of a resolved entry to clone as a node's starting value.
pub const INHERIT_KEY: &str = "$inherit";
/// Top-level wrapper holding a sequence of entries.
pub const VALUES_KEY: &str = "$values";
/// Top-level wrapper holding a single entry.
pub const VALUE_KEY: &str = "$value";

/// Returns true for keys stripped from a node's working data.
#[must_use]
pub fn is_reserved(key: &str) -> bool {
    matches!(key, NAME_KEY | TYPE_KEY | INHERIT_KEY)
}

/// Returns the data kind of a raw datum.
#[must_use]
pub fn kind_of(data: &Json) -> DataKind {
    match data {
        Json::Null => DataKind::Null,
        Json::Bool(_) => DataKind::Boolean,
        Json::Number(_) => DataKind::Number,
        Json::String(_) => DataKind::String,
        Json::Array(_) => DataKind::Sequence,
        Json::Object(_) => DataKind::Mapping,
    }
}

/// Converts raw data into a [`Value`] verbatim.
///
/// Integers that fit `i64` become [`Value::Int`], every other number becomes
/// [`Value::Float`]. Nested mappings keep all of their keys.
#[must_use]
pub fn to_value(data: &Json) -> Value {
    match data {
        Json::Null => Value::Nil,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::from(s.as_str()),
        Json::Array(items) => Value::list(List::from_items(None, items.iter().map(to_value))),
        Json::Object(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (Arc::from(k.as_str()), to_value(v)))
                .collect(),
        ),
    }
}

/// A node's working data: the raw datum with reserved keys hidden.
#[derive(Clone, Copy, Debug)]
pub struct DataView<'d> {
    raw: &'d Json,
}

impl<'d> DataView<'d> {
    /// Wraps a raw datum.
    #[must_use]
    pub fn new(raw: &'d Json) -> Self {
        Self { raw }
    }

    /// Returns the underlying datum, reserved keys included.
    #[must_use]
    pub fn raw(self) -> &'d Json {
        self.raw
    }

    /// Returns the data kind.
    #[must_use]
    pub fn kind(self) -> DataKind {
        kind_of(self.raw)
    }

    /// Returns true if the datum is a mapping.
    #[must_use]
    pub fn is_mapping(self) -> bool {
        self.raw.is_object()
    }

    /// Returns the items if the datum is a sequence.
    #[must_use]
    pub fn as_sequence(self) -> Option<&'d [Json]> {
        self.raw.as_array().map(Vec::as_slice)
    }

    /// Looks up a non-reserved key on a mapping.
    #[must_use]
    pub fn get(self, key: &str) -> Option<&'d Json> {
        if is_reserved(key) {
            return None;
        }
        self.raw.as_object()?.get(key)
    }

    /// Iterates the non-reserved entries of a mapping (empty otherwise).
    pub fn entries(self) -> impl Iterator<Item = (&'d str, &'d Json)> {
        self.raw
            .as_object()
            .into_iter()
            .flat_map(serde_json::Map::iter)
            .filter(|(k, _)| !is_reserved(k))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates the non-reserved keys of a mapping.
    pub fn keys(self) -> impl Iterator<Item = &'d str> {
        self.entries().map(|(k, _)| k)
    }

    /// Reads a reserved key. Only mappings carry reserved keys.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReservedKey` if the key is present but not a string.
    pub fn reserved(self, key: &str) -> Result<Option<&'d str>> {
        let Some(found) = self.raw.as_object().and_then(|m| m.get(key)) else {
            return Ok(None);
        };
        match found {
            Json::String(s) => Ok(Some(s.as_str())),
            other => Err(Error::new(ErrorKind::InvalidReservedKey {
                key: key.to_string(),
                actual: kind_of(other),
            })),
        }
    }

    /// Converts the working data into a [`Value`], leaving out reserved keys.
    #[must_use]
    pub fn to_value(self) -> Value {
        match self.raw {
            Json::Object(_) => Value::Map(
                self.entries()
                    .map(|(k, v)| (Arc::from(k), to_value(v)))
                    .collect::<GMap<_, _>>(),
            ),
            other => to_value(other),
        }
    }
}
