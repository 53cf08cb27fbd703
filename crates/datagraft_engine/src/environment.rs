//! The environment: named results of deserialization.

use std::sync::Arc;

use datagraft_foundation::{Error, ErrorKind, GMap, Result, Value};
use serde::de::DeserializeOwned;

use crate::node::NodePool;

/// Resolved top-level entries by name, plus the node pool used to build them.
///
/// An environment outlives individual deserialize calls: entries resolved
/// by one document can be inherited by the next.
#[derive(Debug, Default)]
pub struct Environment {
    values: GMap<Arc<str>, Value>,
    pool: NodePool,
}

impl Environment {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets an entry by name.
    #[must_use]
    pub fn get_value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Gets an entry converted into a Rust type through serde.
    ///
    /// # Errors
    ///
    /// Returns `Conversion` if the entry does not fit `T`.
    pub fn get_typed<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let Some(value) = self.get_value(name) else {
            return Ok(None);
        };
        serde_json::to_value(value)
            .and_then(serde_json::from_value)
            .map(Some)
            .map_err(|e| Error::new(ErrorKind::Conversion(format!("entry `{name}`: {e}"))))
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, name: impl Into<Arc<str>>, value: Value) -> Option<Value> {
        self.values.set(name.into(), value)
    }

    /// Removes an entry.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.take(name)
    }

    /// Returns true if an entry with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterates entry names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| &**k)
    }

    /// Iterates entries in name order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (&**k, v))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Renders every entry as one JSON object keyed by name.
    ///
    /// # Errors
    ///
    /// Returns `Conversion` if a value cannot be represented as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut out = serde_json::Map::new();
        for (name, value) in self.values() {
            let json = serde_json::to_value(value)
                .map_err(|e| Error::new(ErrorKind::Conversion(format!("entry `{name}`: {e}"))))?;
            out.insert(name.to_string(), json);
        }
        Ok(serde_json::Value::Object(out))
    }

    /// The node pool.
    #[must_use]
    pub fn pool(&self) -> &NodePool {
        &self.pool
    }

    pub(crate) fn pool_mut(&mut self) -> &mut NodePool {
        &mut self.pool
    }
}
