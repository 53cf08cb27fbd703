//! Type tags and data kinds.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifies the runtime type of a constructed value.
///
/// Every [`Object`](crate::Object) carries the tag of the descriptor that
/// built it, which is what reverse lookup (value → descriptor) keys on.
/// Tags are cheap to clone and compare by content.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TypeTag(Arc<str>);

impl TypeTag {
    /// Creates a tag from a name.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Returns the tag's name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TypeTag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeTag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TypeTag {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.0)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The loosely-typed kind of an input datum.
///
/// Input documents are schemaless trees; this is all the type information
/// a datum carries before a descriptor interprets it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DataKind {
    /// `null`.
    Null,
    /// `true` / `false`.
    Boolean,
    /// Any number.
    Number,
    /// A string.
    String,
    /// An ordered sequence.
    Sequence,
    /// A key-value mapping.
    Mapping,
}

impl DataKind {
    /// All kinds, in declaration order.
    pub const ALL: [DataKind; 6] = [
        Self::Null,
        Self::Boolean,
        Self::Number,
        Self::String,
        Self::Sequence,
        Self::Mapping,
    ];

    /// Returns the lowercase name used in schema documents and messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
        }
    }

    /// Parses a kind name. Accepts the aliases `bool`, `array` and `object`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Self::Null),
            "boolean" | "bool" => Some(Self::Boolean),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            "sequence" | "array" => Some(Self::Sequence),
            "mapping" | "object" => Some(Self::Mapping),
            _ => None,
        }
    }

    /// Returns true for kinds that hold no nested data.
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        !matches!(self, Self::Sequence | Self::Mapping)
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
