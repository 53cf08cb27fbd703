//! Core value type for deserialized data.

use std::fmt;
use std::sync::Arc;

use crate::collections::{GMap, GVec};
use crate::types::{DataKind, TypeTag};

/// A resolved value in the typed object graph.
///
/// Values are cheaply cloneable: strings, lists and objects are reference
/// counted and cloning a `Value` shares the underlying instance. Writes go
/// through copy-on-write ([`Value::object_mut`], [`Value::list_mut`]), so a
/// value reachable from more than one place is never changed behind the
/// other holder's back.
#[derive(Clone)]
pub enum Value {
    /// Absence of a value.
    Nil,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    String(Arc<str>),
    /// Sequence of values.
    List(Arc<List>),
    /// Untyped mapping copied verbatim from input data.
    Map(GMap<Arc<str>, Value>),
    /// Instance built by a descriptor.
    Object(Arc<Object>),
}

/// An instance built by a descriptor.
///
/// `tag` records which descriptor type produced it; `fields` holds values by
/// target key.
#[derive(Clone, PartialEq)]
pub struct Object {
    tag: TypeTag,
    fields: GMap<Arc<str>, Value>,
}

impl Object {
    /// Creates an empty object of the given type.
    #[must_use]
    pub fn new(tag: TypeTag) -> Self {
        Self {
            tag,
            fields: GMap::new(),
        }
    }

    /// Builder: sets a field.
    #[must_use]
    pub fn with(mut self, key: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        self.fields.set(key.into(), value.into());
        self
    }

    /// Returns the object's runtime type.
    #[must_use]
    pub fn tag(&self) -> &TypeTag {
        &self.tag
    }

    /// Gets a field value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns true if the field is set (even to nil).
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Returns true if the field holds a non-nil value.
    #[must_use]
    pub fn has_value(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_nil())
    }

    /// Sets a field, returning the previous value.
    pub fn set(&mut self, key: impl Into<Arc<str>>, value: Value) -> Option<Value> {
        self.fields.set(key.into(), value)
    }

    /// Removes a field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.take(key)
    }

    /// Returns the number of fields set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &Value)> {
        self.fields.iter()
    }

    /// Returns the underlying field map.
    #[must_use]
    pub fn fields(&self) -> &GMap<Arc<str>, Value> {
        &self.fields
    }
}

/// A sequence of values.
///
/// Lists built by an array descriptor carry its tag; lists copied verbatim
/// from input data carry none.
#[derive(Clone, PartialEq, Default)]
pub struct List {
    tag: Option<TypeTag>,
    items: GVec<Value>,
}

impl List {
    /// Creates an empty list of the given type.
    #[must_use]
    pub fn new(tag: Option<TypeTag>) -> Self {
        Self {
            tag,
            items: GVec::new(),
        }
    }

    /// Creates a list from items.
    #[must_use]
    pub fn from_items(tag: Option<TypeTag>, items: impl IntoIterator<Item = Value>) -> Self {
        Self {
            tag,
            items: items.into_iter().collect(),
        }
    }

    /// Returns the list's runtime type, if it has one.
    #[must_use]
    pub fn tag(&self) -> Option<&TypeTag> {
        self.tag.as_ref()
    }

    /// Gets an item by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Appends an item.
    pub fn push(&mut self, value: Value) {
        self.items.push(value);
    }

    /// Writes the slot at `index`, growing the list (padding with nil) as needed.
    pub fn assign(&mut self, index: usize, value: Value) {
        while self.items.len() < index {
            self.items.push(Value::Nil);
        }
        if index == self.items.len() {
            self.items.push(value);
        } else {
            self.items.set(index, value);
        }
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates the items.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.iter()
    }
}

impl Value {
    /// Wraps an object.
    #[must_use]
    pub fn object(object: Object) -> Self {
        Self::Object(Arc::new(object))
    }

    /// Wraps a list.
    #[must_use]
    pub fn list(list: List) -> Self {
        Self::List(Arc::new(list))
    }

    /// Returns the runtime type tag of this value.
    ///
    /// Only objects and descriptor-built lists have one; scalars and
    /// verbatim data are plain data.
    #[must_use]
    pub fn type_tag(&self) -> Option<&TypeTag> {
        match self {
            Self::Object(o) => Some(o.tag()),
            Self::List(l) => l.tag(),
            _ => None,
        }
    }

    /// Returns the data kind this value corresponds to.
    #[must_use]
    pub const fn data_kind(&self) -> DataKind {
        match self {
            Self::Nil => DataKind::Null,
            Self::Bool(_) => DataKind::Boolean,
            Self::Int(_) | Self::Float(_) => DataKind::Number,
            Self::String(_) => DataKind::String,
            Self::List(_) => DataKind::Sequence,
            Self::Map(_) | Self::Object(_) => DataKind::Mapping,
        }
    }

    /// Returns true if this value is nil.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Attempts to extract a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a float value.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a number as f64 (converts int to float).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a list reference.
    #[must_use]
    pub fn as_list(&self) -> Option<&List> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Attempts to extract a map reference.
    #[must_use]
    pub fn as_map(&self) -> Option<&GMap<Arc<str>, Value>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Attempts to extract an object reference.
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Copy-on-write access to an object.
    ///
    /// Clones the object first if the instance is shared.
    pub fn object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Self::Object(o) => Some(Arc::make_mut(o)),
            _ => None,
        }
    }

    /// Copy-on-write access to a list.
    pub fn list_mut(&mut self) -> Option<&mut List> {
        match self {
            Self::List(l) => Some(Arc::make_mut(l)),
            _ => None,
        }
    }

    /// Looks up a field on an object or untyped map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Object(o) => o.get(key),
            Self::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// Returns true if both values are the same shared instance.
    ///
    /// Only lists and objects have identity; everything else is compared
    /// as plain data and never counts as the same instance.
    #[must_use]
    pub fn same_instance(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Self::Object(x), Self::Object(y)) => Arc::ptr_eq(x, y),
            (Self::List(x), Self::List(y)) => Arc::ptr_eq(x, y),
            _ => false,
        }
    }
}

// Implement PartialEq manually to handle float comparison
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => Arc::ptr_eq(a, b) || a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::List(l) => write!(f, "{l:?}"),
            Self::Map(m) => write!(f, "{m:?}"),
            Self::Object(o) => write!(f, "{o:?}"),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.tag)?;
        f.debug_map().entries(self.fields.iter()).finish()
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            write!(f, "{tag} ")?;
        }
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::List(l) => {
                write!(f, "[")?;
                for (i, item) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(m) => write_fields(f, m.iter()),
            Self::Object(o) => {
                write!(f, "{} ", o.tag())?;
                write_fields(f, o.iter())
            }
        }
    }
}

fn write_fields<'a>(
    f: &mut fmt::Formatter<'_>,
    fields: impl Iterator<Item = (&'a Arc<str>, &'a Value)>,
) -> fmt::Result {
    write!(f, "{{")?;
    for (i, (k, v)) in fields.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{k}: {v}")?;
    }
    write!(f, "}}")
}

#[cfg(feature = "serde")]
mod serialize {
    use serde::ser::{SerializeMap, SerializeSeq};
    use serde::{Serialize, Serializer};

    use super::{List, Object, Value};

    impl Serialize for Value {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Self::Nil => serializer.serialize_unit(),
                Self::Bool(b) => serializer.serialize_bool(*b),
                Self::Int(n) => serializer.serialize_i64(*n),
                Self::Float(n) => serializer.serialize_f64(*n),
                Self::String(s) => serializer.serialize_str(s),
                Self::List(l) => l.serialize(serializer),
                Self::Map(m) => {
                    let mut map = serializer.serialize_map(Some(m.len()))?;
                    for (k, v) in m.iter() {
                        map.serialize_entry(&**k, v)?;
                    }
                    map.end()
                }
                Self::Object(o) => o.serialize(serializer),
            }
        }
    }

    impl Serialize for List {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(self.len()))?;
            for item in self.iter() {
                seq.serialize_element(item)?;
            }
            seq.end()
        }
    }

    impl Serialize for Object {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (k, v) in self.iter() {
                map.serialize_entry(&**k, v)?;
            }
            map.end()
        }
    }
}

// Convenience From implementations

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Self::String(s)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Self::object(o)
    }
}

impl From<List> for Value {
    fn from(l: List) -> Self {
        Self::list(l)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::list(List::from_items(None, v.into_iter().map(Into::into)))
    }
}
