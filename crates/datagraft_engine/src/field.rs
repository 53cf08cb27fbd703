//! Field definitions.
//!
//! A field binds a key in the input mapping to a key on the output object,
//! and declares what type (or set of candidate types) its data resolves to.

use std::collections::HashSet;
use std::sync::Arc;

use datagraft_foundation::{Error, ErrorKind, Result, Value};

use crate::data::{DataView, is_reserved};
use crate::descriptor::DescriptorRef;
use crate::deserializer::Deserializer;
use crate::dynamic::DynamicDescriptor;
use crate::node::{NodeId, Slot};
use crate::registry::Registry;

/// A reference to a descriptor, either held directly or looked up by name.
///
/// Named references let descriptors refer to each other (and to themselves)
/// without building reference cycles; they are resolved against the registry
/// each time a node is built.
#[derive(Clone, Debug)]
pub enum TypeRef {
    /// A descriptor held directly.
    Descriptor(DescriptorRef),
    /// A descriptor registered under this name.
    Named(Arc<str>),
}

impl TypeRef {
    /// Creates a by-name reference.
    #[must_use]
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self::Named(name.into())
    }

    /// Returns the referenced descriptor's name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Descriptor(d) => d.name(),
            Self::Named(n) => n,
        }
    }

    /// Resolves the reference.
    ///
    /// # Errors
    ///
    /// Returns `TypeResolution` if a named descriptor is not registered.
    pub fn resolve(&self, registry: &Registry) -> Result<DescriptorRef> {
        match self {
            Self::Descriptor(d) => Ok(d.clone()),
            Self::Named(n) => registry.lookup_by_name(n).cloned().ok_or_else(|| {
                Error::new(ErrorKind::TypeResolution(format!(
                    "descriptor `{n}` is not registered"
                )))
            }),
        }
    }
}

impl From<DescriptorRef> for TypeRef {
    fn from(descriptor: DescriptorRef) -> Self {
        Self::Descriptor(descriptor)
    }
}

impl From<&DescriptorRef> for TypeRef {
    fn from(descriptor: &DescriptorRef) -> Self {
        Self::Descriptor(descriptor.clone())
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

/// What a field's data resolves to.
#[derive(Clone, Debug)]
pub enum FieldType {
    /// A single declared type.
    Single(TypeRef),
    /// Candidates tried in order; the first that accepts the data wins.
    Variant(Vec<TypeRef>),
}

impl FieldType {
    /// Returns true for variant fields.
    #[must_use]
    pub fn is_variant(&self) -> bool {
        matches!(self, Self::Variant(_))
    }

    /// The referenced types, in declaration order.
    #[must_use]
    pub fn refs(&self) -> &[TypeRef] {
        match self {
            Self::Single(t) => std::slice::from_ref(t),
            Self::Variant(ts) => ts,
        }
    }

    /// Human-readable type name (`A | B` for variants).
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Single(t) => t.name().to_string(),
            Self::Variant(ts) => ts.iter().map(TypeRef::name).collect::<Vec<_>>().join(" | "),
        }
    }
}

/// Definition of one field of an object descriptor.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    data_key: Arc<str>,
    target_key: Arc<str>,
    ty: FieldType,
    owned: bool,
    required: bool,
    default: Option<Value>,
}

impl FieldDescriptor {
    fn with_type(data_key: impl Into<Arc<str>>, ty: FieldType) -> Self {
        let data_key = data_key.into();
        Self {
            target_key: data_key.clone(),
            data_key,
            ty,
            owned: false,
            required: true,
            default: None,
        }
    }

    /// Creates a required field with no default.
    #[must_use]
    pub fn required(data_key: impl Into<Arc<str>>, ty: impl Into<TypeRef>) -> Self {
        Self::with_type(data_key, FieldType::Single(ty.into()))
    }

    /// Creates an optional field with a default value.
    #[must_use]
    pub fn optional(data_key: impl Into<Arc<str>>, ty: impl Into<TypeRef>, default: impl Into<Value>) -> Self {
        Self::required(data_key, ty)
            .with_required(false)
            .with_default(default)
    }

    /// Creates an optional field with no default (left unset when absent).
    #[must_use]
    pub fn optional_nil(data_key: impl Into<Arc<str>>, ty: impl Into<TypeRef>) -> Self {
        Self::required(data_key, ty).with_required(false)
    }

    /// Creates a required variant field.
    #[must_use]
    pub fn variant<T: Into<TypeRef>>(
        data_key: impl Into<Arc<str>>,
        candidates: impl IntoIterator<Item = T>,
    ) -> Self {
        Self::with_type(
            data_key,
            FieldType::Variant(candidates.into_iter().map(Into::into).collect()),
        )
    }

    /// Creates a required field with no declared type.
    ///
    /// Its data must name a concrete type itself (`$type` or `$inherit`).
    #[must_use]
    pub fn untyped(data_key: impl Into<Arc<str>>) -> Self {
        Self::required(data_key, DynamicDescriptor::unknown())
    }

    /// Sets the key written on the output object.
    #[must_use]
    pub fn with_target(mut self, target_key: impl Into<Arc<str>>) -> Self {
        self.target_key = target_key.into();
        self
    }

    /// Sets whether inherited values of this field are deep-copied.
    #[must_use]
    pub fn with_owned(mut self, owned: bool) -> Self {
        self.owned = owned;
        self
    }

    /// Sets whether absence is an error.
    #[must_use]
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the value installed on fresh objects.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Key read from the input mapping.
    #[must_use]
    pub fn data_key(&self) -> &str {
        &self.data_key
    }

    /// Key written on the output object.
    #[must_use]
    pub fn target_key(&self) -> &str {
        &self.target_key
    }

    /// Declared type.
    #[must_use]
    pub fn field_type(&self) -> &FieldType {
        &self.ty
    }

    /// True if inherited values are deep-copied.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// True if absence (with nothing inherited or defaulted) is an error.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Value installed on fresh objects.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub(crate) fn target_key_arc(&self) -> &Arc<str> {
        &self.target_key
    }

    /// Fills this field of `node` from `data`.
    ///
    /// An absent key is fine when the node already holds a non-nil value for
    /// the field (inherited or defaulted) or when the field is optional.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for an absent required field, or whatever
    /// building the child value fails with, framed by this field's data key.
    pub fn populate(&self, de: &mut Deserializer<'_>, node: NodeId, data: DataView<'_>) -> Result<()> {
        let Some(sub) = data.get(&self.data_key) else {
            let present = de
                .node_value(node)
                .and_then(|v| v.get(&self.target_key))
                .is_some_and(|v| !v.is_nil());
            if present || !self.required {
                return Ok(());
            }
            return Err(Error::missing_field(self.data_key()));
        };

        let slot = Slot::Field(self.target_key.clone());
        let value = match &self.ty {
            FieldType::Single(ty) => ty
                .resolve(de.registry())
                .and_then(|d| de.build_child(node, slot.clone(), Some(d), sub)),
            FieldType::Variant(candidates) => {
                de.build_variant(node, slot.clone(), &self.data_key, candidates, sub)
            }
        }
        .map_err(|e| e.with_frame(self.data_key()))?;

        de.write_back(node, slot, value)
    }
}

/// Checks a field list for an owning descriptor.
///
/// Data keys must be non-empty, unreserved, and unique; target keys must be
/// unique; variants need at least one candidate.
pub(crate) fn validate_fields(owner: &str, fields: &[FieldDescriptor]) -> Result<()> {
    let mut data_keys = HashSet::new();
    let mut target_keys = HashSet::new();
    for field in fields {
        if field.data_key.is_empty() {
            return Err(Error::invalid_definition(format!(
                "`{owner}` has a field with an empty data key"
            )));
        }
        if field.data_key.starts_with('$') || is_reserved(&field.data_key) {
            return Err(Error::invalid_definition(format!(
                "`{owner}`: data key `{}` is reserved",
                field.data_key
            )));
        }
        if !data_keys.insert(field.data_key.clone()) {
            return Err(Error::invalid_definition(format!(
                "`{owner}` declares data key `{}` twice",
                field.data_key
            )));
        }
        if !target_keys.insert(field.target_key.clone()) {
            return Err(Error::invalid_definition(format!(
                "`{owner}` declares target key `{}` twice",
                field.target_key
            )));
        }
        if let FieldType::Variant(candidates) = &field.ty {
            if candidates.is_empty() {
                return Err(Error::invalid_definition(format!(
                    "`{owner}`: variant field `{}` has no candidates",
                    field.data_key
                )));
            }
        }
    }
    Ok(())
}
