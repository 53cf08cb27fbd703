//! Class descriptors.
//!
//! A descriptor knows how to build one kind of output value: how to make a
//! fresh instance, how to clone an existing one (for `$inherit`), and how to
//! fill an instance from input data. [`ObjectDescriptor`] is the general
//! field-by-field case; the other kinds live in their own modules.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use datagraft_foundation::{Error, Object, Result, TypeTag, Value};

use crate::data::DataView;
use crate::deserializer::Deserializer;
use crate::field::{FieldDescriptor, TypeRef, validate_fields};
use crate::node::NodeId;
use crate::registry::Registry;

/// Shared handle to a descriptor.
pub type DescriptorRef = Arc<dyn ClassDescriptor>;

/// The specialized kinds of descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    /// Builds an object field by field.
    Object,
    /// Accepts scalar (or otherwise allowed) data verbatim.
    Primitive,
    /// Builds a list from a sequence.
    Array,
    /// Placeholder that data must refine to a concrete type.
    Abstract,
    /// Copies arbitrary mapping keys onto an object.
    Dynamic,
    /// Drives a whole document.
    Root,
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Object => "object",
            Self::Primitive => "primitive",
            Self::Array => "array",
            Self::Abstract => "abstract",
            Self::Dynamic => "dynamic",
            Self::Root => "root",
        };
        f.write_str(name)
    }
}

/// Behavior shared by every descriptor kind.
pub trait ClassDescriptor: fmt::Debug + Send + Sync {
    /// Unique name within a registry; what `$type` refers to.
    fn name(&self) -> &str;

    /// Runtime type tag stamped on values this descriptor builds.
    ///
    /// Descriptors that produce plain data (primitives) have none.
    fn type_tag(&self) -> Option<&TypeTag>;

    /// Which specialized kind this is.
    fn kind(&self) -> DescriptorKind;

    /// Declared fields, in population order.
    fn fields(&self) -> &[FieldDescriptor] {
        &[]
    }

    /// Looks up a field by data key.
    fn field(&self, data_key: &str) -> Option<&FieldDescriptor> {
        self.fields().iter().find(|f| f.data_key() == data_key)
    }

    /// Every type this descriptor refers to.
    fn type_refs(&self) -> Vec<&TypeRef> {
        self.fields()
            .iter()
            .flat_map(|f| f.field_type().refs())
            .collect()
    }

    /// Checks the definition. Called on registration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDefinition` describing the first problem found.
    fn validate(&self) -> Result<()> {
        if self.name().is_empty() {
            return Err(Error::invalid_definition("descriptor name is empty"));
        }
        validate_fields(self.name(), self.fields())
    }

    /// Creates a fresh instance with defaults installed.
    ///
    /// # Errors
    ///
    /// Returns `Construction` for kinds that cannot be instantiated.
    fn new_empty(&self) -> Result<Value>;

    /// Creates a new instance copying `source`, deep-copying owned fields.
    ///
    /// # Errors
    ///
    /// Returns `Construction` if `source` is not something this descriptor
    /// can copy, or whatever cloning an owned field fails with.
    fn new_clone(&self, registry: &Registry, source: &Value) -> Result<Value>;

    /// Fills `node` from `data`.
    ///
    /// # Errors
    ///
    /// Format errors when the data does not fit, usage errors when the
    /// registry cannot satisfy the definition.
    fn populate(&self, de: &mut Deserializer<'_>, node: NodeId, data: DataView<'_>) -> Result<()>;
}

/// Returns true if both handles point at the same descriptor.
#[must_use]
pub fn same_descriptor(a: &DescriptorRef, b: &DescriptorRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Creates a fresh object with field defaults installed.
pub(crate) fn empty_object(tag: &TypeTag, fields: &[FieldDescriptor]) -> Value {
    let mut object = Object::new(tag.clone());
    for field in fields {
        if let Some(default) = field.default_value() {
            object.set(field.target_key_arc().clone(), default.clone());
        }
    }
    Value::object(object)
}

/// Copies the declared fields of `source` onto a fresh instance from `descriptor`.
pub(crate) fn clone_fields(
    descriptor: &dyn ClassDescriptor,
    registry: &Registry,
    source: &Value,
) -> Result<Value> {
    let original = source.as_object().ok_or_else(|| {
        Error::construction(
            descriptor.name(),
            format!("cannot clone {} as an object", source.data_kind()),
        )
    })?;
    let mut value = descriptor.new_empty()?;
    let Some(target) = value.object_mut() else {
        return Err(Error::internal(format!(
            "`{}` did not create an object",
            descriptor.name()
        )));
    };
    for field in descriptor.fields() {
        let Some(inherited) = original.get(field.target_key()) else {
            continue;
        };
        let copy = if field.is_owned() {
            registry.clone_value(inherited)?
        } else {
            inherited.clone()
        };
        target.set(field.target_key_arc().clone(), copy);
    }
    Ok(value)
}

/// Builds objects field by field from mappings.
pub struct ObjectDescriptor {
    name: Arc<str>,
    tag: TypeTag,
    fields: Vec<FieldDescriptor>,
    index: OnceLock<HashMap<Arc<str>, usize>>,
}

impl ObjectDescriptor {
    /// Creates a descriptor whose type tag equals its name.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        Self {
            tag: TypeTag::new(&*name),
            name,
            fields: Vec::new(),
            index: OnceLock::new(),
        }
    }

    /// Sets a type tag distinct from the name.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<TypeTag>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self.index = OnceLock::new();
        self
    }

    /// Adds several fields.
    #[must_use]
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.fields.extend(fields);
        self.index = OnceLock::new();
        self
    }

    /// Wraps the descriptor in a shared handle.
    #[must_use]
    pub fn into_ref(self) -> DescriptorRef {
        Arc::new(self)
    }
}

impl fmt::Debug for ObjectDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectDescriptor")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl ClassDescriptor for ObjectDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_tag(&self) -> Option<&TypeTag> {
        Some(&self.tag)
    }

    fn kind(&self) -> DescriptorKind {
        DescriptorKind::Object
    }

    fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    fn field(&self, data_key: &str) -> Option<&FieldDescriptor> {
        let index = self.index.get_or_init(|| {
            self.fields
                .iter()
                .enumerate()
                .map(|(i, f)| (Arc::from(f.data_key()), i))
                .collect()
        });
        index.get(data_key).map(|&i| &self.fields[i])
    }

    fn new_empty(&self) -> Result<Value> {
        Ok(empty_object(&self.tag, &self.fields))
    }

    fn new_clone(&self, registry: &Registry, source: &Value) -> Result<Value> {
        clone_fields(self, registry, source)
    }

    fn populate(&self, de: &mut Deserializer<'_>, node: NodeId, data: DataView<'_>) -> Result<()> {
        if !data.is_mapping() {
            return Err(Error::expected_mapping(self.name(), data.kind()));
        }
        de.initialize_default(node, self)?;
        de.populate_fields(node, &self.fields, data)
    }
}
