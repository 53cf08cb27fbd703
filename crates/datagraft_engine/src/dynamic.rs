//! Dynamic descriptors: every input key copied verbatim.

use std::sync::{Arc, LazyLock};

use datagraft_foundation::{Error, Object, Result, TypeTag, Value};

use crate::data::{DataView, to_value};
use crate::descriptor::{ClassDescriptor, DescriptorKind, DescriptorRef, clone_fields};
use crate::deserializer::Deserializer;
use crate::field::FieldDescriptor;
use crate::node::NodeId;
use crate::registry::Registry;

static UNKNOWN: LazyLock<DescriptorRef> = LazyLock::new(|| {
    Arc::new(DynamicDescriptor {
        name: Arc::from("Unknown"),
        tag: TypeTag::new("Unknown"),
        fields: Vec::new(),
        unknown: true,
    })
});

/// Copies every non-reserved key of a mapping onto an object.
///
/// Declared fields are not used for population; they only limit which keys
/// a clone copies. With no declared fields a clone copies everything.
#[derive(Debug)]
pub struct DynamicDescriptor {
    name: Arc<str>,
    tag: TypeTag,
    fields: Vec<FieldDescriptor>,
    unknown: bool,
}

impl DynamicDescriptor {
    /// Creates a dynamic descriptor.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        Self {
            tag: TypeTag::new(name.clone()),
            name,
            fields: Vec::new(),
            unknown: false,
        }
    }

    /// Declares keys that clones copy.
    #[must_use]
    pub fn with_keys<K: Into<Arc<str>>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.fields
            .extend(keys.into_iter().map(|k| FieldDescriptor::untyped(k).with_required(false)));
        self
    }

    /// Marker type for fields declared without a type.
    ///
    /// It cannot produce instances, so untyped data must name its own type.
    #[must_use]
    pub fn unknown() -> DescriptorRef {
        UNKNOWN.clone()
    }

    /// True for the untyped-field marker.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.unknown
    }

    /// Wraps the descriptor in a shared handle.
    #[must_use]
    pub fn into_ref(self) -> DescriptorRef {
        Arc::new(self)
    }
}

impl ClassDescriptor for DynamicDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_tag(&self) -> Option<&TypeTag> {
        Some(&self.tag)
    }

    fn kind(&self) -> DescriptorKind {
        DescriptorKind::Dynamic
    }

    fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    fn new_empty(&self) -> Result<Value> {
        if self.unknown {
            return Err(Error::construction(
                self.name(),
                "no concrete type was declared for this value",
            ));
        }
        Ok(Value::object(Object::new(self.tag.clone())))
    }

    fn new_clone(&self, registry: &Registry, source: &Value) -> Result<Value> {
        if !self.fields.is_empty() {
            return clone_fields(self, registry, source);
        }
        let original = source.as_object().ok_or_else(|| {
            Error::construction(
                self.name(),
                format!("cannot clone {} as an object", source.data_kind()),
            )
        })?;
        let mut copy = Object::new(self.tag.clone());
        for (key, value) in original.iter() {
            copy.set(key.clone(), value.clone());
        }
        Ok(Value::object(copy))
    }

    fn populate(&self, de: &mut Deserializer<'_>, node: NodeId, data: DataView<'_>) -> Result<()> {
        de.initialize_default(node, self)?;
        if !data.is_mapping() {
            return Err(Error::expected_mapping(self.name(), data.kind()));
        }
        let object = de.node_object_mut(node)?;
        for (key, value) in data.entries() {
            object.set(key, to_value(value));
        }
        Ok(())
    }
}
