//! Descriptor registry.
//!
//! Holds every descriptor a deserialization may refer to, indexed by name
//! (for `$type` and named field types) and by type tag (for `$inherit`,
//! which needs the descriptor that built an existing value).

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use datagraft_foundation::{Error, ErrorKind, List, Result, TypeTag, Value};

use crate::descriptor::{DescriptorKind, DescriptorRef, same_descriptor};
use crate::field::TypeRef;

/// Registered descriptors plus lookup indexes.
///
/// Indexes are built lazily on first lookup and dropped on every mutation.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    descriptors: Vec<DescriptorRef>,
    default: Option<DescriptorRef>,
    by_name: OnceLock<HashMap<Arc<str>, usize>>,
    by_tag: OnceLock<HashMap<TypeTag, usize>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor.
    ///
    /// Registering the same descriptor twice is a no-op. Type tags must be
    /// unique, since a tag is how an existing value finds its descriptor.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateDescriptor` if a different descriptor with the same
    /// name is registered, or `InvalidDefinition` if the descriptor fails
    /// validation, is a document root, or stamps a tag another descriptor
    /// already uses.
    pub fn register(&mut self, descriptor: DescriptorRef) -> Result<()> {
        if let Some(existing) = self.lookup_by_name(descriptor.name()) {
            if same_descriptor(existing, &descriptor) {
                return Ok(());
            }
            return Err(Error::new(ErrorKind::DuplicateDescriptor(
                descriptor.name().to_string(),
            )));
        }
        if descriptor.kind() == DescriptorKind::Root {
            return Err(Error::invalid_definition(
                "the document root cannot be registered",
            ));
        }
        descriptor.validate()?;
        if let Some(tag) = descriptor.type_tag() {
            if let Some(existing) = self.lookup_by_tag(tag) {
                return Err(Error::invalid_definition(format!(
                    "`{}` uses type tag `{}`, already used by `{}`",
                    descriptor.name(),
                    tag.as_str(),
                    existing.name()
                )));
            }
        }

        self.descriptors.push(descriptor);
        self.invalidate();
        Ok(())
    }

    /// Registers several descriptors, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// See [`Registry::register`].
    pub fn register_all(&mut self, descriptors: impl IntoIterator<Item = DescriptorRef>) -> Result<()> {
        descriptors.into_iter().try_for_each(|d| self.register(d))
    }

    /// Looks up a descriptor by name.
    #[must_use]
    pub fn lookup_by_name(&self, name: &str) -> Option<&DescriptorRef> {
        let index = self.by_name.get_or_init(|| {
            self.descriptors
                .iter()
                .enumerate()
                .map(|(i, d)| (Arc::from(d.name()), i))
                .collect()
        });
        index.get(name).map(|&i| &self.descriptors[i])
    }

    /// Looks up a descriptor by the type tag it stamps on values.
    #[must_use]
    pub fn lookup_by_tag(&self, tag: &TypeTag) -> Option<&DescriptorRef> {
        let index = self.by_tag.get_or_init(|| {
            let mut index = HashMap::new();
            for (i, d) in self.descriptors.iter().enumerate() {
                if let Some(tag) = d.type_tag() {
                    index.entry(tag.clone()).or_insert(i);
                }
            }
            index
        });
        index.get(tag).map(|&i| &self.descriptors[i])
    }

    /// Looks up the descriptor that built `value`.
    ///
    /// Plain data (scalars, untyped lists and maps) has no descriptor.
    #[must_use]
    pub fn lookup_by_instance_type(&self, value: &Value) -> Option<&DescriptorRef> {
        value.type_tag().and_then(|tag| self.lookup_by_tag(tag))
    }

    /// Returns true if a descriptor with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lookup_by_name(name).is_some()
    }

    /// Sets the descriptor used for top-level entries that name no type,
    /// registering it if needed. `None` clears it.
    ///
    /// # Errors
    ///
    /// See [`Registry::register`].
    pub fn set_default_descriptor(&mut self, descriptor: Option<DescriptorRef>) -> Result<()> {
        if let Some(d) = &descriptor {
            self.register(d.clone())?;
        }
        self.default = descriptor;
        Ok(())
    }

    /// The descriptor used for untyped top-level entries.
    #[must_use]
    pub fn default_descriptor(&self) -> Option<&DescriptorRef> {
        self.default.as_ref()
    }

    /// Iterates descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &DescriptorRef> {
        self.descriptors.iter()
    }

    /// Number of registered descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Checks that every by-name type reference names a registered descriptor.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDefinition` naming the first dangling reference.
    pub fn check_references(&self) -> Result<()> {
        for descriptor in &self.descriptors {
            for reference in descriptor.type_refs() {
                if let TypeRef::Named(name) = reference {
                    if !self.contains(name) {
                        return Err(Error::invalid_definition(format!(
                            "`{}` refers to undeclared type `{name}`",
                            descriptor.name()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Produces an independent copy of `value`.
    ///
    /// Typed values are copied by the descriptor that built them, which
    /// decides field by field whether to share or deep-copy. Plain data is
    /// copied structurally.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if a typed value's descriptor is not registered,
    /// or `Construction` if that descriptor cannot produce instances.
    pub fn clone_value(&self, value: &Value) -> Result<Value> {
        let Some(tag) = value.type_tag() else {
            return self.clone_plain(value);
        };
        let descriptor = self
            .lookup_by_tag(tag)
            .ok_or_else(|| Error::new(ErrorKind::UnknownType(tag.to_string())))?;
        descriptor.new_clone(self, value)
    }

    fn clone_plain(&self, value: &Value) -> Result<Value> {
        match value {
            Value::List(list) => {
                let items = list
                    .iter()
                    .map(|item| self.clone_value(item))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::list(List::from_items(None, items)))
            }
            Value::Map(map) => {
                let copy = map
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), self.clone_value(v)?)))
                    .collect::<Result<_>>()?;
                Ok(Value::Map(copy))
            }
            other => Ok(other.clone()),
        }
    }

    fn invalidate(&mut self) {
        self.by_name = OnceLock::new();
        self.by_tag = OnceLock::new();
    }
}
