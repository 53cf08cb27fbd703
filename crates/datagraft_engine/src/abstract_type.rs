//! Abstract descriptors.

use std::sync::Arc;

use datagraft_foundation::{Error, Result, TypeTag, Value};

use crate::data::DataView;
use crate::descriptor::{ClassDescriptor, DescriptorKind, DescriptorRef};
use crate::deserializer::Deserializer;
use crate::node::NodeId;
use crate::registry::Registry;

/// A declared type that data must refine through `$type` or `$inherit`.
///
/// Reaching population with an abstract descriptor means the data named
/// no concrete type.
#[derive(Debug)]
pub struct AbstractDescriptor {
    name: Arc<str>,
    tag: TypeTag,
}

impl AbstractDescriptor {
    /// Creates an abstract descriptor.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        Self {
            tag: TypeTag::new(name.clone()),
            name,
        }
    }

    /// Wraps the descriptor in a shared handle.
    #[must_use]
    pub fn into_ref(self) -> DescriptorRef {
        Arc::new(self)
    }
}

impl ClassDescriptor for AbstractDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_tag(&self) -> Option<&TypeTag> {
        Some(&self.tag)
    }

    fn kind(&self) -> DescriptorKind {
        DescriptorKind::Abstract
    }

    fn new_empty(&self) -> Result<Value> {
        Err(Error::construction(self.name(), "abstract types have no instances"))
    }

    fn new_clone(&self, _registry: &Registry, _source: &Value) -> Result<Value> {
        Err(Error::construction(self.name(), "abstract types have no instances"))
    }

    fn populate(&self, _de: &mut Deserializer<'_>, _node: NodeId, _data: DataView<'_>) -> Result<()> {
        Err(Error::abstract_type(self.name()))
    }
}
