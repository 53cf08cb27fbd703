//! Primitive descriptors: data taken verbatim, gated by data kind.

use std::sync::Arc;

use datagraft_foundation::{DataKind, Error, Result, TypeTag, Value};

use crate::data::DataView;
use crate::descriptor::{ClassDescriptor, DescriptorKind, DescriptorRef};
use crate::deserializer::Deserializer;
use crate::node::NodeId;
use crate::registry::Registry;

/// Accepts data of the allowed kinds and stores it as is.
#[derive(Debug)]
pub struct PrimitiveDescriptor {
    name: Arc<str>,
    accepts: Vec<DataKind>,
}

impl PrimitiveDescriptor {
    /// Creates a primitive accepting the given kinds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDefinition` if `accepts` is empty.
    pub fn new(name: impl Into<Arc<str>>, accepts: impl IntoIterator<Item = DataKind>) -> Result<Self> {
        let name = name.into();
        let mut kinds: Vec<DataKind> = Vec::new();
        for kind in accepts {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        if kinds.is_empty() {
            return Err(Error::invalid_definition(format!(
                "primitive `{name}` accepts no data kinds"
            )));
        }
        Ok(Self {
            name,
            accepts: kinds,
        })
    }

    fn single(name: &str, kind: DataKind) -> Self {
        Self {
            name: Arc::from(name),
            accepts: vec![kind],
        }
    }

    /// `string`: accepts strings.
    #[must_use]
    pub fn string() -> Self {
        Self::single("string", DataKind::String)
    }

    /// `number`: accepts numbers.
    #[must_use]
    pub fn number() -> Self {
        Self::single("number", DataKind::Number)
    }

    /// `boolean`: accepts booleans.
    #[must_use]
    pub fn boolean() -> Self {
        Self::single("boolean", DataKind::Boolean)
    }

    /// The accepted kinds.
    #[must_use]
    pub fn accepts(&self) -> &[DataKind] {
        &self.accepts
    }

    /// Returns true if data of `kind` is accepted.
    #[must_use]
    pub fn accepts_kind(&self, kind: DataKind) -> bool {
        self.accepts.contains(&kind)
    }

    /// Wraps the descriptor in a shared handle.
    #[must_use]
    pub fn into_ref(self) -> DescriptorRef {
        Arc::new(self)
    }
}

impl ClassDescriptor for PrimitiveDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_tag(&self) -> Option<&TypeTag> {
        None
    }

    fn kind(&self) -> DescriptorKind {
        DescriptorKind::Primitive
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::invalid_definition("descriptor name is empty"));
        }
        if self.accepts.is_empty() {
            return Err(Error::invalid_definition(format!(
                "primitive `{}` accepts no data kinds",
                self.name
            )));
        }
        Ok(())
    }

    fn new_empty(&self) -> Result<Value> {
        Err(Error::construction(
            self.name(),
            "primitive values come from data, not construction",
        ))
    }

    fn new_clone(&self, registry: &Registry, source: &Value) -> Result<Value> {
        registry.clone_value(source)
    }

    fn populate(&self, de: &mut Deserializer<'_>, node: NodeId, data: DataView<'_>) -> Result<()> {
        let kind = data.kind();
        if !self.accepts_kind(kind) {
            return Err(Error::kind_mismatch(self.name(), &self.accepts, kind));
        }
        de.set_node_value(node, data.to_value())
    }
}
