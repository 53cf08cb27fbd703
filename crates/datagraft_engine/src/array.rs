//! Array descriptors: sequences of a declared element type.

use std::sync::Arc;

use datagraft_foundation::{Error, List, Result, TypeTag, Value};

use crate::data::DataView;
use crate::descriptor::{ClassDescriptor, DescriptorKind, DescriptorRef};
use crate::deserializer::Deserializer;
use crate::field::{FieldType, TypeRef};
use crate::node::{NodeId, Slot};
use crate::registry::Registry;

/// Builds a list by resolving each element of a sequence.
///
/// Elements take the declared element type; `$type` on an element is only
/// honored when the element type is abstract or a variant.
#[derive(Debug)]
pub struct ArrayDescriptor {
    name: Arc<str>,
    tag: TypeTag,
    element: FieldType,
    owns_elements: bool,
}

impl ArrayDescriptor {
    /// Creates an array of `element`, named `<element>[]`.
    #[must_use]
    pub fn new(element: impl Into<TypeRef>) -> Self {
        let element = element.into();
        let name: Arc<str> = Arc::from(format!("{}[]", element.name()));
        Self {
            tag: TypeTag::new(name.clone()),
            name,
            element: FieldType::Single(element),
            owns_elements: false,
        }
    }

    /// Creates an array whose elements try each candidate in order.
    #[must_use]
    pub fn of_variant<T: Into<TypeRef>>(
        name: impl Into<Arc<str>>,
        candidates: impl IntoIterator<Item = T>,
    ) -> Self {
        let name = name.into();
        Self {
            tag: TypeTag::new(name.clone()),
            name,
            element: FieldType::Variant(candidates.into_iter().map(Into::into).collect()),
            owns_elements: false,
        }
    }

    /// Renames the descriptor (and its type tag).
    #[must_use]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self.tag = TypeTag::new(self.name.clone());
        self
    }

    /// Sets whether cloning deep-copies elements.
    #[must_use]
    pub fn with_owned_elements(mut self, owns: bool) -> Self {
        self.owns_elements = owns;
        self
    }

    /// The element type.
    #[must_use]
    pub fn element(&self) -> &FieldType {
        &self.element
    }

    /// True if cloning deep-copies elements.
    #[must_use]
    pub fn owns_elements(&self) -> bool {
        self.owns_elements
    }

    /// Wraps the descriptor in a shared handle.
    #[must_use]
    pub fn into_ref(self) -> DescriptorRef {
        Arc::new(self)
    }
}

impl ClassDescriptor for ArrayDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_tag(&self) -> Option<&TypeTag> {
        Some(&self.tag)
    }

    fn kind(&self) -> DescriptorKind {
        DescriptorKind::Array
    }

    fn type_refs(&self) -> Vec<&TypeRef> {
        self.element.refs().iter().collect()
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::invalid_definition("descriptor name is empty"));
        }
        match &self.element {
            FieldType::Variant(candidates) if candidates.is_empty() => Err(Error::invalid_definition(
                format!("array `{}` has no element candidates", self.name),
            )),
            _ => Ok(()),
        }
    }

    fn new_empty(&self) -> Result<Value> {
        Ok(Value::list(List::new(Some(self.tag.clone()))))
    }

    fn new_clone(&self, registry: &Registry, source: &Value) -> Result<Value> {
        let list = source.as_list().ok_or_else(|| {
            Error::construction(
                self.name(),
                format!("cannot clone {} as a list", source.data_kind()),
            )
        })?;
        let items = if self.owns_elements {
            list.iter()
                .map(|item| registry.clone_value(item))
                .collect::<Result<Vec<_>>>()?
        } else {
            list.iter().cloned().collect()
        };
        Ok(Value::list(List::from_items(Some(self.tag.clone()), items)))
    }

    fn populate(&self, de: &mut Deserializer<'_>, node: NodeId, data: DataView<'_>) -> Result<()> {
        let items = data
            .as_sequence()
            .ok_or_else(|| Error::expected_sequence(self.name(), data.kind()))?;
        de.initialize_default(node, self)?;

        for (index, item) in items.iter().enumerate() {
            let value = match &self.element {
                FieldType::Single(ty) => ty
                    .resolve(de.registry())
                    .and_then(|element| de.build_element(node, index, element, item)),
                FieldType::Variant(candidates) => {
                    de.build_variant(node, Slot::Index(index), &self.name, candidates, item)
                }
            }
            .map_err(|e| e.with_frame(format!("[{index}]")))?;
            de.write_back(node, Slot::Index(index), value)?;
        }
        Ok(())
    }
}
