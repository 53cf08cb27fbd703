//! The document root.
//!
//! A document is one of:
//!
//! - a sequence, each item a top-level entry
//! - a wrapper mapping with `$values` (a sequence of entries) or `$value`
//!   (a single entry), whose optional `$type` is the default type for the
//!   entries it holds
//! - any other mapping, taken as a single entry

use std::sync::{Arc, LazyLock};

use datagraft_foundation::{Error, ErrorKind, Result, TypeTag, Value};
use serde_json::Value as Json;

use crate::data::{DataView, TYPE_KEY, VALUE_KEY, VALUES_KEY, kind_of};
use crate::descriptor::{ClassDescriptor, DescriptorKind, DescriptorRef};
use crate::deserializer::Deserializer;
use crate::node::NodeId;
use crate::registry::Registry;

static ROOT: LazyLock<DescriptorRef> = LazyLock::new(|| Arc::new(RootDescriptor));

/// Drives a whole document, committing each entry to the environment.
#[derive(Debug)]
pub struct RootDescriptor;

impl RootDescriptor {
    /// The shared root descriptor.
    #[must_use]
    pub fn shared() -> DescriptorRef {
        ROOT.clone()
    }
}

impl ClassDescriptor for RootDescriptor {
    fn name(&self) -> &str {
        "root"
    }

    fn type_tag(&self) -> Option<&TypeTag> {
        None
    }

    fn kind(&self) -> DescriptorKind {
        DescriptorKind::Root
    }

    fn new_empty(&self) -> Result<Value> {
        Err(Error::construction(self.name(), "the document root is not a value"))
    }

    fn new_clone(&self, _registry: &Registry, _source: &Value) -> Result<Value> {
        Err(Error::construction(self.name(), "the document root is not a value"))
    }

    fn populate(&self, de: &mut Deserializer<'_>, node: NodeId, data: DataView<'_>) -> Result<()> {
        match data.raw() {
            Json::Array(items) => items.iter().try_for_each(|item| de.process_entry(node, item)),
            Json::Object(map) => match (map.get(VALUES_KEY), map.get(VALUE_KEY)) {
                (Some(_), Some(_)) => Err(Error::new(ErrorKind::MalformedWrapper)),
                (None, None) => de.process_entry(node, data.raw()),
                (values, single) => {
                    let default = match data.reserved(TYPE_KEY)? {
                        Some(name) => Some(de.registry().lookup_by_name(name).cloned().ok_or_else(
                            || Error::new(ErrorKind::UnknownTypeName(name.to_string())),
                        )?),
                        None => None,
                    };
                    de.with_wrapper_default(default, |de| match (values, single) {
                        (Some(values), _) => {
                            let items = values
                                .as_array()
                                .ok_or_else(|| Error::expected_sequence(VALUES_KEY, kind_of(values)))?;
                            items.iter().try_for_each(|item| de.process_entry(node, item))
                        }
                        (None, Some(single)) => de.process_entry(node, single),
                        (None, None) => Ok(()),
                    })
                }
            },
            other => Err(Error::new(ErrorKind::InvalidDocument(kind_of(other)))),
        }
    }
}
