//! Registries declared as data.
//!
//! A schema document lists descriptor definitions in JSON:
//!
//! ```json
//! {
//!   "types": [
//!     {"kind": "object", "name": "Message", "fields": [
//!       {"key": "text", "type": "string"},
//!       {"key": "wgt", "type": "number", "required": false, "default": 1}
//!     ]},
//!     {"kind": "array", "name": "Messages", "element": "Message"}
//!   ],
//!   "default": "Message"
//! }
//! ```
//!
//! Types refer to each other by name, so declaration order does not matter.
//! The primitives `string`, `number` and `boolean` are available unless the
//! document declares types with those names.

use std::collections::HashSet;

use datagraft_engine::data::to_value;
use datagraft_engine::{
    AbstractDescriptor, ArrayDescriptor, DescriptorRef, DynamicDescriptor, FieldDescriptor,
    ObjectDescriptor, PrimitiveDescriptor, Registry, TypeRef,
};
use datagraft_foundation::{DataKind, Error, ErrorKind, Result};
use serde::{Deserialize, Serialize};

/// A registry definition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    /// Descriptor definitions.
    #[serde(default)]
    pub types: Vec<TypeSchema>,
    /// Name of the default descriptor for untyped top-level entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// One descriptor definition, discriminated by `kind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeSchema {
    /// An object built field by field.
    Object {
        /// Descriptor name.
        name: String,
        /// Type tag, if different from the name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag: Option<String>,
        /// Field definitions.
        #[serde(default)]
        fields: Vec<FieldSchema>,
    },
    /// Data accepted verbatim.
    Primitive {
        /// Descriptor name.
        name: String,
        /// Accepted data kinds (`null`, `boolean`, `number`, `string`,
        /// `sequence`, `mapping`).
        accepts: Vec<String>,
    },
    /// A sequence of one element type (or a variant).
    Array {
        /// Descriptor name.
        name: String,
        /// Element type.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        element: Option<String>,
        /// Element candidates, tried in order.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant: Option<Vec<String>>,
        /// Deep-copy elements when cloned.
        #[serde(default)]
        owns_elements: bool,
    },
    /// A placeholder data must refine.
    Abstract {
        /// Descriptor name.
        name: String,
    },
    /// Every key copied verbatim.
    Dynamic {
        /// Descriptor name.
        name: String,
        /// Keys copied by clones (all keys when empty).
        #[serde(default)]
        keys: Vec<String>,
    },
}

impl TypeSchema {
    /// The declared descriptor name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Object { name, .. }
            | Self::Primitive { name, .. }
            | Self::Array { name, .. }
            | Self::Abstract { name }
            | Self::Dynamic { name, .. } => name,
        }
    }
}

/// A field of an object definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSchema {
    /// Key read from the data.
    pub key: String,
    /// Key written on the object (defaults to `key`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Declared type. Absent with no `variant` means the data names its own.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    /// Candidate types, tried in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Vec<String>>,
    /// Deep-copy this field when the object is inherited.
    #[serde(default)]
    pub owned: bool,
    /// Absence is an error unless inherited or defaulted.
    #[serde(default = "default_required")]
    pub required: bool,
    /// Value installed on fresh objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

fn default_required() -> bool {
    true
}

impl SchemaDocument {
    /// Parses a schema document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `Parse` if the text is not a valid schema document.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::new(ErrorKind::Parse(e.to_string())))
    }

    /// Reads a schema document from parsed JSON.
    ///
    /// # Errors
    ///
    /// Returns `Parse` if the value is not a valid schema document.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::new(ErrorKind::Parse(e.to_string())))
    }

    /// Builds a registry holding every declared type.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDefinition` for malformed definitions or references to
    /// undeclared types, and `DuplicateDescriptor` for repeated names.
    pub fn build_registry(&self) -> Result<Registry> {
        let mut registry = Registry::new();

        let declared: HashSet<&str> = self.types.iter().map(TypeSchema::name).collect();
        for (name, builtin) in [
            ("string", PrimitiveDescriptor::string as fn() -> PrimitiveDescriptor),
            ("number", PrimitiveDescriptor::number),
            ("boolean", PrimitiveDescriptor::boolean),
        ] {
            if !declared.contains(name) {
                registry.register(builtin().into_ref())?;
            }
        }

        for ty in &self.types {
            registry.register(build_type(ty)?)?;
        }

        registry.check_references()?;

        if let Some(name) = &self.default {
            let default = registry.lookup_by_name(name).cloned().ok_or_else(|| {
                Error::invalid_definition(format!("default type `{name}` is not declared"))
            })?;
            registry.set_default_descriptor(Some(default))?;
        }

        log::debug!("built registry with {} descriptors", registry.len());
        Ok(registry)
    }
}

fn build_type(ty: &TypeSchema) -> Result<DescriptorRef> {
    let descriptor = match ty {
        TypeSchema::Object { name, tag, fields } => {
            let mut object = ObjectDescriptor::new(name.as_str());
            if let Some(tag) = tag {
                object = object.with_tag(tag.as_str());
            }
            let fields = fields
                .iter()
                .map(|f| build_field(name, f))
                .collect::<Result<Vec<_>>>()?;
            object.with_fields(fields).into_ref()
        }
        TypeSchema::Primitive { name, accepts } => {
            let kinds = accepts
                .iter()
                .map(|k| {
                    DataKind::from_name(k).ok_or_else(|| {
                        Error::invalid_definition(format!(
                            "primitive `{name}`: unknown data kind `{k}`"
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            PrimitiveDescriptor::new(name.as_str(), kinds)?.into_ref()
        }
        TypeSchema::Array {
            name,
            element,
            variant,
            owns_elements,
        } => {
            let array = match (element, variant) {
                (Some(element), None) => {
                    ArrayDescriptor::new(TypeRef::named(element.as_str())).with_name(name.as_str())
                }
                (None, Some(candidates)) => ArrayDescriptor::of_variant(
                    name.as_str(),
                    candidates.iter().map(|c| TypeRef::named(c.as_str())),
                ),
                _ => {
                    return Err(Error::invalid_definition(format!(
                        "array `{name}` needs exactly one of `element` or `variant`"
                    )));
                }
            };
            array.with_owned_elements(*owns_elements).into_ref()
        }
        TypeSchema::Abstract { name } => AbstractDescriptor::new(name.as_str()).into_ref(),
        TypeSchema::Dynamic { name, keys } => DynamicDescriptor::new(name.as_str())
            .with_keys(keys.iter().map(String::as_str))
            .into_ref(),
    };
    Ok(descriptor)
}

fn build_field(owner: &str, field: &FieldSchema) -> Result<FieldDescriptor> {
    let built = match (&field.ty, &field.variant) {
        (Some(ty), None) => FieldDescriptor::required(field.key.as_str(), TypeRef::named(ty.as_str())),
        (None, Some(candidates)) => FieldDescriptor::variant(
            field.key.as_str(),
            candidates.iter().map(|c| TypeRef::named(c.as_str())),
        ),
        (None, None) => FieldDescriptor::untyped(field.key.as_str()),
        (Some(_), Some(_)) => {
            return Err(Error::invalid_definition(format!(
                "`{owner}`: field `{}` declares both `type` and `variant`",
                field.key
            )));
        }
    };
    let mut built = built
        .with_owned(field.owned)
        .with_required(field.required);
    if let Some(target) = &field.target {
        built = built.with_target(target.as_str());
    }
    if let Some(default) = &field.default {
        built = built.with_default(to_value(default));
    }
    Ok(built)
}
