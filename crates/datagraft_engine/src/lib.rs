//! Descriptor registry, traversal pool, and resolution engine for Datagraft.
//!
//! This crate turns loosely-typed documents (`serde_json::Value` trees) into
//! typed object graphs:
//!
//! - [`descriptor`] - The [`ClassDescriptor`] trait and [`ObjectDescriptor`]
//! - [`field`] - Field definitions and their population contract
//! - [`primitive`], [`array`], [`abstract_type`], [`dynamic`], [`root`] - The other descriptor kinds
//! - [`registry`] - Name and type-tag indexes over descriptors
//! - [`node`] - Traversal nodes and their recycling pool
//! - [`environment`] - Named results that later documents can inherit from
//! - [`deserializer`] - The resolution engine and its entry points
//!
//! # Example
//!
//! ```
//! use datagraft_engine::{
//!     FieldDescriptor, ObjectDescriptor, PrimitiveDescriptor, Registry, deserialize,
//! };
//! use serde_json::json;
//!
//! let mut registry = Registry::new();
//! registry.register(PrimitiveDescriptor::string().into_ref())?;
//! registry.register(
//!     ObjectDescriptor::new("Message")
//!         .with_field(FieldDescriptor::required("text", "string"))
//!         .into_ref(),
//! )?;
//!
//! let env = deserialize(
//!     &registry,
//!     &json!([{"$name": "hello", "$type": "Message", "text": "hi"}]),
//! )?;
//! assert_eq!(
//!     env.get_value("hello").and_then(|m| m.get("text")).and_then(|t| t.as_str()),
//!     Some("hi")
//! );
//! # Ok::<(), datagraft_foundation::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod abstract_type;
pub mod array;
pub mod config;
pub mod data;
pub mod descriptor;
pub mod deserializer;
pub mod dynamic;
pub mod environment;
pub mod field;
pub mod node;
pub mod primitive;
pub mod registry;
pub mod root;

pub use abstract_type::AbstractDescriptor;
pub use array::ArrayDescriptor;
pub use config::{DeserializeConfig, EntryErrorPolicy};
pub use data::DataView;
pub use descriptor::{ClassDescriptor, DescriptorKind, DescriptorRef, ObjectDescriptor};
pub use deserializer::{
    DeserializeReport, Deserializer, SkippedEntry, deserialize, deserialize_into, deserialize_with,
};
pub use dynamic::DynamicDescriptor;
pub use environment::Environment;
pub use field::{FieldDescriptor, FieldType, TypeRef};
pub use node::{Node, NodeId, NodePool, Slot};
pub use primitive::PrimitiveDescriptor;
pub use registry::Registry;
pub use root::RootDescriptor;
