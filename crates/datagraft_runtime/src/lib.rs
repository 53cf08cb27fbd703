//! Schema documents, file loading, and the CLI for Datagraft.
//!
//! This crate provides:
//! - [`SchemaDocument`] - Registries declared as JSON
//! - [`Loader`] - Reads documents into one accumulating environment
//! - [`LoaderConfig`] - Per-loader settings

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod loader;
pub mod schema;

pub use config::LoaderConfig;
pub use loader::Loader;
pub use schema::{FieldSchema, SchemaDocument, TypeSchema};
