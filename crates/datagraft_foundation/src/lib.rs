//! Core values, persistent collections, and errors for Datagraft.
//!
//! This crate provides:
//! - [`Value`] - The typed output model ([`Object`], [`List`], scalars)
//! - [`TypeTag`] / [`DataKind`] - Runtime type identity and input data kinds
//! - [`Error`] - Rich error types with context, split into format and usage errors
//! - Persistent collections ([`GVec`], [`GMap`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod error;
pub mod types;
pub mod value;

pub use collections::{GMap, GVec};
pub use error::{Error, ErrorContext, ErrorKind};
pub use types::{DataKind, TypeTag};
pub use value::{List, Object, Value};

/// Result type for Datagraft operations.
pub type Result<T> = std::result::Result<T, Error>;
