//! Datagraft - declarative, descriptor-driven deserialization
//!
//! This crate re-exports all layers of the Datagraft system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: datagraft_runtime    - Schema documents, file loader, CLI
//! Layer 1: datagraft_engine     - Descriptors, registry, environment, resolution
//! Layer 0: datagraft_foundation - Core types (Value, collections, Error)
//! ```

pub use datagraft_engine as engine;
pub use datagraft_foundation as foundation;
pub use datagraft_runtime as runtime;
