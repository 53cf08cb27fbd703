//! Cross-layer integration tests for Datagraft
//!
//! Tests that exercise the engine through realistic content: message
//! catalogs, effect presets, and generated documents.
