//! Loading documents into one accumulating environment.
//!
//! A [`Loader`] is how content is usually read: one registry, many
//! documents. Every document lands in the same environment, so a later
//! document can `$inherit` from entries of an earlier one.

use std::fs;
use std::path::Path;

use datagraft_engine::{DeserializeReport, Environment, Registry, SkippedEntry, deserialize_with};
use datagraft_foundation::{Error, ErrorKind, Result};
use serde_json::Value as Json;

use crate::config::LoaderConfig;
use crate::schema::SchemaDocument;

/// Reads documents against a registry into a shared environment.
#[derive(Debug)]
pub struct Loader {
    registry: Registry,
    env: Environment,
    config: LoaderConfig,
    documents: usize,
}

impl Loader {
    /// Creates a loader with the default configuration.
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self::with_config(registry, LoaderConfig::default())
    }

    /// Creates a loader with an explicit configuration.
    #[must_use]
    pub fn with_config(registry: Registry, config: LoaderConfig) -> Self {
        Self {
            registry,
            env: Environment::new(),
            config,
            documents: 0,
        }
    }

    /// Creates a loader whose registry is read from a schema file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `Parse` if it is not a schema
    /// document, or whatever building the registry fails with.
    pub fn from_schema_file(path: impl AsRef<Path>, config: LoaderConfig) -> Result<Self> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let text = read(path)?;
        let registry = SchemaDocument::from_json(&text)
            .and_then(|schema| schema.build_registry())
            .map_err(|e| e.with_source(&source))?;
        Ok(Self::with_config(registry, config))
    }

    /// The registry documents are read against.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Entries loaded so far.
    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Consumes the loader, returning the loaded entries.
    #[must_use]
    pub fn into_environment(self) -> Environment {
        self.env
    }

    /// The loader's configuration.
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Number of documents loaded successfully.
    #[must_use]
    pub fn documents_loaded(&self) -> usize {
        self.documents
    }

    /// Loads an already-parsed document. `source` labels errors.
    ///
    /// # Errors
    ///
    /// Whatever deserialization fails with, tagged with `source`. Entries
    /// committed before the failure stay in the environment.
    pub fn load_value(&mut self, source: &str, data: &Json) -> Result<DeserializeReport> {
        log::debug!("loading document {source}");
        let mut report = deserialize_with(&mut self.env, &self.registry, data, &self.config.deserialize)
            .map_err(|e| e.with_source(source))?;
        report.skipped = report
            .skipped
            .into_iter()
            .map(|skipped| SkippedEntry {
                error: skipped.error.with_source(source),
                ..skipped
            })
            .collect();
        self.documents += 1;
        Ok(report)
    }

    /// Parses and loads JSON text. `source` labels errors.
    ///
    /// # Errors
    ///
    /// `Parse` if the text is not JSON, otherwise see [`Loader::load_value`].
    pub fn load_str(&mut self, source: &str, text: &str) -> Result<DeserializeReport> {
        let data: Json = serde_json::from_str(text)
            .map_err(|e| Error::new(ErrorKind::Parse(e.to_string())).with_source(source))?;
        self.load_value(source, &data)
    }

    /// Reads, parses, and loads a JSON file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, otherwise see [`Loader::load_str`].
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<DeserializeReport> {
        let path = path.as_ref();
        let text = read(path)?;
        self.load_str(&path.display().to_string(), &text)
    }

    /// Renders the environment, or one entry of it, as JSON text.
    ///
    /// Returns `None` if `entry` names nothing loaded.
    ///
    /// # Errors
    ///
    /// `Conversion` if a value cannot be represented as JSON.
    pub fn render(&self, entry: Option<&str>) -> Result<Option<String>> {
        let json = match entry {
            Some(name) => match self.env.get_value(name) {
                Some(value) => serde_json::to_value(value)
                    .map_err(|e| Error::new(ErrorKind::Conversion(format!("entry `{name}`: {e}"))))?,
                None => return Ok(None),
            },
            None => self.env.to_json()?,
        };
        let text = if self.config.pretty_output {
            serde_json::to_string_pretty(&json)
        } else {
            serde_json::to_string(&json)
        }
        .map_err(|e| Error::new(ErrorKind::Conversion(e.to_string())))?;
        Ok(Some(text))
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        Error::new(ErrorKind::Io(e.to_string())).with_source(path.display().to_string())
    })
}
