//! Configuration for loading documents.

use datagraft_engine::{DeserializeConfig, EntryErrorPolicy};

/// Configuration for a [`Loader`](crate::Loader).
///
/// Wraps the engine's per-call settings, which apply to every document the
/// loader reads, plus output preferences.
#[derive(Clone, Debug)]
pub struct LoaderConfig {
    /// Settings passed to every deserialize call.
    pub deserialize: DeserializeConfig,

    /// Render JSON output indented (true) or on one line (false).
    pub pretty_output: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            deserialize: DeserializeConfig::default(),
            pretty_output: true,
        }
    }
}

impl LoaderConfig {
    /// Creates a configuration that skips invalid entries instead of aborting.
    #[must_use]
    pub fn lenient() -> Self {
        Self::default().with_skip_invalid(true)
    }

    /// Builder method to replace the engine settings.
    #[must_use]
    pub fn with_deserialize_config(mut self, config: DeserializeConfig) -> Self {
        self.deserialize = config;
        self
    }

    /// Builder method to set the entry error policy.
    #[must_use]
    pub fn with_skip_invalid(mut self, skip: bool) -> Self {
        self.deserialize.entry_errors = if skip {
            EntryErrorPolicy::Skip
        } else {
            EntryErrorPolicy::Abort
        };
        self
    }

    /// Builder method to set the nesting limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.deserialize.max_depth = max_depth;
        self
    }

    /// Builder method to set output formatting.
    #[must_use]
    pub fn with_pretty_output(mut self, pretty: bool) -> Self {
        self.pretty_output = pretty;
        self
    }
}
