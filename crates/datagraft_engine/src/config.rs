//! Per-call deserialization settings.

use crate::descriptor::DescriptorRef;

/// What to do when a top-level entry fails with a format error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EntryErrorPolicy {
    /// Stop and return the error.
    #[default]
    Abort,
    /// Record the error in the report and continue with the next entry.
    Skip,
}

/// Settings for one deserialize call.
#[derive(Clone, Debug)]
pub struct DeserializeConfig {
    /// Maximum nesting depth of nodes below the root.
    pub max_depth: usize,
    /// Default descriptor for untyped top-level entries; overrides the
    /// registry's default.
    pub default_descriptor: Option<DescriptorRef>,
    /// Handling of failing top-level entries.
    pub entry_errors: EntryErrorPolicy,
    /// Allocated pool nodes kept after the call.
    pub pool_retain: usize,
}

impl Default for DeserializeConfig {
    fn default() -> Self {
        Self {
            max_depth: 128,
            default_descriptor: None,
            entry_errors: EntryErrorPolicy::Abort,
            pool_retain: 64,
        }
    }
}

impl DeserializeConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the default descriptor for untyped top-level entries.
    #[must_use]
    pub fn with_default_descriptor(mut self, descriptor: DescriptorRef) -> Self {
        self.default_descriptor = Some(descriptor);
        self
    }

    /// Sets the entry error policy.
    #[must_use]
    pub fn with_entry_errors(mut self, policy: EntryErrorPolicy) -> Self {
        self.entry_errors = policy;
        self
    }

    /// Sets how many pool nodes to keep allocated after the call.
    #[must_use]
    pub fn with_pool_retain(mut self, retain: usize) -> Self {
        self.pool_retain = retain;
        self
    }

    /// Skip entries with format errors instead of aborting.
    #[must_use]
    pub fn skip_invalid() -> Self {
        Self::default().with_entry_errors(EntryErrorPolicy::Skip)
    }
}
