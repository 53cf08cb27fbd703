//! Error types for the Datagraft system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//!
//! Errors fall into two families. *Format* errors are caused by data that
//! does not fit the registered descriptors; they are the only errors a
//! variant field retries on and the only ones a skip policy may drop.
//! Everything else is a *usage* error: the registry or the call itself is
//! misconfigured.

use std::fmt;

use thiserror::Error;

use crate::types::DataKind;

/// The main error type for Datagraft operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Pushes a path frame (innermost first) onto this error's context.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.context
            .get_or_insert_with(ErrorContext::new)
            .stack
            .push(frame.into());
        self
    }

    /// Sets the source (usually a file name) on this error's context.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.context.get_or_insert_with(ErrorContext::new).source = Some(source.into());
        self
    }

    /// Returns true for data-caused errors.
    #[must_use]
    pub fn is_format(&self) -> bool {
        self.kind.is_format()
    }

    /// Renders the path to the failing datum, outermost first (`entry.field[2]`).
    #[must_use]
    pub fn path(&self) -> String {
        self.context
            .as_ref()
            .map(ErrorContext::path)
            .unwrap_or_default()
    }

    /// Renders the error followed by its context, if any:
    /// ``missing required field `x` (in shapes.json at shape1.x)``.
    #[must_use]
    pub fn report(&self) -> String {
        match &self.context {
            Some(context) if context.source.is_some() || !context.stack.is_empty() => {
                format!("{self} ({context})")
            }
            _ => self.to_string(),
        }
    }

    /// Creates a missing required field error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingField {
            field: field.into(),
        })
    }

    /// Creates a data kind mismatch error.
    #[must_use]
    pub fn kind_mismatch(descriptor: impl Into<String>, expected: &[DataKind], actual: DataKind) -> Self {
        Self::new(ErrorKind::KindMismatch {
            descriptor: descriptor.into(),
            expected: expected.to_vec(),
            actual,
        })
    }

    /// Creates an expected-sequence error.
    #[must_use]
    pub fn expected_sequence(descriptor: impl Into<String>, actual: DataKind) -> Self {
        Self::new(ErrorKind::ExpectedSequence {
            descriptor: descriptor.into(),
            actual,
        })
    }

    /// Creates an expected-mapping error.
    #[must_use]
    pub fn expected_mapping(descriptor: impl Into<String>, actual: DataKind) -> Self {
        Self::new(ErrorKind::ExpectedMapping {
            descriptor: descriptor.into(),
            actual,
        })
    }

    /// Creates an unresolved abstract type error.
    #[must_use]
    pub fn abstract_type(descriptor: impl Into<String>) -> Self {
        Self::new(ErrorKind::AbstractType(descriptor.into()))
    }

    /// Creates an aggregate error for a variant where no candidate matched.
    #[must_use]
    pub fn no_variant_matched(field: impl Into<String>, attempts: Vec<Error>) -> Self {
        Self::new(ErrorKind::NoVariantMatched {
            field: field.into(),
            attempts,
        })
    }

    /// Creates an error for a usage problem in descriptor definitions.
    #[must_use]
    pub fn invalid_definition(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidDefinition(message.into()))
    }

    /// Creates a construction error.
    #[must_use]
    pub fn construction(descriptor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::Construction {
            descriptor: descriptor.into(),
            reason: reason.into(),
        })
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    // =========================================================================
    // Format errors
    // =========================================================================
    /// A required field is absent and nothing was inherited for it.
    #[error("missing required field `{field}`")]
    MissingField {
        /// The data key of the field.
        field: String,
    },

    /// A primitive received data outside its allowed kinds.
    #[error("`{descriptor}` does not accept {actual} (accepts {})", kinds(.expected))]
    KindMismatch {
        /// The primitive descriptor's name.
        descriptor: String,
        /// The kinds the descriptor accepts.
        expected: Vec<DataKind>,
        /// The kind received.
        actual: DataKind,
    },

    /// An array descriptor received something other than a sequence.
    #[error("`{descriptor}` expects a sequence, got {actual}")]
    ExpectedSequence {
        /// The descriptor's name.
        descriptor: String,
        /// The kind received.
        actual: DataKind,
    },

    /// An object descriptor received something other than a mapping.
    #[error("`{descriptor}` expects a mapping, got {actual}")]
    ExpectedMapping {
        /// The descriptor's name.
        descriptor: String,
        /// The kind received.
        actual: DataKind,
    },

    /// A node resolved to an abstract descriptor; the data must name a concrete type.
    #[error("`{0}` is abstract; data must select a concrete type with `$type` or `$inherit`")]
    AbstractType(String),

    /// None of a variant's candidates accepted the data.
    #[error("no variant of `{field}` matched ({} candidates tried)", .attempts.len())]
    NoVariantMatched {
        /// The field (or element) whose candidates were tried.
        field: String,
        /// The format error each candidate produced, in declaration order.
        attempts: Vec<Error>,
    },

    /// `$type` names a descriptor that is not registered.
    #[error("unknown type name `{0}`")]
    UnknownTypeName(String),

    /// `$inherit` names an entry that has not been resolved.
    #[error("cannot inherit from unknown entry `{0}`")]
    UnknownInherit(String),

    /// A top-level entry has no `$name`.
    #[error("top-level entry is missing `$name`")]
    MissingEntryName,

    /// A reserved key holds something other than a string.
    #[error("reserved key `{key}` must be a string, got {actual}")]
    InvalidReservedKey {
        /// The reserved key.
        key: String,
        /// The kind received.
        actual: DataKind,
    },

    /// The document root is neither a sequence nor a mapping.
    #[error("document root must be a sequence or mapping, got {0}")]
    InvalidDocument(DataKind),

    // =========================================================================
    // Usage errors
    // =========================================================================
    /// No descriptor could be determined for a node.
    #[error("could not determine type: {0}")]
    TypeResolution(String),

    /// A descriptor or field definition is invalid.
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),

    /// A value's runtime type has no registered descriptor.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// A top-level wrapper declares both `$values` and `$value`.
    #[error("wrapper block cannot declare both `$values` and `$value`")]
    MalformedWrapper,

    /// A different descriptor with the same name is already registered.
    #[error("a different descriptor named `{0}` is already registered")]
    DuplicateDescriptor(String),

    /// A descriptor cannot construct or clone a value.
    #[error("cannot construct `{descriptor}`: {reason}")]
    Construction {
        /// The descriptor's name.
        descriptor: String,
        /// Why construction failed.
        reason: String,
    },

    /// A configured limit was exceeded.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O failure while reading input.
    #[error("I/O error: {0}")]
    Io(String),

    /// Input text could not be parsed into a data tree.
    #[error("parse error: {0}")]
    Parse(String),

    /// A resolved value could not be converted to the requested Rust type.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Returns true for data-caused errors.
    #[must_use]
    pub const fn is_format(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. }
                | Self::KindMismatch { .. }
                | Self::ExpectedSequence { .. }
                | Self::ExpectedMapping { .. }
                | Self::AbstractType(_)
                | Self::NoVariantMatched { .. }
                | Self::UnknownTypeName(_)
                | Self::UnknownInherit(_)
                | Self::MissingEntryName
                | Self::InvalidReservedKey { .. }
                | Self::InvalidDocument(_)
        )
    }
}

fn kinds(kinds: &[DataKind]) -> String {
    kinds
        .iter()
        .map(|k| k.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Context about where an error occurred.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Source document (file name or caller-supplied label).
    pub source: Option<String>,
    /// Path frames, innermost first, pushed as the error unwinds.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            stack: Vec::new(),
        }
    }

    /// Sets the source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds a path frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }

    /// Renders the frames outermost first. Index frames (`[n]`) attach
    /// without a separator.
    #[must_use]
    pub fn path(&self) -> String {
        let mut out = String::new();
        for frame in self.stack.iter().rev() {
            if !out.is_empty() && !frame.starts_with('[') {
                out.push('.');
            }
            out.push_str(frame);
        }
        out
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "in {source}")?;
            if !self.stack.is_empty() {
                write!(f, " ")?;
            }
        }
        if !self.stack.is_empty() {
            write!(f, "at {}", self.path())?;
        }
        Ok(())
    }
}
