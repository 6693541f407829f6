//! Error types for the Bibstyle system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! None of these errors is fatal to a whole schema: parsers, the directive
//! interpreter and the compiler collect them into [`Diagnostics`](crate::Diagnostics)
//! and keep going.

use std::fmt;

use thiserror::Error;

/// Result type for Bibstyle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Bibstyle operations.
#[derive(Clone, Debug, Error, PartialEq)]
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

    /// Creates a parse failure at the given position.
    #[must_use]
    pub fn parse_failure(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::new(ErrorKind::ParseFailure {
            message: message.into(),
            line,
            column,
            context: String::new(),
        })
    }

    /// Creates a directive error.
    #[must_use]
    pub fn directive(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Directive(message.into()))
    }

    /// Creates a schema integrity warning.
    #[must_use]
    pub fn schema_integrity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SchemaIntegrity(message.into()))
    }

    /// Creates a compile error.
    #[must_use]
    pub fn compile(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Compile(message.into()))
    }

    /// Creates an invalid pattern error.
    #[must_use]
    pub fn invalid_pattern(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidPattern {
            field: field.into(),
            message: message.into(),
        })
    }

    /// Creates an unknown style error.
    #[must_use]
    pub fn unknown_style(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownStyle(name.into()))
    }

    /// Returns how serious this error is.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ErrorKind {
    /// Malformed declaration syntax (braces, missing body).
    #[error("parse failure at {line}:{column}: {message}")]
    ParseFailure {
        /// Description of the parse failure.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
        /// The command name or source fragment involved, if known.
        context: String,
    },

    /// Malformed or semantically invalid override directive.
    #[error("directive error: {0}")]
    Directive(String),

    /// A name is referenced but never given an explicit schema.
    #[error("schema integrity: {0}")]
    SchemaIntegrity(String),

    /// A declaration cannot be compiled into the style (e.g. misplaced constraint).
    #[error("compile error: {0}")]
    Compile(String),

    /// A pattern data constraint does not compile as a regular expression.
    #[error("invalid pattern for field {field}: {message}")]
    InvalidPattern {
        /// The field the pattern was attached to.
        field: String,
        /// The regex engine's message.
        message: String,
    },

    /// A requested style is not registered.
    #[error("unknown style: {0}")]
    UnknownStyle(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Returns the severity implied by this kind.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::SchemaIntegrity(_) => Severity::Warning,
            Self::ParseFailure { .. }
            | Self::Directive(_)
            | Self::Compile(_)
            | Self::InvalidPattern { .. }
            | Self::UnknownStyle(_)
            | Self::Serialization(_)
            | Self::Io(_)
            | Self::Internal(_) => Severity::Error,
        }
    }
}

/// How serious a collected problem is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Recovered automatically; the result is still complete.
    Warning,
    /// Part of the input was skipped.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Context about where an error occurred.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ErrorContext {
    /// Source name (file, template, or style).
    pub source: Option<String>,
    /// The directive or declaration text involved.
    pub snippet: Option<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source name.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the offending text.
    #[must_use]
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "in {source}")?;
        }
        if let Some(snippet) = &self.snippet {
            if self.source.is_some() {
                write!(f, " ")?;
            }
            write!(f, "`{snippet}`")?;
        }
        Ok(())
    }
}
