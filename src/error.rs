//! Error types for stlview.
//!
//! Every failure a view, the registry or the command front end can raise is
//! a variant of [`ViewError`]. Payloads are short, printable values so the
//! front end can report any failure as a single kind-labeled line.

use std::fmt;
use thiserror::Error;

use crate::inspect::memory::MemoryError;

/// Failures raised by an inspection backend while projecting, casting or
/// rendering values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("no type named '{0}'")]
    UnknownType(String),
    #[error("type '{ty}' has no field named '{field}'")]
    NoSuchField { ty: String, field: String },
    #[error("type '{0}' is not a pointer")]
    NotAPointer(String),
    #[error("type '{0}' is not an integer")]
    NotAnInteger(String),
    #[error("type '{0}' has no template argument {1}")]
    NoTemplateArgument(String, usize),
    #[error("value of type '{0}' is not in target memory")]
    NotAnLvalue(String),
    #[error("cannot cast '{from}' to '{to}'")]
    InvalidCast { from: String, to: String },
}

/// Main error type for view operations.
#[derive(Debug, Error)]
pub enum ViewError {
    /// Malformed or wrong-arity command input
    #[error("{0}")]
    Argument(String),

    /// Symbol does not resolve in the current scope
    #[error("{0}")]
    Symbol(String),

    /// Index outside `[0, size)`
    #[error("{index} (size {size})")]
    OutOfBounds { index: i64, size: usize },

    /// Capability not supported by the resolved view
    #[error("{0}")]
    Unimplemented(&'static str),

    /// Map lookup found no matching entry
    #[error("{0}")]
    NotFound(String),

    /// Object does not match the modeled layout
    #[error("{0}")]
    Layout(String),

    /// Backend could not project, cast or render a value
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Target memory could not be read
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Coarse classification used when reporting errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Argument,
    Symbol,
    OutOfBounds,
    Unimplemented,
    NotFound,
    Layout,
    Backend,
    Memory,
}

impl ViewError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ViewError::Argument(_) => ErrorKind::Argument,
            ViewError::Symbol(_) => ErrorKind::Symbol,
            ViewError::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            ViewError::Unimplemented(_) => ErrorKind::Unimplemented,
            ViewError::NotFound(_) => ErrorKind::NotFound,
            ViewError::Layout(_) => ErrorKind::Layout,
            ViewError::Backend(_) => ErrorKind::Backend,
            ViewError::Memory(_) => ErrorKind::Memory,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Argument => "Argument Error",
            ErrorKind::Symbol => "Symbol Error",
            ErrorKind::OutOfBounds => "Out Of Bounds Error",
            ErrorKind::Unimplemented => "Unimplemented Error",
            ErrorKind::NotFound => "Not Found Error",
            ErrorKind::Layout => "Layout Error",
            ErrorKind::Backend => "Backend Error",
            ErrorKind::Memory => "Memory Error",
        };
        f.write_str(label)
    }
}

/// Result type alias for view operations
pub type Result<T> = std::result::Result<T, ViewError>;
