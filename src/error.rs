//! Library error types.
//!
//! This module provides the opaque [`Error`] returned by configuration loading,
//! logger construction and server startup. It follows the `std::io::Error`
//! pattern: an [`ErrorKind`] for matching plus a boxed source for the message.
//!
//! Errors produced by request handlers are a different concern and live in
//! [`crate::ResponseError`]. A library [`Error`] that escapes a handler is
//! converted into the unknown response variant.
//!
//! # Example
//!
//! ```rust
//! use webframe::{Error, ErrorKind};
//!
//! let error = Error::config("missing [http] section");
//!
//! match error.kind() {
//!     ErrorKind::Configuration => println!("Bad configuration: {}", error),
//!     ErrorKind::Io => println!("I/O error: {}", error),
//!     _ => println!("Other error: {}", error),
//! }
//! ```

use std::fmt;
use thiserror::Error;

/// The kind of error that occurred.
///
/// This enum is marked `#[non_exhaustive]`; always include a wildcard arm
/// when matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Database error (connection, query, pool issues).
    #[error("database error")]
    Database,

    /// Configuration error (invalid TOML, missing values).
    #[error("configuration error")]
    Configuration,

    /// I/O error (file operations, network).
    #[error("I/O error")]
    Io,

    /// Invalid input (bad address, header, request data).
    #[error("invalid input")]
    InvalidInput,

    /// Logger or sink could not be set up.
    #[error("logging error")]
    Logging,

    /// Internal/unexpected error.
    #[error("internal error")]
    Internal,
}

/// An error that can occur in the webframe library.
///
/// Use [`Error::kind()`] to determine the category and the `Display`
/// implementation to get a human-readable message.
///
/// ```rust
/// use webframe::{Error, ErrorKind};
///
/// let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
/// let err = Error::new(ErrorKind::Io, io_err);
/// assert_eq!(err.kind(), ErrorKind::Io);
/// ```
pub struct Error {
    kind: ErrorKind,
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl Error {
    /// Creates a new error with the given kind and source.
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self {
            kind,
            source: error.into(),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Consumes the error and returns the inner error source.
    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self.source
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl Error {
    /// Creates a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, msg.into())
    }

    /// Creates a database configuration error.
    pub fn database_config(msg: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Database,
            format!("Database configuration error: {}", msg.into()),
        )
    }

    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, msg.into())
    }

    /// Creates an I/O error from a message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, msg.into())
    }

    /// Creates an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, msg.into())
    }

    /// Creates a logging error.
    pub fn logging(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Logging, msg.into())
    }

    /// Creates an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, msg.into())
    }
}

// ============================================================================
// Trait implementations
// ============================================================================

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

// ============================================================================
// From implementations
// ============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::new(ErrorKind::Configuration, err)
    }
}

impl From<std::env::VarError> for Error {
    fn from(err: std::env::VarError) -> Self {
        Self::new(ErrorKind::Configuration, err)
    }
}

impl From<tracing_subscriber::filter::ParseError> for Error {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        Self::new(ErrorKind::Logging, err)
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::new(ErrorKind::Database, err)
    }
}

// ============================================================================
// Tests
// ============================================================================
