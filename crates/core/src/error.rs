//! Error types for Sift.

use crate::value::Value;
use alloc::string::String;
use core::fmt;

/// Result type alias for Sift operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for Sift operations.
///
/// Evaluation itself never fails: predicates and comparators are plain
/// closures and a panic inside one propagates to the caller. Errors only
/// come from validating input at the API boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A view specification was rejected.
    InvalidSpec {
        message: String,
    },
    /// An operation was called with arguments it cannot honor.
    InvalidOperation {
        message: String,
    },
    /// An entity was not found.
    NotFound {
        index: String,
        key: Value,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidSpec { message } => {
                write!(f, "Invalid view spec: {}", message)
            }
            Error::InvalidOperation { message } => {
                write!(f, "Invalid operation: {}", message)
            }
            Error::NotFound { index, key } => {
                write!(f, "Not found in index {}: {}", index, key)
            }
        }
    }
}

impl Error {
    /// Creates an invalid spec error.
    pub fn invalid_spec(message: impl Into<String>) -> Self {
        Error::InvalidSpec {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(index: impl Into<String>, key: Value) -> Self {
        Error::NotFound {
            index: index.into(),
            key,
        }
    }
}
