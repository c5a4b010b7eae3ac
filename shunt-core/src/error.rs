//! Error types for shunt

use thiserror::Error;

/// Result type alias for shunt operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for shunt
///
/// Decode failures are atomic: when a variant decoder returns `Format`, no
/// partially built header is handed back to the caller. The remaining kinds
/// are raised eagerly at the call that violates the contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed or truncated wire bytes during decode
    #[error("malformed wire data: {0}")]
    Format(String),

    /// Value of the wrong semantic type assigned into a typed field
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Index out of bounds on an indexed collection
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: isize, len: usize },

    /// Query shape not supported by an indexed collection
    #[error("unsupported query shape: {0}")]
    Shape(String),

    /// Undefined code assigned to an enumerated field
    #[error("value 0x{value:02x} is not a defined {field}")]
    EnumValue { field: &'static str, value: u8 },

    /// Invalid layering while building a stack
    #[error("stack construction error: {0}")]
    Construction(String),
}

impl Error {
    /// Create a format error with a custom message
    pub fn format<S: Into<String>>(msg: S) -> Self {
        Error::Format(msg.into())
    }

    /// Create a type mismatch error with a custom message
    pub fn type_mismatch<S: Into<String>>(msg: S) -> Self {
        Error::TypeMismatch(msg.into())
    }

    /// Create a construction error with a custom message
    pub fn construction<S: Into<String>>(msg: S) -> Self {
        Error::Construction(msg.into())
    }

    /// Create a truncation format error for a named structure
    pub fn truncated(what: &str, need: usize, got: usize) -> Self {
        Error::Format(format!("{what}: need {need} bytes, got {got}"))
    }
}
