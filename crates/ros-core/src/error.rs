//! Error types for the reconciliation client
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Device error text that marks a missing item
///
/// RouterOS reports this (with minor wording variations) when an operation
/// addresses an `.id` that no longer exists. Generic "not found" text is
/// excluded: it also names missing referenced objects (scripts,
/// interfaces) while the addressed item still exists.
const NO_SUCH_ITEM_PATTERNS: &[&str] = &["no such item", "no such entry"];

/// Core error type for the reconciliation client
#[derive(Error, Debug)]
pub enum Error {
    /// A desired value failed its validator or a required/computed rule
    #[error("Validation failed for {resource}.{field}: {message}")]
    Validation {
        /// Resource kind
        resource: String,
        /// Offending field
        field: String,
        /// Validator message
        message: String,
    },

    /// No matching item on the device (expected outcome of drift)
    #[error("Not found: {0}")]
    NotFound(String),

    /// A device response could not be parsed per the schema
    #[error("Decode failed for {resource}.{field} (value {value:?}): {message}")]
    Decode {
        /// Resource kind
        resource: String,
        /// Offending field
        field: String,
        /// Raw wire value
        value: String,
        /// Parser message
        message: String,
    },

    /// Opaque failure from the transport adapter
    #[error("Transport error during {operation} on {resource}: {message}")]
    Transport {
        /// Operation being executed (read, add, set, remove, move)
        operation: String,
        /// Resource kind or path
        resource: String,
        /// Message reported by the transport
        message: String,
    },

    /// Lookup of an undefined resource kind
    #[error("Unknown resource kind: {0}")]
    UnknownResource(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// I/O errors (manifest loading)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(
        resource: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation {
            resource: resource.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a decode error
    pub fn decode(
        resource: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Decode {
            resource: resource.into(),
            field: field.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(
        operation: impl Into<String>,
        resource: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Transport {
            operation: operation.into(),
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Check whether this error signals a missing item
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Transport { message, .. } | Self::Other(message) => is_no_such_item(message),
            _ => false,
        }
    }
}

/// Check whether a device message matches the "no such item" pattern
pub fn is_no_such_item(message: &str) -> bool {
    let lower = message.to_lowercase();
    NO_SUCH_ITEM_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
