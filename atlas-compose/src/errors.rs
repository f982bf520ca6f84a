//! Error types for the compose layer.
//!
//! Per-item batch failures and per-step pipeline failures are carried as
//! strings inside their results. `ComposeError` covers the fallible surfaces
//! around them: reading piped input, loading configuration and writing
//! compact output.

use std::collections::HashMap;
use thiserror::Error;

/// The main error type for compose operations.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// Stdin is an interactive terminal rather than a pipe or file.
    #[error("no input from stdin (not a pipe)")]
    NotPiped,

    /// The input stream was empty.
    #[error("empty stdin")]
    EmptyInput,

    /// The input was not one of the accepted JSON shapes.
    #[error("invalid JSON: must be object, array of objects, or array of strings")]
    InvalidInput,

    /// No item carried the requested field.
    #[error("no {field} found in stdin")]
    MissingField {
        /// The field (or field family, e.g. "ID") that was looked up.
        field: String,
    },

    /// A configuration value could not be interpreted.
    #[error("Invalid configuration for {key}: {reason}")]
    Config {
        /// The configuration key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComposeError {
    /// Creates a missing-field error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns a short machine-readable name for the error variant.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotPiped => "NotPiped",
            Self::EmptyInput => "EmptyInput",
            Self::InvalidInput => "InvalidInput",
            Self::MissingField { .. } => "MissingField",
            Self::Config { .. } => "Config",
            Self::Serialization(_) => "Serialization",
            Self::Io(_) => "Io",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!(self.kind()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));

        match self {
            Self::MissingField { field } => {
                map.insert("field".to_string(), serde_json::json!(field));
            }
            Self::Config { key, .. } => {
                map.insert("key".to_string(), serde_json::json!(key));
            }
            _ => {}
        }

        map
    }
}

/// Result type alias for compose operations.
pub type Result<T> = std::result::Result<T, ComposeError>;
