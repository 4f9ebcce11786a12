//! Unified error system for Encore
//!
//! A single error type shared by every Encore crate. Variants follow the
//! consent engine's error taxonomy: validation failures are raised when a bundle
//! is built or published, unknown permission types are rejected at the request
//! boundary, and append conflicts signal a ledger write race the caller retries.

use serde::{Deserialize, Serialize};

/// Unified error type for all Encore operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum EncoreError {
    /// A bundle, entry, or decision violates a model invariant
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the violated invariant
        message: String,
    },

    /// A request named a permission type outside the closed enumeration
    #[error("Unknown permission type: {value}")]
    UnknownPermissionType {
        /// The raw value that failed to parse
        value: String,
    },

    /// Concurrent write race detected by the ledger
    #[error("Append conflict: {message}")]
    AppendConflict {
        /// Description of the conflicting write
        message: String,
    },

    /// An actor attempted an edit the delegation chain does not authorize
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of the rejected action
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// Description of what was not found
        message: String,
    },

    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Storage adapter failure
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage failure
        message: String,
    },

    /// Serialization/deserialization failure
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure
        message: String,
    },
}

impl EncoreError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an unknown permission type error
    pub fn unknown_permission_type(value: impl Into<String>) -> Self {
        Self::UnknownPermissionType {
            value: value.into(),
        }
    }

    /// Create an append conflict error
    pub fn append_conflict(message: impl Into<String>) -> Self {
        Self::AppendConflict {
            message: message.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Whether the failed operation may succeed if retried unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AppendConflict { .. })
    }
}

/// Standard Result type for Encore operations
pub type Result<T> = std::result::Result<T, EncoreError>;

impl From<std::io::Error> for EncoreError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::storage(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for EncoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
