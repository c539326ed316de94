//! Error types for storage access, validation, and binding operations.
//!
//! ERROR HANDLING
//! ==============
//! None of these reach a caller under the default fail-soft policy; they are
//! logged and the binding keeps its last valid state. With
//! [`FailurePolicy::Propagate`](crate::FailurePolicy::Propagate) they are
//! returned as-is.

/// Failure talking to the underlying key-value store.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// No storage exists in this execution context (SSR, native, disabled by the browser).
    #[error("storage is not available")]
    Unavailable,
    /// The store refused a read.
    #[error("failed to read from storage: {0}")]
    Read(String),
    /// The store refused a write (quota exceeded, private mode, ...).
    #[error("failed to write to storage: {0}")]
    Write(String),
}

/// A value did not conform to the expected shape.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Error produced by a [`StoredState`](crate::StoredState) operation.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    /// Persisted text for `key` is not valid JSON.
    #[error("stored value for `{key}` is not valid JSON: {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// A persisted or candidate value was rejected by the validator.
    #[error("value for `{key}` failed validation: {source}")]
    Validation {
        key: String,
        #[source]
        source: ValidationError,
    },
    /// A value could not be converted to JSON.
    #[error("value for `{key}` could not be serialized: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// The store failed to read, write, or remove `key`.
    #[error("storage access for `{key}` failed: {source}")]
    Storage {
        key: String,
        #[source]
        source: StorageError,
    },
}

impl BindingError {
    /// Storage key the failure relates to.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Parse { key, .. }
            | Self::Validation { key, .. }
            | Self::Serialize { key, .. }
            | Self::Storage { key, .. } => key,
        }
    }
}
