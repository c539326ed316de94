//! Caller-supplied shape checks for stored values.
//!
//! A validator turns untrusted JSON (read back from storage, or a merged
//! update candidate) into a typed value, or rejects it.

#[cfg(test)]
#[path = "validate_test.rs"]
mod validate_test;

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ValidationError;

type ValidateFn<T> = dyn Fn(Value) -> Result<T, ValidationError> + Send + Sync;

/// Converts an unvalidated JSON value into `T` or rejects it.
pub struct Validator<T> {
    check: Arc<ValidateFn<T>>,
}

impl<T> Validator<T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<T, ValidationError> + Send + Sync + 'static,
    {
        Self { check: Arc::new(f) }
    }

    /// Run the validator against `value`.
    pub fn validate(&self, value: Value) -> Result<T, ValidationError> {
        (self.check)(value)
    }
}

impl<T: DeserializeOwned> Validator<T> {
    /// Accept anything that deserializes into `T`.
    #[must_use]
    pub fn serde() -> Self {
        Self::new(|value| serde_json::from_value(value).map_err(ValidationError::from))
    }

    /// Deserialize into `T`, then apply a typed predicate.
    pub fn check<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> Result<(), String> + Send + Sync + 'static,
    {
        Self::new(move |value| {
            let typed: T = serde_json::from_value(value)?;
            predicate(&typed).map_err(ValidationError::new)?;
            Ok(typed)
        })
    }
}

impl<T> Clone for Validator<T> {
    fn clone(&self) -> Self {
        Self { check: Arc::clone(&self.check) }
    }
}

impl<T> fmt::Debug for Validator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator").finish_non_exhaustive()
    }
}
