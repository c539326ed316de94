//! Binding configuration.
//!
//! DESIGN
//! ======
//! Options are a plain builder handed to [`StoredState::new`](crate::StoredState::new)
//! or [`use_stored_state_with_options`](crate::use_stored_state_with_options).
//! Everything has a browser-friendly default: `localStorage`, serde shape
//! check, fail-soft error handling, no key namespace.

#[cfg(test)]
#[path = "options_test.rs"]
mod options_test;

use std::fmt;
use std::sync::Arc;

use crate::error::BindingError;
use crate::storage::{BrowserStore, KeyValueStore};
use crate::validate::Validator;

/// What a binding does with a parse, validation, or storage failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log at `warn` and keep the last valid state.
    #[default]
    Ignore,
    /// Return the error to the caller. State is still left untouched.
    Propagate,
}

impl FailurePolicy {
    /// Resolve `result` per policy; `fallback` is the outcome reported when ignoring.
    pub(crate) fn settle<O>(self, result: Result<O, BindingError>, fallback: O) -> Result<O, BindingError> {
        match (result, self) {
            (Ok(outcome), _) => Ok(outcome),
            (Err(err), Self::Ignore) => {
                log::warn!("stored-state: {err}");
                Ok(fallback)
            }
            (Err(err), Self::Propagate) => Err(err),
        }
    }
}

/// Configuration for one binding.
pub struct StoredStateOptions<T> {
    pub(crate) validator: Option<Validator<T>>,
    pub(crate) store: Arc<dyn KeyValueStore>,
    pub(crate) failure_policy: FailurePolicy,
    pub(crate) namespace: Option<String>,
}

impl<T> StoredStateOptions<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: None,
            store: Arc::new(BrowserStore::local()),
            failure_policy: FailurePolicy::default(),
            namespace: None,
        }
    }

    /// Check every value read from or written to storage.
    #[must_use]
    pub fn validator(mut self, validator: Validator<T>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Use `store` instead of browser `localStorage`.
    #[must_use]
    pub fn store(mut self, store: impl KeyValueStore + 'static) -> Self {
        self.store = Arc::new(store);
        self
    }

    /// Share an already type-erased store between bindings.
    #[must_use]
    pub fn shared_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = store;
        self
    }

    #[must_use]
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Prefix storage keys as `"{namespace}:{key}"`.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// The key actually used in storage for a binding key.
    #[must_use]
    pub fn storage_key(&self, key: &str) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}:{key}"),
            None => key.to_owned(),
        }
    }
}

impl<T> Default for StoredStateOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for StoredStateOptions<T> {
    fn clone(&self) -> Self {
        Self {
            validator: self.validator.clone(),
            store: Arc::clone(&self.store),
            failure_policy: self.failure_policy,
            namespace: self.namespace.clone(),
        }
    }
}

impl<T> fmt::Debug for StoredStateOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredStateOptions")
            .field("validator", &self.validator.is_some())
            .field("failure_policy", &self.failure_policy)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
