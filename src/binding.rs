//! Framework-agnostic binding between one value and one storage entry.
//!
//! SYSTEM CONTEXT
//! ==============
//! [`StoredState`] is the in-memory source of truth; the storage entry is a
//! best-effort mirror of it. The Leptos hook reuses the same read/prepare
//! steps, so both paths share one definition of "valid update".
//!
//! ERROR HANDLING
//! ==============
//! Updates are all-or-nothing with respect to validation: a rejected candidate
//! leaves both state and storage as they were. A storage write failure after
//! an accepted update still leaves the new state in memory.
//!
//! TRADE-OFFS
//! ==========
//! Several bindings on the same key are independent copies. Nothing
//! coordinates them; the last write wins and others drift until `reload`.

#[cfg(test)]
#[path = "binding_test.rs"]
mod binding_test;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::BindingError;
use crate::merge::shallow_merge;
use crate::options::{FailurePolicy, StoredStateOptions};
use crate::storage::KeyValueStore;
use crate::validate::Validator;

/// Result of reading the persisted entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No entry exists; state stays at the default.
    Missing,
    /// The entry parsed and validated and is now the state.
    Loaded,
    /// The entry was unreadable or invalid and was ignored.
    Fallback,
    /// No storage in this context.
    Unavailable,
}

/// Result of an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// State changed (and was written to storage, unless the write failed).
    Applied,
    /// The candidate failed serialization or validation; nothing changed.
    Rejected,
    /// No storage in this context; nothing changed.
    Unavailable,
}

/// Candidate for the next state.
pub enum Update<T> {
    /// Replace the whole value.
    Replace(T),
    /// Derive the next value from the current one.
    Compute(Box<dyn FnOnce(&T) -> T>),
    /// Raw JSON candidate, usually a subset of fields paired with `merge`.
    Partial(Value),
}

impl<T> Update<T> {
    pub fn compute(f: impl FnOnce(&T) -> T + 'static) -> Self {
        Self::Compute(Box::new(f))
    }
}

impl<T> fmt::Debug for Update<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace(_) => f.write_str("Update::Replace"),
            Self::Compute(_) => f.write_str("Update::Compute"),
            Self::Partial(value) => f.debug_tuple("Update::Partial").field(value).finish(),
        }
    }
}

/// Per-update flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Shallow-merge the candidate over the current state instead of replacing it.
    pub merge: bool,
}

impl UpdateOptions {
    #[must_use]
    pub fn merge() -> Self {
        Self { merge: true }
    }
}

/// Handle returned by [`StoredState::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A validated candidate together with the exact text that will be stored.
struct Prepared<T> {
    value: T,
    raw: String,
}

/// One storage entry plus the rules for reading and writing it.
///
/// Owns its handles so the caller can mutate wherever the state lives
/// (`StoredState` fields or a Leptos signal) from the `commit` closures.
pub(crate) struct EntryTarget<T> {
    store: Arc<dyn KeyValueStore>,
    storage_key: String,
    validator: Validator<T>,
    policy: FailurePolicy,
}

impl<T> EntryTarget<T> {
    pub(crate) fn new(options: &StoredStateOptions<T>, validator: &Validator<T>, key: &str) -> Self {
        Self {
            store: Arc::clone(&options.store),
            storage_key: options.storage_key(key),
            validator: validator.clone(),
            policy: options.failure_policy,
        }
    }

    pub(crate) fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub(crate) fn is_available(&self) -> bool {
        self.store.is_available()
    }

    /// Parsed and validated entry; `Ok(None)` when nothing is stored.
    pub(crate) fn read(&self) -> Result<Option<T>, BindingError> {
        read_entry(self.store.as_ref(), &self.storage_key, &self.validator)
    }

    /// Delete the entry, hand `default` to `commit`, and settle per policy.
    pub(crate) fn reset(&self, default: T, commit: impl FnOnce(T)) -> Result<UpdateOutcome, BindingError> {
        if !self.is_available() {
            return Ok(UpdateOutcome::Unavailable);
        }
        let removed = remove_entry(self.store.as_ref(), &self.storage_key);
        commit(default);
        self.policy.settle(removed.map(|()| UpdateOutcome::Applied), UpdateOutcome::Applied)
    }
}

impl<T: Serialize> EntryTarget<T> {
    /// Prepare `update` against `current`, hand the accepted value to
    /// `commit`, then write it through. `commit` is not called on rejection.
    pub(crate) fn apply(
        &self,
        current: &T,
        update: Update<T>,
        options: UpdateOptions,
        commit: impl FnOnce(T),
    ) -> Result<UpdateOutcome, BindingError> {
        if !self.is_available() {
            return Ok(UpdateOutcome::Unavailable);
        }
        let prepared = match prepare(&self.storage_key, current, update, options, &self.validator) {
            Ok(prepared) => prepared,
            Err(err) => return self.policy.settle(Err(err), UpdateOutcome::Rejected),
        };

        commit(prepared.value);
        let written = write_raw(self.store.as_ref(), &self.storage_key, &prepared.raw);
        self.policy.settle(written.map(|()| UpdateOutcome::Applied), UpdateOutcome::Applied)
    }
}

/// Read `storage_key`, parse it, and run it through `validator`.
///
/// `Ok(None)` means no entry exists.
fn read_entry<T>(
    store: &dyn KeyValueStore,
    storage_key: &str,
    validator: &Validator<T>,
) -> Result<Option<T>, BindingError> {
    let raw = store.get(storage_key).map_err(|source| BindingError::Storage {
        key: storage_key.to_owned(),
        source,
    })?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let parsed: Value = serde_json::from_str(&raw).map_err(|source| BindingError::Parse {
        key: storage_key.to_owned(),
        source,
    })?;
    let value = validator.validate(parsed).map_err(|source| BindingError::Validation {
        key: storage_key.to_owned(),
        source,
    })?;
    Ok(Some(value))
}

/// Compute, merge, validate, and serialize the next value. Touches nothing.
fn prepare<T: Serialize>(
    storage_key: &str,
    current: &T,
    update: Update<T>,
    options: UpdateOptions,
    validator: &Validator<T>,
) -> Result<Prepared<T>, BindingError> {
    let serialize_err = |source: serde_json::Error| BindingError::Serialize { key: storage_key.to_owned(), source };

    let candidate = match update {
        Update::Replace(value) => serde_json::to_value(&value).map_err(serialize_err)?,
        Update::Compute(f) => serde_json::to_value(f(current)).map_err(serialize_err)?,
        Update::Partial(value) => value,
    };
    let candidate = if options.merge {
        let base = serde_json::to_value(current).map_err(serialize_err)?;
        shallow_merge(base, candidate)
    } else {
        candidate
    };

    let value = validator.validate(candidate).map_err(|source| BindingError::Validation {
        key: storage_key.to_owned(),
        source,
    })?;
    let raw = serde_json::to_string(&value).map_err(serialize_err)?;
    Ok(Prepared { value, raw })
}

/// Write already-serialized text for `storage_key`.
fn write_raw(store: &dyn KeyValueStore, storage_key: &str, raw: &str) -> Result<(), BindingError> {
    store.set(storage_key, raw).map_err(|source| BindingError::Storage {
        key: storage_key.to_owned(),
        source,
    })?;
    log::debug!("stored-state: wrote `{storage_key}`");
    Ok(())
}

/// Delete the entry for `storage_key`.
fn remove_entry(store: &dyn KeyValueStore, storage_key: &str) -> Result<(), BindingError> {
    store.remove(storage_key).map_err(|source| BindingError::Storage {
        key: storage_key.to_owned(),
        source,
    })
}

type Observer<T> = Box<dyn FnMut(&T)>;

/// Observable value bound to one storage key.
pub struct StoredState<T> {
    key: String,
    default: T,
    value: T,
    validator: Validator<T>,
    options: StoredStateOptions<T>,
    observers: Vec<(SubscriptionId, Observer<T>)>,
    next_subscription: u64,
}

impl<T> StoredState<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    /// Create a binding whose state is `default`. Storage is not read until
    /// [`initialize`](Self::initialize).
    pub fn new(key: impl Into<String>, default: T, options: StoredStateOptions<T>) -> Self {
        let validator = options.validator.clone().unwrap_or_else(Validator::serde);
        Self {
            key: key.into(),
            value: default.clone(),
            default,
            validator,
            options,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Create and immediately initialize.
    pub fn load(key: impl Into<String>, default: T, options: StoredStateOptions<T>) -> Result<Self, BindingError> {
        let mut state = Self::new(key, default, options);
        state.initialize()?;
        Ok(state)
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Key as written to storage, including any namespace.
    pub fn storage_key(&self) -> String {
        self.options.storage_key(&self.key)
    }

    /// Read the persisted entry and adopt it if it parses and validates.
    pub fn initialize(&mut self) -> Result<LoadOutcome, BindingError> {
        let target = self.target();
        if !target.is_available() {
            return Ok(LoadOutcome::Unavailable);
        }
        let result = match target.read() {
            Ok(Some(value)) => {
                log::debug!("stored-state: loaded `{}`", target.storage_key());
                self.replace_value(value);
                Ok(LoadOutcome::Loaded)
            }
            Ok(None) => Ok(LoadOutcome::Missing),
            Err(err) => Err(err),
        };
        self.options.failure_policy.settle(result, LoadOutcome::Fallback)
    }

    /// Reset to the default and read storage again.
    pub fn reload(&mut self) -> Result<LoadOutcome, BindingError> {
        self.replace_value(self.default.clone());
        self.initialize()
    }

    /// Rebind to `key` and re-initialize against it.
    pub fn set_key(&mut self, key: impl Into<String>) -> Result<LoadOutcome, BindingError> {
        self.key = key.into();
        self.reload()
    }

    /// Apply `update`, validate the result, and write it through to storage.
    pub fn apply(&mut self, update: Update<T>, options: UpdateOptions) -> Result<UpdateOutcome, BindingError> {
        let current = self.value.clone();
        self.target().apply(&current, update, options, |next| self.replace_value(next))
    }

    /// Replace the value.
    pub fn set(&mut self, value: T) -> Result<UpdateOutcome, BindingError> {
        self.apply(Update::Replace(value), UpdateOptions::default())
    }

    /// Derive the next value from the current one.
    pub fn update(&mut self, f: impl FnOnce(&T) -> T + 'static) -> Result<UpdateOutcome, BindingError> {
        self.apply(Update::compute(f), UpdateOptions::default())
    }

    /// Shallow-merge `patch` over the current value.
    pub fn merge(&mut self, patch: Value) -> Result<UpdateOutcome, BindingError> {
        self.apply(Update::Partial(patch), UpdateOptions::merge())
    }

    /// Restore the default and delete the persisted entry.
    pub fn reset(&mut self) -> Result<UpdateOutcome, BindingError> {
        let default = self.default.clone();
        self.target().reset(default, |value| self.replace_value(value))
    }

    /// Call `observer` after every change to the value.
    pub fn subscribe(&mut self, observer: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    fn target(&self) -> EntryTarget<T> {
        EntryTarget::new(&self.options, &self.validator, &self.key)
    }

    fn replace_value(&mut self, value: T) {
        self.value = value;
        for (_, observer) in &mut self.observers {
            observer(&self.value);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for StoredState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredState")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("options", &self.options)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
