//! Leptos hook binding a signal to a storage entry.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components call [`use_stored_state`] the way they would create an
//! `RwSignal`: the returned signal drives rendering, the setter validates and
//! writes through to storage. Reading storage happens in an `Effect`, so the
//! first render (and SSR) always sees the default.
//!
//! TRADE-OFFS
//! ==========
//! The effect reads storage synchronously, so a key change can never be
//! overtaken by a stale read of the previous key. It remembers the last key
//! it loaded and ignores re-runs where the key string did not change.
//! Failures inside the effect have no caller to return to and are always
//! logged, whatever the [`FailurePolicy`](crate::FailurePolicy).

#[cfg(test)]
#[path = "hook_test.rs"]
mod hook_test;

use std::sync::Arc;

use leptos::prelude::*;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::binding::{EntryTarget, Update, UpdateOptions, UpdateOutcome};
use crate::error::BindingError;
use crate::options::StoredStateOptions;
use crate::validate::Validator;

struct HookShared<T> {
    default: T,
    validator: Validator<T>,
    options: StoredStateOptions<T>,
}

/// Write handle returned by [`use_stored_state`].
pub struct StoredStateSetter<T>
where
    T: Send + Sync + 'static,
{
    key: Signal<String>,
    state: RwSignal<T>,
    shared: Arc<HookShared<T>>,
}

impl<T> Clone for StoredStateSetter<T>
where
    T: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self { key: self.key, state: self.state, shared: Arc::clone(&self.shared) }
    }
}

/// Bind `key` to browser `localStorage` with serde shape checking.
pub fn use_stored_state<T>(key: impl Into<Signal<String>>, default: T) -> (Signal<T>, StoredStateSetter<T>)
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    use_stored_state_with_options(key, default, StoredStateOptions::default())
}

/// Bind `key` to storage using `options`.
///
/// Changing `key` resets the signal to `default` and reads the new entry.
pub fn use_stored_state_with_options<T>(
    key: impl Into<Signal<String>>,
    default: T,
    options: StoredStateOptions<T>,
) -> (Signal<T>, StoredStateSetter<T>)
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let key = key.into();
    let state = RwSignal::new(default.clone());
    let validator = options.validator.clone().unwrap_or_else(Validator::serde);
    let shared = Arc::new(HookShared { default, validator, options });

    let effect_shared = Arc::clone(&shared);
    Effect::new(move |previous: Option<String>| {
        let key = key.get();
        match previous {
            Some(previous) if previous == key => return key,
            Some(_) => state.set(effect_shared.default.clone()),
            None => {}
        }
        load_into(&effect_shared, state, &key);
        key
    });

    (state.into(), StoredStateSetter { key, state, shared })
}

/// Read the entry for `key` and adopt it; failures are logged and ignored.
fn load_into<T>(shared: &HookShared<T>, state: RwSignal<T>, key: &str)
where
    T: Send + Sync + 'static,
{
    let target = EntryTarget::new(&shared.options, &shared.validator, key);
    if !target.is_available() {
        return;
    }
    match target.read() {
        Ok(Some(value)) => {
            log::debug!("stored-state: loaded `{}`", target.storage_key());
            state.set(value);
        }
        Ok(None) => {}
        Err(err) => log::warn!("stored-state: {err}"),
    }
}

impl<T> StoredStateSetter<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Apply `update`, validate the result, and write it through to storage.
    pub fn apply(&self, update: Update<T>, options: UpdateOptions) -> Result<UpdateOutcome, BindingError> {
        let current = self.state.get_untracked();
        self.target().apply(&current, update, options, |next| self.state.set(next))
    }

    pub fn set(&self, value: T) -> Result<UpdateOutcome, BindingError> {
        self.apply(Update::Replace(value), UpdateOptions::default())
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) -> Result<UpdateOutcome, BindingError> {
        self.apply(Update::compute(f), UpdateOptions::default())
    }

    pub fn merge(&self, patch: Value) -> Result<UpdateOutcome, BindingError> {
        self.apply(Update::Partial(patch), UpdateOptions::merge())
    }

    /// Restore the default and delete the persisted entry.
    pub fn reset(&self) -> Result<UpdateOutcome, BindingError> {
        self.target().reset(self.shared.default.clone(), |value| self.state.set(value))
    }

    fn target(&self) -> EntryTarget<T> {
        EntryTarget::new(&self.shared.options, &self.shared.validator, &self.key.get_untracked())
    }
}
