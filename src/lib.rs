//! Reactive state mirrored into browser key-value storage.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components that want a value to survive reloads (drafts, panel layout,
//! preferences) bind it to one storage key. The binding reads the entry once
//! after mount, validates it, and writes every accepted update back as JSON.
//!
//! [`StoredState`] is the framework-agnostic core; [`use_stored_state`] wraps
//! it in Leptos signals. Storage is an injected [`KeyValueStore`] so native
//! tests and SSR can substitute [`MemoryStore`] for the browser.

pub mod binding;
pub mod error;
pub mod hook;
pub mod merge;
pub mod options;
pub mod storage;
pub mod validate;

pub use binding::{LoadOutcome, StoredState, SubscriptionId, Update, UpdateOptions, UpdateOutcome};
pub use error::{BindingError, StorageError, ValidationError};
pub use hook::{StoredStateSetter, use_stored_state, use_stored_state_with_options};
pub use merge::shallow_merge;
pub use options::{FailurePolicy, StoredStateOptions};
pub use storage::{BrowserStore, KeyValueStore, MemoryStore, StorageArea};
pub use validate::Validator;
