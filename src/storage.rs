//! Key-value storage capability behind every binding.
//!
//! SYSTEM CONTEXT
//! ==============
//! Bindings never touch `web_sys` directly. They receive a [`KeyValueStore`]
//! so the browser store can be swapped for [`MemoryStore`] in tests and on the
//! server, where no `window` exists.
//!
//! TRADE-OFFS
//! ==========
//! [`BrowserStore`] resolves the `Storage` object on every call instead of
//! caching it: `web_sys::Storage` is not `Send`, and the lookup is cheap.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::StorageError;

/// Synchronous string-keyed, string-valued store.
pub trait KeyValueStore: Send + Sync {
    /// Whether storage exists in this execution context.
    fn is_available(&self) -> bool;

    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Which browser storage object a [`BrowserStore`] targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StorageArea {
    /// `window.localStorage`: persists across sessions.
    #[default]
    Local,
    /// `window.sessionStorage`: cleared when the tab closes.
    Session,
}

/// Browser `localStorage` / `sessionStorage`, available only in `hydrate` builds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BrowserStore {
    area: StorageArea,
}

impl BrowserStore {
    #[must_use]
    pub fn new(area: StorageArea) -> Self {
        Self { area }
    }

    #[must_use]
    pub fn local() -> Self {
        Self::new(StorageArea::Local)
    }

    #[must_use]
    pub fn session() -> Self {
        Self::new(StorageArea::Session)
    }

    #[must_use]
    pub fn area(&self) -> StorageArea {
        self.area
    }

    #[cfg(feature = "hydrate")]
    fn storage(&self) -> Result<web_sys::Storage, StorageError> {
        let window = web_sys::window().ok_or(StorageError::Unavailable)?;
        let storage = match self.area {
            StorageArea::Local => window.local_storage(),
            StorageArea::Session => window.session_storage(),
        };
        storage.ok().flatten().ok_or(StorageError::Unavailable)
    }
}

impl KeyValueStore for BrowserStore {
    fn is_available(&self) -> bool {
        #[cfg(feature = "hydrate")]
        {
            self.storage().is_ok()
        }
        #[cfg(not(feature = "hydrate"))]
        {
            false
        }
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        #[cfg(feature = "hydrate")]
        {
            self.storage()?
                .get_item(key)
                .map_err(|err| StorageError::Read(format!("{err:?}")))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = key;
            Err(StorageError::Unavailable)
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        #[cfg(feature = "hydrate")]
        {
            self.storage()?
                .set_item(key, value)
                .map_err(|err| StorageError::Write(format!("{err:?}")))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (key, value);
            Err(StorageError::Unavailable)
        }
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        #[cfg(feature = "hydrate")]
        {
            self.storage()?
                .remove_item(key)
                .map_err(|err| StorageError::Write(format!("{err:?}")))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = key;
            Err(StorageError::Unavailable)
        }
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: HashMap<String, String>,
    unavailable: bool,
    reject_writes: bool,
}

/// In-memory store. Clones share the same entries, like tabs of one origin.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that reports itself unavailable, as a browser store does during SSR.
    #[must_use]
    pub fn unavailable() -> Self {
        let store = Self::new();
        store.with_inner(|inner| inner.unavailable = true);
        store
    }

    /// Seed an entry with raw text, bypassing any binding.
    pub fn insert_raw(&self, key: impl Into<String>, raw: impl Into<String>) {
        let (key, raw) = (key.into(), raw.into());
        self.with_inner(|inner| {
            inner.entries.insert(key, raw);
        });
    }

    /// Raw text currently stored under `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.with_inner(|inner| inner.entries.get(key).cloned())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.with_inner(|inner| inner.entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every subsequent `set`/`remove` fail, like a full quota.
    pub fn reject_writes(&self, reject: bool) {
        self.with_inner(|inner| inner.reject_writes = reject);
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut MemoryInner) -> R) -> R {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

impl KeyValueStore for MemoryStore {
    fn is_available(&self) -> bool {
        self.with_inner(|inner| !inner.unavailable)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_inner(|inner| {
            if inner.unavailable {
                return Err(StorageError::Unavailable);
            }
            Ok(inner.entries.get(key).cloned())
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_inner(|inner| {
            if inner.unavailable {
                return Err(StorageError::Unavailable);
            }
            if inner.reject_writes {
                return Err(StorageError::Write("quota exceeded".to_owned()));
            }
            inner.entries.insert(key.to_owned(), value.to_owned());
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.with_inner(|inner| {
            if inner.unavailable {
                return Err(StorageError::Unavailable);
            }
            if inner.reject_writes {
                return Err(StorageError::Write("storage is read-only".to_owned()));
            }
            inner.entries.remove(key);
            Ok(())
        })
    }
}
