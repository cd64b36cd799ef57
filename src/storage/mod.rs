mod run_store;

pub(crate) use run_store::{RunStore, RUNS_KEY};

use serde::{Deserialize, Serialize};
#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(test)]
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub(crate) enum StorageError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("storage rejected the write: {0}")]
    WriteRejected(String),
    #[error("stored data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// String key/value persistence. Implemented over Web Storage in the browser
/// and over a map in tests.
pub(crate) trait KeyValueBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WebStorageKind {
    Local,
    Session,
}

/// `window.localStorage` / `window.sessionStorage`.
///
/// The `Storage` object is looked up on every call so the adapter stays
/// `Send + Sync`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct WebStorage {
    kind: WebStorageKind,
}

impl WebStorage {
    pub fn local() -> Self {
        Self {
            kind: WebStorageKind::Local,
        }
    }

    pub fn session() -> Self {
        Self {
            kind: WebStorageKind::Session,
        }
    }

    fn storage(&self) -> Result<web_sys::Storage, StorageError> {
        let window = web_sys::window().ok_or(StorageError::Unavailable)?;
        let storage = match self.kind {
            WebStorageKind::Local => window.local_storage(),
            WebStorageKind::Session => window.session_storage(),
        };
        storage.ok().flatten().ok_or(StorageError::Unavailable)
    }
}

impl KeyValueBackend for WebStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage()?
            .get_item(key)
            .map_err(|_| StorageError::Unavailable)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // Quota and permission failures surface here as a JS exception.
        self.storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::WriteRejected(format!("{e:?}")))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| StorageError::WriteRejected(format!("{e:?}")))
    }
}

/// In-process backend. Writes can be switched off to mimic a full quota.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
    reject_writes: AtomicBool,
}

#[cfg(test)]
impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }
}

#[cfg(test)]
impl KeyValueBackend for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().map_err(|_| StorageError::Unavailable)?;
        Ok(items.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StorageError::WriteRejected("quota exceeded".to_string()));
        }
        let mut items = self.items.lock().map_err(|_| StorageError::Unavailable)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StorageError::WriteRejected("quota exceeded".to_string()));
        }
        let mut items = self.items.lock().map_err(|_| StorageError::Unavailable)?;
        items.remove(key);
        Ok(())
    }
}

pub(crate) fn load_json<T: for<'de> Deserialize<'de>>(
    backend: &dyn KeyValueBackend,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match backend.get(key)? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

pub(crate) fn save_json<T: Serialize>(
    backend: &dyn KeyValueBackend,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value)?;
    backend.set(key, &json)
}
