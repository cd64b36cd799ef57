use crate::storage::{KeyValueBackend, StorageError};
use std::sync::Arc;

pub(crate) const TOKEN_KEY: &str = "authToken";
pub(crate) const USER_NAME_KEY: &str = "userName";

/// Holder of the current user's token and display name for the lifetime of
/// the browser session.
///
/// Constructed once and handed to the router and pages; nothing reads
/// session storage behind its back. There is no change notification:
/// whoever mutates it re-renders afterwards.
#[derive(Clone)]
pub(crate) struct Session {
    backend: Arc<dyn KeyValueBackend>,
}

impl Session {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(v) => v.filter(|s| !s.is_empty()),
            Err(e) => {
                leptos::logging::warn!("[session] read {key} failed: {e}");
                None
            }
        }
    }

    pub fn set_session(&self, token: &str, name: &str) -> Result<(), StorageError> {
        self.backend.set(TOKEN_KEY, token)?;
        self.backend.set(USER_NAME_KEY, name)
    }

    pub fn token(&self) -> Option<String> {
        self.read(TOKEN_KEY)
    }

    pub fn name(&self) -> Option<String> {
        self.read(USER_NAME_KEY)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn clear_session(&self) {
        for key in [TOKEN_KEY, USER_NAME_KEY] {
            if let Err(e) = self.backend.remove(key) {
                leptos::logging::warn!("[session] remove {key} failed: {e}");
            }
        }
    }
}
