//! Browser storage abstractions.
//!
//! This module provides:
//! - `KeyValueStore`: session/local storage (`getItem`/`setItem`/`removeItem`)
//! - `CookieStore`: the page cookie jar
//! - In-memory implementations of both
//! - `BrowserStorage`: the three backends a page script can reach
//!
//! Every operation is fallible because browsers disable storage in private
//! modes or when quotas are hit. Callers treat failures as absent values.

mod cookies;
mod memory;

use std::sync::Arc;

use serde::Serialize;

use crate::error_handling::StorageError;

pub use cookies::{get_cookie, parse_cookie, CookieStore, MemoryCookieJar, SetCookie};
pub use memory::MemoryStore;

/// `Storage`-like key/value backend.
pub trait KeyValueStore: Send + Sync {
    /// Backend name used in logs and errors.
    fn backend(&self) -> &'static str;

    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Serializes `value` as JSON and stores it under `key`.
pub fn write_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value).map_err(|e| StorageError::Serialization {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    store.set_item(key, &json)
}

/// Session storage, local storage and cookies of one page.
#[derive(Clone)]
pub struct BrowserStorage {
    pub session: Arc<dyn KeyValueStore>,
    pub local: Arc<dyn KeyValueStore>,
    pub cookies: Arc<dyn CookieStore + Send + Sync>,
}

impl BrowserStorage {
    pub fn new(
        session: Arc<dyn KeyValueStore>,
        local: Arc<dyn KeyValueStore>,
        cookies: Arc<dyn CookieStore + Send + Sync>,
    ) -> Self {
        Self {
            session,
            local,
            cookies,
        }
    }

    /// Fresh, empty in-memory backends.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::session()),
            Arc::new(MemoryStore::local()),
            Arc::new(MemoryCookieJar::new()),
        )
    }
}

impl std::fmt::Debug for BrowserStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserStorage")
            .field("session", &self.session.backend())
            .field("local", &self.local.backend())
            .finish_non_exhaustive()
    }
}
