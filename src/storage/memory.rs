//! In-memory session/local storage.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::KeyValueStore;
use crate::error_handling::StorageError;

/// `Storage`-like key/value store held in memory.
///
/// Can be switched off to behave like storage disabled by the browser, and
/// can enforce a byte quota on the total size of keys and values.
#[derive(Debug)]
pub struct MemoryStore {
    backend: &'static str,
    items: Mutex<BTreeMap<String, String>>,
    available: AtomicBool,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new(backend: &'static str) -> Self {
        Self {
            backend,
            items: Mutex::new(BTreeMap::new()),
            available: AtomicBool::new(true),
            quota_bytes: None,
        }
    }

    /// A store named `sessionStorage`.
    pub fn session() -> Self {
        Self::new("sessionStorage")
    }

    /// A store named `localStorage`.
    pub fn local() -> Self {
        Self::new("localStorage")
    }

    /// Limits the total size of stored keys and values.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }

    /// Enables or disables every operation on the store.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn items(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, StorageError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable {
                backend: self.backend,
            });
        }
        self.items.lock().map_err(|_| StorageError::Unavailable {
            backend: self.backend,
        })
    }
}

impl KeyValueStore for MemoryStore {
    fn backend(&self) -> &'static str {
        self.backend
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items()?;
        if let Some(quota) = self.quota_bytes {
            let used: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    backend: self.backend,
                    key: key.to_string(),
                });
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_and_remove() {
        let store = MemoryStore::session();
        assert_eq!(store.get_item("ps_xid"), Ok(None));
        store.set_item("ps_xid", "abc").expect("set");
        assert_eq!(store.get_item("ps_xid"), Ok(Some("abc".to_string())));
        store.remove_item("ps_xid").expect("remove");
        assert_eq!(store.get_item("ps_xid"), Ok(None));
    }

    #[test]
    fn test_disabled_store_errors() {
        let store = MemoryStore::local();
        store.set_available(false);
        assert_eq!(
            store.get_item("ps_xid"),
            Err(StorageError::Unavailable {
                backend: "localStorage"
            })
        );
        assert!(store.set_item("ps_xid", "abc").is_err());
        store.set_available(true);
        assert!(store.set_item("ps_xid", "abc").is_ok());
    }

    #[test]
    fn test_quota_counts_existing_items() {
        let store = MemoryStore::session().with_quota(10);
        store.set_item("a", "12345").expect("fits");
        // Replacing the same key frees its previous size.
        store.set_item("a", "123456789").expect("replacement fits");
        assert!(matches!(
            store.set_item("b", "1"),
            Err(StorageError::QuotaExceeded { .. })
        ));
    }
}
