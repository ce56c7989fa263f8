//! Click id lookup.
//!
//! The affiliate click id can live in several places depending on which
//! script saw it first. Sources are consulted in a fixed priority order and
//! the first usable value wins. A failing source never aborts the lookup.

mod capture;

use std::sync::Arc;

use log::debug;

use crate::config::{
    IDENTIFIER_COOKIE_KEYS, IDENTIFIER_STORAGE_KEYS, PARTNERSTACK_FIELD_NAME, SENTINEL_VALUES,
};
use crate::error_handling::{ErrorType, ProcessingStats, StorageError};
use crate::storage::{get_cookie, BrowserStorage, CookieStore, KeyValueStore};

pub use capture::{capture_from_landing_url, ensure_xid_in_url, LandingCapture};

/// True for non-empty values that are not placeholder strings.
pub fn is_usable_identifier(value: &str) -> bool {
    !value.is_empty() && !SENTINEL_VALUES.contains(&value)
}

/// One place an identifier may be stored.
pub trait IdentifierSource {
    /// Source name for logs.
    fn name(&self) -> &'static str;

    /// Candidate values in this source's own priority order.
    fn candidates(&self) -> Result<Vec<String>, StorageError>;
}

/// A value already held in page memory (e.g. set by the affiliate script).
#[derive(Debug, Clone)]
pub struct GlobalValue(pub Option<String>);

impl IdentifierSource for GlobalValue {
    fn name(&self) -> &'static str {
        "page global"
    }

    fn candidates(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.0.iter().cloned().collect())
    }
}

/// Session or local storage, checked under several keys.
pub struct StorageSource {
    store: Arc<dyn KeyValueStore>,
    keys: &'static [&'static str],
}

impl StorageSource {
    pub fn new(store: Arc<dyn KeyValueStore>, keys: &'static [&'static str]) -> Self {
        Self { store, keys }
    }
}

impl IdentifierSource for StorageSource {
    fn name(&self) -> &'static str {
        self.store.backend()
    }

    fn candidates(&self) -> Result<Vec<String>, StorageError> {
        let mut out = Vec::new();
        for key in self.keys {
            if let Some(value) = self.store.get_item(key)? {
                out.push(value);
            }
        }
        Ok(out)
    }
}

/// The cookie jar, checked under several cookie names.
pub struct CookieSource {
    jar: Arc<dyn CookieStore + Send + Sync>,
    keys: &'static [&'static str],
}

impl CookieSource {
    pub fn new(jar: Arc<dyn CookieStore + Send + Sync>, keys: &'static [&'static str]) -> Self {
        Self { jar, keys }
    }
}

impl IdentifierSource for CookieSource {
    fn name(&self) -> &'static str {
        "cookie"
    }

    fn candidates(&self) -> Result<Vec<String>, StorageError> {
        let mut out = Vec::new();
        for key in self.keys {
            if let Some(value) = get_cookie(self.jar.as_ref(), key)? {
                out.push(value);
            }
        }
        Ok(out)
    }
}

/// The standard lookup order: page global → session storage → local
/// storage → cookies.
pub fn standard_sources(
    storage: &BrowserStorage,
    global: Option<String>,
) -> Vec<Box<dyn IdentifierSource>> {
    vec![
        Box::new(GlobalValue(global)),
        Box::new(StorageSource::new(
            Arc::clone(&storage.session),
            IDENTIFIER_STORAGE_KEYS,
        )),
        Box::new(StorageSource::new(
            Arc::clone(&storage.local),
            IDENTIFIER_STORAGE_KEYS,
        )),
        Box::new(CookieSource::new(
            Arc::clone(&storage.cookies),
            IDENTIFIER_COOKIE_KEYS,
        )),
    ]
}

/// Returns the first usable identifier across `sources`.
///
/// Source failures are logged, counted as `StorageReadError` and skipped.
/// Never returns an empty string, `"undefined"` or `"null"`.
pub fn resolve_identifier(
    sources: &[Box<dyn IdentifierSource>],
    stats: &ProcessingStats,
) -> Option<String> {
    for source in sources {
        match source.candidates() {
            Ok(candidates) => {
                if let Some(found) = candidates.into_iter().find(|v| is_usable_identifier(v)) {
                    debug!("Resolved click id from {}: {}", source.name(), found);
                    return Some(found);
                }
            }
            Err(e) => {
                debug!("{} access error for click id: {}", source.name(), e);
                stats.increment_error(ErrorType::StorageReadError);
            }
        }
    }
    None
}

/// Best-effort write of the identifier to session and local storage.
///
/// Returns the number of stores that accepted the write.
pub fn persist_identifier(storage: &BrowserStorage, id: &str, stats: &ProcessingStats) -> usize {
    let mut written = 0;
    for store in [&storage.session, &storage.local] {
        match store.set_item(PARTNERSTACK_FIELD_NAME, id) {
            Ok(()) => written += 1,
            Err(e) => {
                debug!("Failed to persist click id in {}: {}", store.backend(), e);
                stats.increment_error(ErrorType::StorageWriteError);
            }
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryCookieJar, MemoryStore};

    fn storage_with(
        session: &[(&str, &str)],
        local: &[(&str, &str)],
        cookies: &str,
    ) -> (BrowserStorage, Arc<MemoryStore>, Arc<MemoryStore>) {
        let s = Arc::new(MemoryStore::session());
        let l = Arc::new(MemoryStore::local());
        for (k, v) in session {
            s.set_item(k, v).expect("seed session");
        }
        for (k, v) in local {
            l.set_item(k, v).expect("seed local");
        }
        let storage = BrowserStorage::new(
            s.clone(),
            l.clone(),
            Arc::new(MemoryCookieJar::from_cookie_string(cookies)),
        );
        (storage, s, l)
    }

    #[test]
    fn test_session_beats_cookie() {
        let (storage, _, _) = storage_with(&[("ps_xid", "sess1")], &[], "ps_xid=cook2");
        let stats = ProcessingStats::new();
        assert_eq!(
            resolve_identifier(&standard_sources(&storage, None), &stats),
            Some("sess1".to_string())
        );
    }

    #[test]
    fn test_priority_order() {
        let (storage, _, _) = storage_with(
            &[("ps_xid", "sess")],
            &[("ps_xid", "local")],
            "ps_xid=cookie",
        );
        let stats = ProcessingStats::new();
        assert_eq!(
            resolve_identifier(&standard_sources(&storage, Some("global".into())), &stats),
            Some("global".to_string())
        );

        let (storage, _, _) = storage_with(&[], &[("psx_id", "local")], "ps_xid=cookie");
        assert_eq!(
            resolve_identifier(&standard_sources(&storage, None), &stats),
            Some("local".to_string())
        );

        let (storage, _, _) = storage_with(&[], &[], "psx_id=cookie");
        assert_eq!(
            resolve_identifier(&standard_sources(&storage, None), &stats),
            Some("cookie".to_string())
        );
    }

    #[test]
    fn test_sentinels_are_skipped() {
        let (storage, _, _) = storage_with(
            &[("partnerstack_click_id", "undefined"), ("ps_xid", "null")],
            &[("ps_xid", "")],
            "ps_xid=real",
        );
        let stats = ProcessingStats::new();
        assert_eq!(
            resolve_identifier(&standard_sources(&storage, Some("null".into())), &stats),
            Some("real".to_string())
        );
    }

    #[test]
    fn test_failing_sources_are_skipped() {
        let (storage, session, local) =
            storage_with(&[("ps_xid", "sess")], &[("ps_xid", "local")], "ps_xid=cookie");
        session.set_available(false);
        local.set_available(false);
        let stats = ProcessingStats::new();
        assert_eq!(
            resolve_identifier(&standard_sources(&storage, None), &stats),
            Some("cookie".to_string())
        );
        assert_eq!(stats.get_error_count(ErrorType::StorageReadError), 2);
    }

    #[test]
    fn test_all_sources_failing_returns_none() {
        let session = Arc::new(MemoryStore::session());
        let local = Arc::new(MemoryStore::local());
        let jar = Arc::new(MemoryCookieJar::from_cookie_string("ps_xid=cookie"));
        session.set_available(false);
        local.set_available(false);
        jar.set_available(false);
        let storage = BrowserStorage::new(session, local, jar);
        let stats = ProcessingStats::new();
        assert_eq!(resolve_identifier(&standard_sources(&storage, None), &stats), None);
        assert_eq!(stats.get_error_count(ErrorType::StorageReadError), 3);
    }

    #[test]
    fn test_persist_identifier_is_best_effort() {
        let (storage, session, local) = storage_with(&[], &[], "");
        local.set_available(false);
        let stats = ProcessingStats::new();
        assert_eq!(persist_identifier(&storage, "xid", &stats), 1);
        assert_eq!(
            session.get_item("partnerstack_click_id"),
            Ok(Some("xid".to_string()))
        );
        assert_eq!(stats.get_error_count(ErrorType::StorageWriteError), 1);
    }

    #[test]
    fn test_is_usable_identifier() {
        assert!(is_usable_identifier("abc"));
        assert!(!is_usable_identifier(""));
        assert!(!is_usable_identifier("undefined"));
        assert!(!is_usable_identifier("null"));
    }
}
