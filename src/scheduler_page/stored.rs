//! Reading the routing data a submission left for the scheduler page.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::{
    FALLBACK_FORM_DATA_COOKIE, FALLBACK_SCHEDULER_COOKIE, FORM_DATA_KEY, ROUTER_DATA_KEY,
};
use crate::error_handling::{ErrorType, ProcessingStats, StorageError};
use crate::form::FormData;
use crate::storage::{get_cookie, BrowserStorage, CookieStore, KeyValueStore, SetCookie};

/// Where stored routing data was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StoredSource {
    #[serde(rename = "localStorage")]
    LocalStorage,
    #[serde(rename = "sessionStorage")]
    SessionStorage,
    #[serde(rename = "cookies")]
    Cookies,
}

/// Form data recovered on the scheduler page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFormData {
    pub form_data: FormData,
    /// Destination tag chosen at submission time; local storage does not
    /// carry one
    pub scheduler_type: Option<String>,
    pub source: StoredSource,
}

/// Session blob as read back; only the fields the page needs.
#[derive(Debug, Deserialize)]
struct StoredRouterRecord {
    scheduler_type: Option<String>,
    #[serde(rename = "formData", default)]
    form_data: FormData,
}

fn parse_json<T: serde::de::DeserializeOwned>(key: &str, raw: &[u8]) -> Result<T, StorageError> {
    serde_json::from_slice(raw).map_err(|e| StorageError::Serialization {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn from_local(store: &dyn KeyValueStore) -> Result<Option<StoredFormData>, StorageError> {
    let Some(raw) = store.get_item(FORM_DATA_KEY)?.filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    Ok(Some(StoredFormData {
        form_data: parse_json(FORM_DATA_KEY, raw.as_bytes())?,
        scheduler_type: None,
        source: StoredSource::LocalStorage,
    }))
}

/// Reads the session blob and removes it; it is meant for one page view.
fn take_from_session(
    store: &dyn KeyValueStore,
    stats: &ProcessingStats,
) -> Result<Option<StoredFormData>, StorageError> {
    let Some(raw) = store.get_item(ROUTER_DATA_KEY)?.filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let record: StoredRouterRecord = parse_json(ROUTER_DATA_KEY, raw.as_bytes())?;
    if let Err(e) = store.remove_item(ROUTER_DATA_KEY) {
        debug!("Failed to clear {}: {}", ROUTER_DATA_KEY, e);
        stats.increment_error(ErrorType::StorageWriteError);
    }
    Ok(Some(StoredFormData {
        form_data: record.form_data,
        scheduler_type: record.scheduler_type,
        source: StoredSource::SessionStorage,
    }))
}

/// Reads the fallback cookies and expires both once they decode.
fn take_from_cookies(
    cookies: &dyn CookieStore,
    stats: &ProcessingStats,
) -> Result<Option<StoredFormData>, StorageError> {
    let scheduler_type = get_cookie(cookies, FALLBACK_SCHEDULER_COOKIE)?;
    let encoded = get_cookie(cookies, FALLBACK_FORM_DATA_COOKIE)?;
    if scheduler_type.is_none() && encoded.is_none() {
        return Ok(None);
    }

    let form_data = match encoded {
        Some(encoded) => {
            let decoded = BASE64.decode(encoded.as_bytes()).map_err(|e| {
                StorageError::Serialization {
                    key: FALLBACK_FORM_DATA_COOKIE.to_string(),
                    reason: e.to_string(),
                }
            })?;
            parse_json(FALLBACK_FORM_DATA_COOKIE, &decoded)?
        }
        None => FormData::new(),
    };

    for name in [FALLBACK_SCHEDULER_COOKIE, FALLBACK_FORM_DATA_COOKIE] {
        if let Err(e) = cookies.set_cookie(&SetCookie::raw(name, "").max_age(0)) {
            debug!("Failed to expire cookie {}: {}", name, e);
            stats.increment_error(ErrorType::StorageWriteError);
        }
    }

    Ok(Some(StoredFormData {
        form_data,
        scheduler_type,
        source: StoredSource::Cookies,
    }))
}

/// Recovers the form data a routed submission persisted.
///
/// Sources are tried in order: `hubspot_form_data` in local storage, the
/// `scheduler_router_data` session blob (removed after reading), then the
/// `scheduler_type`/`form_data` fallback cookies (expired after reading). A
/// source that fails or holds undecodable data is skipped.
///
/// # Arguments
///
/// * `storage` - The page's storage backends
/// * `stats` - Counters for storage failures
///
/// # Returns
///
/// The first source that holds data, or `None`.
pub fn load_stored_form_data(
    storage: &BrowserStorage,
    stats: &ProcessingStats,
) -> Option<StoredFormData> {
    let stored = settle(FORM_DATA_KEY, from_local(storage.local.as_ref()), stats)
        .or_else(|| {
            settle(
                ROUTER_DATA_KEY,
                take_from_session(storage.session.as_ref(), stats),
                stats,
            )
        })
        .or_else(|| {
            settle(
                FALLBACK_FORM_DATA_COOKIE,
                take_from_cookies(storage.cookies.as_ref(), stats),
                stats,
            )
        });

    match &stored {
        Some(found) => info!("Found stored form data in {:?}", found.source),
        None => debug!("No stored form data found"),
    }
    stored
}

fn settle(
    key: &str,
    result: Result<Option<StoredFormData>, StorageError>,
    stats: &ProcessingStats,
) -> Option<StoredFormData> {
    result.unwrap_or_else(|e| {
        debug!("Skipping stored `{}`: {}", key, e);
        stats.increment_error(ErrorType::StorageReadError);
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryCookieJar, MemoryStore};
    use std::sync::Arc;

    struct Page {
        session: Arc<MemoryStore>,
        local: Arc<MemoryStore>,
        jar: Arc<MemoryCookieJar>,
        storage: BrowserStorage,
    }

    fn page(cookie_string: &str) -> Page {
        let session = Arc::new(MemoryStore::session());
        let local = Arc::new(MemoryStore::local());
        let jar = Arc::new(MemoryCookieJar::from_cookie_string(cookie_string));
        let storage = BrowserStorage::new(session.clone(), local.clone(), jar.clone());
        Page {
            session,
            local,
            jar,
            storage,
        }
    }

    #[test]
    fn test_local_storage_wins_and_is_kept() {
        let p = page("");
        p.local
            .set_item(FORM_DATA_KEY, r#"{"email":"local@b.com"}"#)
            .expect("seed");
        p.session
            .set_item(ROUTER_DATA_KEY, r#"{"scheduler_type":"general","formData":{}}"#)
            .expect("seed");

        let stored = load_stored_form_data(&p.storage, &ProcessingStats::new()).expect("found");
        assert_eq!(stored.source, StoredSource::LocalStorage);
        assert_eq!(stored.form_data.get("email"), Some("local@b.com"));
        assert_eq!(stored.scheduler_type, None);
        assert!(p.local.get_item(FORM_DATA_KEY).expect("read").is_some());
        assert!(p.session.get_item(ROUTER_DATA_KEY).expect("read").is_some());
    }

    #[test]
    fn test_session_blob_is_removed_after_read() {
        let p = page("");
        p.session
            .set_item(
                ROUTER_DATA_KEY,
                r#"{"scheduler_type":"general","formData":{"email":"s@b.com"},"timestamp":1,"source":"hubspot_form"}"#,
            )
            .expect("seed");

        let stats = ProcessingStats::new();
        let stored = load_stored_form_data(&p.storage, &stats).expect("found");
        assert_eq!(stored.source, StoredSource::SessionStorage);
        assert_eq!(stored.scheduler_type.as_deref(), Some("general"));
        assert_eq!(stored.form_data.get("email"), Some("s@b.com"));
        assert_eq!(p.session.get_item(ROUTER_DATA_KEY), Ok(None));
        assert!(load_stored_form_data(&p.storage, &stats).is_none());
    }

    #[test]
    fn test_cookies_decoded_then_expired() {
        let encoded = BASE64.encode(r#"{"email":"c@b.com"}"#);
        let p = page(&format!("scheduler_type=general; form_data={encoded}"));

        let stored = load_stored_form_data(&p.storage, &ProcessingStats::new()).expect("found");
        assert_eq!(stored.source, StoredSource::Cookies);
        assert_eq!(stored.scheduler_type.as_deref(), Some("general"));
        assert_eq!(stored.form_data.get("email"), Some("c@b.com"));

        let expired: Vec<String> = p
            .jar
            .writes()
            .iter()
            .filter(|c| c.max_age_secs == Some(0))
            .map(|c| c.to_header_string())
            .collect();
        assert_eq!(
            expired,
            vec!["scheduler_type=; path=/; max-age=0", "form_data=; path=/; max-age=0"]
        );
        assert_eq!(p.jar.cookie_string(), Ok(String::new()));
    }

    #[test]
    fn test_scheduler_cookie_alone_is_enough() {
        let p = page("scheduler_type=general");
        let stored = load_stored_form_data(&p.storage, &ProcessingStats::new()).expect("found");
        assert_eq!(stored.source, StoredSource::Cookies);
        assert!(stored.form_data.is_empty());
    }

    #[test]
    fn test_bad_sources_are_skipped() {
        let p = page("form_data=%%%not-base64");
        p.local.set_item(FORM_DATA_KEY, "{not json").expect("seed");
        p.session.set_available(false);

        let stats = ProcessingStats::new();
        assert!(load_stored_form_data(&p.storage, &stats).is_none());
        assert_eq!(stats.get_error_count(ErrorType::StorageReadError), 3);
        // Undecodable cookies are left in place.
        assert!(p.jar.writes().is_empty());
    }

    #[test]
    fn test_nothing_stored() {
        let p = page("ps_xid=abc");
        let stats = ProcessingStats::new();
        assert!(load_stored_form_data(&p.storage, &stats).is_none());
        assert_eq!(stats.total_errors(), 0);
    }
}
