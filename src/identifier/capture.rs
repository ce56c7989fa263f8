//! Landing-page click id capture.
//!
//! When a visitor arrives from an affiliate link the URL carries `ps_xid`
//! (and optionally `ps_partner_key`). These are sanitized and stored as
//! 90-day cookies; on later page views the existing cookies get their TTL
//! refreshed. Tracked pages also get `ps_xid` put back into their URL so
//! embedded forms can read it.

use log::{debug, info};
use serde::Serialize;
use url::Url;

use crate::config::{IDENTIFIER_COOKIE_MAX_AGE_SECS, PS_PARTNER_KEY, PS_XID, TRACKING_PAGES};
use crate::error_handling::{ErrorType, ProcessingStats};
use crate::scheduler::set_query_param;
use crate::storage::{get_cookie, BrowserStorage, CookieStore, KeyValueStore, SetCookie};
use crate::utils::sanitize::sanitize_tracking_param;

/// What a landing-page capture did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LandingCapture {
    /// Click id now stored in the `ps_xid` cookie, if any
    pub xid: Option<String>,
    /// Partner key now stored in the `ps_partner_key` cookie, if any
    pub partner_key: Option<String>,
    /// True when the click id came from the URL rather than existing storage
    pub from_url: bool,
}

fn query_param(url: &Url, name: &str) -> String {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| sanitize_tracking_param(&v))
        .unwrap_or_default()
}

fn identifier_cookie(name: &str, value: &str, domain: Option<&str>) -> SetCookie {
    SetCookie::new(name, value)
        .max_age(IDENTIFIER_COOKIE_MAX_AGE_SECS)
        .cross_page()
        .domain(domain)
}

/// Stores or refreshes the click id and partner key cookies.
///
/// Order of preference for `ps_xid`: URL query, existing cookie, local
/// storage. A URL value is also mirrored to local storage. Storage failures
/// are counted and skipped.
pub fn capture_from_landing_url(
    url: &Url,
    storage: &BrowserStorage,
    cookie_domain: Option<&str>,
    stats: &ProcessingStats,
) -> LandingCapture {
    let mut report = LandingCapture::default();
    let write = |name: &str, value: &str| {
        if let Err(e) = storage
            .cookies
            .set_cookie(&identifier_cookie(name, value, cookie_domain))
        {
            debug!("Failed to write {} cookie: {}", name, e);
            stats.increment_error(ErrorType::StorageWriteError);
        }
    };
    let read_cookie = |name: &str| match get_cookie(storage.cookies.as_ref(), name) {
        Ok(value) => value.filter(|v| !v.is_empty()),
        Err(e) => {
            debug!("Failed to read {} cookie: {}", name, e);
            stats.increment_error(ErrorType::StorageReadError);
            None
        }
    };

    let xid = query_param(url, PS_XID);
    if !xid.is_empty() {
        write(PS_XID, &xid);
        if let Err(e) = storage.local.set_item(PS_XID, &xid) {
            debug!("Failed to mirror ps_xid to {}: {}", storage.local.backend(), e);
            stats.increment_error(ErrorType::StorageWriteError);
        }
        info!("Captured click id from landing URL");
        report.xid = Some(xid);
        report.from_url = true;
    } else if let Some(existing) = read_cookie(PS_XID) {
        write(PS_XID, &existing);
        report.xid = Some(existing);
    } else {
        match storage.local.get_item(PS_XID) {
            Ok(Some(stored)) if !stored.is_empty() => {
                write(PS_XID, &stored);
                report.xid = Some(stored);
            }
            Ok(_) => {}
            Err(e) => {
                debug!("Failed to read ps_xid from {}: {}", storage.local.backend(), e);
                stats.increment_error(ErrorType::StorageReadError);
            }
        }
    }

    let partner_key = query_param(url, PS_PARTNER_KEY);
    if !partner_key.is_empty() {
        write(PS_PARTNER_KEY, &partner_key);
        report.partner_key = Some(partner_key);
    } else if let Some(existing) = read_cookie(PS_PARTNER_KEY) {
        write(PS_PARTNER_KEY, &existing);
        report.partner_key = Some(existing);
    }

    report
}

/// Returns `url` with the stored `ps_xid` appended, when the page should be
/// tracked and the URL lacks it.
///
/// A page is tracked when it hosts a HubSpot form or its path contains one
/// of the tracking page prefixes. Returns `None` when no change is needed.
pub fn ensure_xid_in_url(url: &Url, has_hubspot_form: bool, storage: &BrowserStorage) -> Option<Url> {
    let path = url.path().to_lowercase();
    let tracked = has_hubspot_form || TRACKING_PAGES.iter().any(|p| path.contains(p));
    if !tracked {
        return None;
    }

    if url.query_pairs().any(|(k, v)| k == PS_XID && !v.is_empty()) {
        return None;
    }

    let stored = get_cookie(storage.cookies.as_ref(), PS_XID)
        .ok()
        .flatten()
        .or_else(|| storage.local.get_item(PS_XID).ok().flatten())
        .filter(|v| !v.is_empty())?;

    let mut updated = url.clone();
    set_query_param(&mut updated, PS_XID, &stored);
    Some(updated)
}
