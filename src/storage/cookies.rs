//! Cookie jar access.
//!
//! Reads follow `document.cookie` semantics (a `name=value; name2=value2`
//! string); writes take a [`SetCookie`] with the attributes to apply.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error_handling::StorageError;

const BACKEND: &str = "cookie jar";

/// A cookie write with its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    /// Value as it will appear in the header (already encoded)
    pub value: String,
    pub path: Option<String>,
    pub max_age_secs: Option<u64>,
    pub domain: Option<String>,
    pub same_site_lax: bool,
    pub secure: bool,
}

impl SetCookie {
    /// Cookie whose value is percent-encoded (`encodeURIComponent`).
    pub fn new(name: &str, value: &str) -> Self {
        Self::raw(name, &urlencoding::encode(value))
    }

    /// Cookie whose value is written verbatim; the caller guarantees it is
    /// cookie-safe (e.g. base64).
    pub fn raw(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            path: Some("/".to_string()),
            max_age_secs: None,
            domain: None,
            same_site_lax: false,
            secure: false,
        }
    }

    pub fn max_age(mut self, secs: u64) -> Self {
        self.max_age_secs = Some(secs);
        self
    }

    pub fn domain(mut self, domain: Option<&str>) -> Self {
        self.domain = domain.filter(|d| !d.is_empty()).map(str::to_string);
        self
    }

    /// `SameSite=Lax; Secure`
    pub fn cross_page(mut self) -> Self {
        self.same_site_lax = true;
        self.secure = true;
        self
    }

    /// Renders the `document.cookie` assignment string.
    pub fn to_header_string(&self) -> String {
        let mut parts = vec![format!("{}={}", self.name, self.value)];
        if let Some(path) = &self.path {
            parts.push(format!("path={path}"));
        }
        if let Some(max_age) = self.max_age_secs {
            parts.push(format!("max-age={max_age}"));
        }
        if self.same_site_lax {
            parts.push("SameSite=Lax".to_string());
        }
        if self.secure {
            parts.push("Secure".to_string());
        }
        if let Some(domain) = &self.domain {
            parts.push(format!("Domain={domain}"));
        }
        parts.join("; ")
    }
}

/// Access to the page's cookies.
pub trait CookieStore {
    /// All visible cookies as `name=value` pairs joined by `; `.
    fn cookie_string(&self) -> Result<String, StorageError>;

    fn set_cookie(&self, cookie: &SetCookie) -> Result<(), StorageError>;
}

/// Extracts and decodes one cookie from a cookie string.
///
/// Empty values are treated as absent. Values that are not valid
/// percent-encoding are returned verbatim.
pub fn parse_cookie(cookie_string: &str, name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    cookie_string
        .split(';')
        .map(str::trim)
        .filter_map(|c| c.strip_prefix(name)?.strip_prefix('='))
        .find(|v| !v.is_empty())
        .map(|v| {
            urlencoding::decode(v)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| v.to_string())
        })
}

/// Reads one cookie from a store.
pub fn get_cookie(store: &dyn CookieStore, name: &str) -> Result<Option<String>, StorageError> {
    Ok(parse_cookie(&store.cookie_string()?, name))
}

/// In-memory cookie jar.
///
/// Keeps every write it receives so callers can inspect the attributes that
/// would have been sent to the browser.
#[derive(Debug)]
pub struct MemoryCookieJar {
    cookies: Mutex<BTreeMap<String, String>>,
    writes: Mutex<Vec<SetCookie>>,
    available: AtomicBool,
}

impl Default for MemoryCookieJar {
    fn default() -> Self {
        Self {
            cookies: Mutex::new(BTreeMap::new()),
            writes: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the jar from a `document.cookie` style string.
    pub fn from_cookie_string(cookie_string: &str) -> Self {
        let jar = Self::new();
        if let Ok(mut cookies) = jar.cookies.lock() {
            for pair in cookie_string.split(';').map(str::trim) {
                if let Some((name, value)) = pair.split_once('=') {
                    if !name.is_empty() {
                        cookies.insert(name.to_string(), value.to_string());
                    }
                }
            }
        }
        jar
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Writes received so far, oldest first.
    pub fn writes(&self) -> Vec<SetCookie> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable { backend: BACKEND })
        }
    }
}

impl CookieStore for MemoryCookieJar {
    fn cookie_string(&self) -> Result<String, StorageError> {
        self.check_available()?;
        let cookies = self
            .cookies
            .lock()
            .map_err(|_| StorageError::Unavailable { backend: BACKEND })?;
        Ok(cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; "))
    }

    fn set_cookie(&self, cookie: &SetCookie) -> Result<(), StorageError> {
        self.check_available()?;
        let mut cookies = self
            .cookies
            .lock()
            .map_err(|_| StorageError::Unavailable { backend: BACKEND })?;
        if cookie.max_age_secs == Some(0) {
            cookies.remove(&cookie.name);
        } else {
            cookies.insert(cookie.name.clone(), cookie.value.clone());
        }
        if let Ok(mut writes) = self.writes.lock() {
            writes.push(cookie.clone());
        }
        Ok(())
    }
}
