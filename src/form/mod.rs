//! Flat form-data maps.
//!
//! HubSpot reports the same logical field under several keys (`email`,
//! `0-1/email`, ...). `FormData` keeps every key it was given and also
//! registers each value under its canonical key, the last `/` segment.

mod capture;
mod normalize;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use capture::{CapturedInput, FieldCapture, InputKind};
pub use normalize::{normalize_form_data, RawPayload};

/// Returns the canonical form of a field key: everything after the last `/`.
///
/// ```
/// use scheduler_router::form::canonical_key;
///
/// assert_eq!(canonical_key("0-1/email"), "email");
/// assert_eq!(canonical_key("email"), "email");
/// ```
pub fn canonical_key(key: &str) -> &str {
    match key.rfind('/') {
        Some(idx) => &key[idx + 1..],
        None => key,
    }
}

/// Flat string-keyed form values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(BTreeMap<String, String>);

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value under `key` and, if different, under its canonical key.
    ///
    /// Empty keys are ignored.
    pub fn insert_field(&mut self, key: &str, value: impl Into<String>) {
        if key.is_empty() {
            return;
        }
        let value = value.into();
        let canonical = canonical_key(key);
        if !canonical.is_empty() && canonical != key {
            self.0.insert(canonical.to_string(), value.clone());
        }
        self.0.insert(key.to_string(), value);
    }

    /// Inserts a value under exactly `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Raw lookup; may return an empty string.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Lookup that treats empty values as absent.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// True if `key` holds a non-empty value.
    pub fn has(&self, key: &str) -> bool {
        self.get_non_empty(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlays `other` on top of `self`; keys in `other` win.
    pub fn merged_with(&self, other: &FormData) -> FormData {
        let mut out = self.clone();
        out.0
            .extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        FormData(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
