//! Field capture for developer embeds.
//!
//! Developer-embed forms report a submission with `{formGuid, accepted}` but
//! no field values, so values are captured as inputs change. `FieldCapture`
//! owns that cache; each router instance has its own.

use std::collections::HashMap;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use super::{canonical_key, FormData};

static PHONE_FORMATTING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\s\-().]").unwrap_or_else(|e| {
        panic!("Failed to compile phone formatting pattern: {e}. This is a programming error.")
    })
});

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+").unwrap_or_else(|e| {
        panic!("Failed to compile whitespace pattern: {e}. This is a programming error.")
    })
});

/// Kind of form control a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Radio,
    Hidden,
    Tel,
    Select,
    Textarea,
}

/// Snapshot of a form control at the moment its value is captured.
#[derive(Debug, Clone, Copy)]
pub struct CapturedInput<'a> {
    /// Control name (possibly prefixed, e.g. `0-1/email`)
    pub name: &'a str,
    /// Current control value
    pub value: &'a str,
    pub kind: InputKind,
    /// Text of the enclosing `<label>` (radio buttons)
    pub label: Option<&'a str>,
    /// Value of a hidden input sharing the radio's name
    pub hidden_mirror: Option<&'a str>,
}

impl<'a> CapturedInput<'a> {
    pub fn new(name: &'a str, value: &'a str, kind: InputKind) -> Self {
        Self {
            name,
            value,
            kind,
            label: None,
            hidden_mirror: None,
        }
    }

    fn is_phone(&self) -> bool {
        self.kind == InputKind::Tel || self.name.to_lowercase().contains("phone")
    }
}

/// HubSpot bookkeeping fields that never carry visitor answers.
fn is_internal_field(name: &str) -> bool {
    name == "hs_context" || name.starts_with("hs_") || name == "guid"
}

/// Accumulated values of form controls.
#[derive(Debug, Default)]
pub struct FieldCapture {
    data: FormData,
    previous: HashMap<String, String>,
}

impl FieldCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the value of one control.
    ///
    /// Radio buttons store their label text (the internal option id goes to
    /// `<name>_raw`), or the hidden mirror's value when one exists. Phone
    /// values also get a `<name>_clean` copy without formatting characters.
    ///
    /// Returns `false` when nothing changed or the field is internal.
    pub fn capture(&mut self, input: &CapturedInput<'_>) -> bool {
        if input.name.is_empty() {
            return false;
        }

        let key = input.name;
        let canonical = canonical_key(key);
        let mut value = input.value.to_string();

        if input.kind == InputKind::Radio {
            if let Some(label) = input.label {
                let label = WHITESPACE_RUN.replace_all(label, " ").trim().to_string();
                if !label.is_empty() {
                    value = label;
                }
            }
        }

        if self.previous.get(key) == Some(&value) {
            return false;
        }
        self.previous.insert(key.to_string(), value.clone());

        if is_internal_field(key) {
            return false;
        }

        self.data.insert_field(key, value.clone());

        if input.kind == InputKind::Radio {
            self.data.insert(format!("{key}_raw"), input.value);
            if !canonical.is_empty() && canonical != key {
                self.data.insert(format!("{canonical}_raw"), input.value);
            }
            if let Some(mirror) = input.hidden_mirror.filter(|m| !m.is_empty()) {
                self.data.insert_field(key, mirror);
                value = mirror.to_string();
            }
        }

        if !value.is_empty() {
            if input.is_phone() {
                let clean = PHONE_FORMATTING.replace_all(&value, "");
                if !clean.is_empty() {
                    self.data.insert(format!("{key}_clean"), clean.into_owned());
                }
                debug!("Captured phone: {} = {}", key, value);
            } else {
                debug!("Captured {:?}: {} = {}", input.kind, key, value);
            }
        }

        true
    }

    /// Overlays already-normalized values (e.g. a merged submission).
    pub fn absorb(&mut self, form: &FormData) {
        self.data = self.data.merged_with(form);
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
