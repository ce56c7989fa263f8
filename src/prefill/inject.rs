//! Identifier injection into form inputs.

use log::{debug, warn};

use crate::config::IDENTIFIER_STORAGE_KEYS;
use crate::error_handling::{ErrorType, FieldError, ProcessingStats};
use crate::form::{CapturedInput, FieldCapture, InputKind};

/// Synthetic events fired after a programmatic value change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEvent {
    Input,
    Change,
}

impl FieldEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldEvent::Input => "input",
            FieldEvent::Change => "change",
        }
    }
}

/// A form input the host exposes for prefill.
pub trait FormField {
    fn name(&self) -> &str;

    fn value(&self) -> &str;

    fn set_value(&mut self, value: &str);

    /// Fires a bubbling event so form validation sees the new value.
    fn dispatch(&mut self, event: FieldEvent) -> Result<(), FieldError>;
}

impl<T: FormField + ?Sized> FormField for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn value(&self) -> &str {
        (**self).value()
    }

    fn set_value(&mut self, value: &str) {
        (**self).set_value(value)
    }

    fn dispatch(&mut self, event: FieldEvent) -> Result<(), FieldError> {
        (**self).dispatch(event)
    }
}

/// True for inputs named after a click id key, plain or prefixed
/// (`0-1/partnerstack_click_id`).
pub fn is_identifier_field(name: &str) -> bool {
    IDENTIFIER_STORAGE_KEYS.iter().any(|key| {
        name == *key
            || name
                .strip_suffix(key)
                .is_some_and(|head| head.ends_with('/'))
    })
}

/// Counts from one injection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectionReport {
    /// Identifier inputs found
    pub matched: usize,
    /// Inputs that were empty and received the identifier
    pub filled: usize,
}

/// Writes `id` into every empty identifier input.
///
/// Inputs that already hold a value are left alone. Every matched input's
/// final value is recorded in `capture` when given. Event dispatch failures
/// are logged and counted; the value stays set.
pub fn inject_identifier<F: FormField>(
    fields: &mut [F],
    id: &str,
    mut capture: Option<&mut FieldCapture>,
    stats: &ProcessingStats,
) -> InjectionReport {
    let mut report = InjectionReport::default();

    for field in fields.iter_mut().filter(|f| is_identifier_field(f.name())) {
        report.matched += 1;

        if field.value().is_empty() {
            field.set_value(id);
            for event in [FieldEvent::Input, FieldEvent::Change] {
                if let Err(e) = field.dispatch(event) {
                    warn!("{}", e);
                    stats.increment_error(ErrorType::FieldEventDispatchError);
                }
            }
            report.filled += 1;
            debug!("Prefilled click id field: {}", field.name());
        } else {
            debug!("Skipping field {}: already has value", field.name());
        }

        if let Some(capture) = capture.as_deref_mut() {
            capture.capture(&CapturedInput::new(field.name(), field.value(), InputKind::Hidden));
        }
    }

    if report.matched == 0 {
        warn!("No click id inputs found on the page");
        stats.increment_error(ErrorType::MissingFieldTarget);
    }
    report
}

/// In-memory form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryField {
    pub name: String,
    pub value: String,
    /// Events dispatched so far
    pub events: Vec<FieldEvent>,
    /// Makes every dispatch fail
    pub reject_events: bool,
}

impl MemoryField {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            ..Default::default()
        }
    }
}

impl FormField for MemoryField {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
    }

    fn dispatch(&mut self, event: FieldEvent) -> Result<(), FieldError> {
        if self.reject_events {
            return Err(FieldError::EventDispatch {
                field: self.name.clone(),
                event: event.as_str(),
                reason: "detached element".to_string(),
            });
        }
        self.events.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_identifier_field() {
        assert!(is_identifier_field("partnerstack_click_id"));
        assert!(is_identifier_field("0-1/partnerstack_click_id"));
        assert!(is_identifier_field("ps_xid"));
        assert!(is_identifier_field("0-2/psx_id"));
        assert!(!is_identifier_field("my_ps_xid"));
        assert!(!is_identifier_field("email"));
        assert!(!is_identifier_field(""));
    }

    #[test]
    fn test_fills_only_empty_identifier_fields() {
        let mut fields = vec![
            MemoryField::new("email", ""),
            MemoryField::new("0-1/partnerstack_click_id", ""),
            MemoryField::new("ps_xid", "existing"),
        ];
        let mut capture = FieldCapture::new();
        let stats = ProcessingStats::new();

        let report = inject_identifier(&mut fields, "xid-1", Some(&mut capture), &stats);

        assert_eq!(report, InjectionReport { matched: 2, filled: 1 });
        assert_eq!(fields[0].value, "");
        assert_eq!(fields[1].value, "xid-1");
        assert_eq!(fields[1].events, vec![FieldEvent::Input, FieldEvent::Change]);
        assert_eq!(fields[2].value, "existing");
        assert!(fields[2].events.is_empty());

        assert_eq!(capture.data().get("partnerstack_click_id"), Some("xid-1"));
        assert_eq!(capture.data().get("ps_xid"), Some("existing"));
    }

    #[test]
    fn test_dispatch_failure_keeps_value() {
        let mut field = MemoryField::new("ps_xid", "");
        field.reject_events = true;
        let mut fields = vec![field];
        let stats = ProcessingStats::new();

        let report = inject_identifier(&mut fields, "xid", None, &stats);

        assert_eq!(report.filled, 1);
        assert_eq!(fields[0].value, "xid");
        assert_eq!(stats.get_error_count(ErrorType::FieldEventDispatchError), 2);
    }

    #[test]
    fn test_no_targets_counted() {
        let mut fields: Vec<Box<dyn FormField>> = vec![Box::new(MemoryField::new("email", ""))];
        let stats = ProcessingStats::new();
        assert_eq!(
            inject_identifier(&mut fields, "xid", None, &stats),
            InjectionReport::default()
        );
        assert_eq!(stats.get_error_count(ErrorType::MissingFieldTarget), 1);
    }
}
