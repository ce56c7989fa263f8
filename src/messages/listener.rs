//! The page's `message` event handler.

use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;

use super::message::{HubSpotMessage, SubmissionEvent};
use super::origin::check_origin;
use crate::config::{FORM_DATA_KEY, FORM_READY_INJECTION_DELAY};
use crate::coordinator::{RoutingOutcome, SubmissionCoordinator};
use crate::error_handling::{ErrorType, PayloadError};
use crate::form::{CapturedInput, FieldCapture, FormData};
use crate::storage::{write_json, KeyValueStore};
use crate::utils::sanitize::sanitize_for_log;

/// What a message led to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ListenerAction {
    /// Untrusted, malformed or irrelevant message
    Ignored,
    /// Submission without routing data; a later event is expected to carry it
    AwaitingRoutingData,
    /// The coordinator routed this submission
    Routed(Box<RoutingOutcome>),
    /// The coordinator had already routed
    AlreadyRouted,
    /// The form rendered; identifier fields should be filled after `delay_ms`
    PrefillRequested { delay_ms: u64 },
}

impl ListenerAction {
    fn prefill_after(delay: Duration) -> Self {
        ListenerAction::PrefillRequested {
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Dispatches HubSpot messages to a coordinator.
///
/// Holds the values captured from form controls so that developer embeds,
/// whose confirmation message carries no data, can still be routed.
#[derive(Debug)]
pub struct MessageListener {
    coordinator: SubmissionCoordinator,
    capture: FieldCapture,
}

impl MessageListener {
    pub fn new(coordinator: SubmissionCoordinator) -> Self {
        Self {
            coordinator,
            capture: FieldCapture::new(),
        }
    }

    pub fn coordinator(&self) -> &SubmissionCoordinator {
        &self.coordinator
    }

    pub fn captured(&self) -> &FormData {
        self.capture.data()
    }

    /// Mutable access to the field cache, for prefill.
    pub fn capture_mut(&mut self) -> &mut FieldCapture {
        &mut self.capture
    }

    /// Records a form control value.
    pub fn capture_input(&mut self, input: &CapturedInput<'_>) -> bool {
        self.capture.capture(input)
    }

    /// Handles one `message` event.
    ///
    /// Never fails: untrusted origins and malformed payloads are logged,
    /// counted and ignored.
    pub fn on_message(&mut self, origin: &str, payload: &Value) -> ListenerAction {
        let stats = self.coordinator.stats().clone();

        if let Err(e) = check_origin(origin) {
            debug!("{}", sanitize_for_log(&e.to_string()));
            stats.increment_error(ErrorType::UntrustedOrigin);
            return ListenerAction::Ignored;
        }

        let message = match HubSpotMessage::parse(payload) {
            Ok(message) => message,
            Err(PayloadError::UnrecognizedShape) => {
                debug!("Ignoring non-form message from {}", sanitize_for_log(origin));
                return ListenerAction::Ignored;
            }
            Err(e) => {
                warn!("Dropping message from {}: {}", sanitize_for_log(origin), e);
                stats.increment_error(ErrorType::MalformedPayload);
                return ListenerAction::Ignored;
            }
        };

        match message {
            HubSpotMessage::FormSubmission { event, data } => self.on_submission(event, data),
            HubSpotMessage::DeveloperEmbedAccepted { form_guid } => {
                self.on_developer_embed(&form_guid)
            }
            HubSpotMessage::FormReady => {
                debug!("Form ready, scheduling identifier prefill");
                ListenerAction::prefill_after(FORM_READY_INJECTION_DELAY)
            }
            HubSpotMessage::OtherCallback { event_name } => {
                debug!(
                    "Ignoring hsFormCallback event: {}",
                    sanitize_for_log(event_name.as_deref().unwrap_or("<none>"))
                );
                ListenerAction::Ignored
            }
        }
    }

    fn on_submission(&mut self, event: SubmissionEvent, data: FormData) -> ListenerAction {
        let merged = self.capture.data().merged_with(&data);

        if !self.coordinator.config().rules.has_routing_data(&merged) {
            match event {
                SubmissionEvent::Submit => {
                    debug!("onFormSubmit without routing fields; waiting for onFormSubmitted")
                }
                SubmissionEvent::Submitted => {
                    debug!("Submission payload lacks routing data; skipping redirect")
                }
            }
            return ListenerAction::AwaitingRoutingData;
        }

        self.capture.absorb(&merged);
        self.route(merged)
    }

    fn on_developer_embed(&mut self, form_guid: &str) -> ListenerAction {
        info!("Developer embed submission for form {}", sanitize_for_log(form_guid));
        if self.capture.is_empty() {
            debug!("No captured form data for developer embed");
            return ListenerAction::Ignored;
        }

        let captured = self.capture.data().clone();
        let local = self.coordinator.storage().local.clone();
        if let Err(e) = write_json(local.as_ref(), FORM_DATA_KEY, &captured) {
            debug!("Failed to store captured form data in {}: {}", local.backend(), e);
            self.coordinator
                .stats()
                .increment_error(ErrorType::StorageWriteError);
        }
        self.route(captured)
    }

    fn route(&mut self, form_data: FormData) -> ListenerAction {
        match self.coordinator.handle_form_submission(form_data) {
            Some(outcome) => ListenerAction::Routed(Box::new(outcome)),
            None => ListenerAction::AlreadyRouted,
        }
    }
}
