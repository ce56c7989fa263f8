//! HubSpot `postMessage` payloads.

use serde_json::{Map, Value};

use crate::config::{
    EVENT_FORM_READY, EVENT_FORM_SUBMIT, EVENT_FORM_SUBMITTED, HS_FORM_CALLBACK,
};
use crate::error_handling::PayloadError;
use crate::form::{normalize_form_data, FormData};

/// Which submission callback fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionEvent {
    /// `onFormSubmit`; may arrive before the answers are attached
    Submit,
    /// `onFormSubmitted`
    Submitted,
}

/// A classified message from a HubSpot form frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubSpotMessage {
    /// `hsFormCallback` submission with its normalized field values
    FormSubmission {
        event: SubmissionEvent,
        data: FormData,
    },
    /// Developer-embed confirmation (`{formGuid, accepted: true}`); carries
    /// no field values
    DeveloperEmbedAccepted { form_guid: String },
    /// `hsFormCallback` / `onFormReady`
    FormReady,
    /// Any other `hsFormCallback` event
    OtherCallback { event_name: Option<String> },
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

impl HubSpotMessage {
    /// Classifies a message payload.
    ///
    /// A JSON string payload is parsed first. The message type is read from
    /// `type`, falling back to `messageType`.
    ///
    /// # Errors
    ///
    /// `PayloadError::InvalidJson` for a string that is not JSON,
    /// `PayloadError::UnrecognizedShape` for anything that is not a HubSpot
    /// form message.
    pub fn parse(payload: &Value) -> Result<Self, PayloadError> {
        if let Value::String(raw) = payload {
            let parsed: Value =
                serde_json::from_str(raw).map_err(|e| PayloadError::InvalidJson(e.to_string()))?;
            if parsed.is_string() {
                return Err(PayloadError::UnrecognizedShape);
            }
            return Self::parse(&parsed);
        }

        let obj = payload.as_object().ok_or(PayloadError::UnrecognizedShape)?;
        let msg_type = str_field(obj, "type").or_else(|| str_field(obj, "messageType"));
        let event_name = str_field(obj, "eventName");

        if msg_type == Some(HS_FORM_CALLBACK) {
            let submission = match event_name {
                Some(EVENT_FORM_SUBMITTED) => Some(SubmissionEvent::Submitted),
                Some(EVENT_FORM_SUBMIT) => Some(SubmissionEvent::Submit),
                _ => None,
            };
            if let Some(event) = submission {
                let data = obj
                    .get("data")
                    .map(normalize_form_data)
                    .unwrap_or_default();
                return Ok(HubSpotMessage::FormSubmission { event, data });
            }
        }

        if let Some(form_guid) = str_field(obj, "formGuid") {
            if obj.get("accepted") == Some(&Value::Bool(true)) {
                return Ok(HubSpotMessage::DeveloperEmbedAccepted {
                    form_guid: form_guid.to_string(),
                });
            }
        }

        if msg_type == Some(HS_FORM_CALLBACK) {
            if event_name == Some(EVENT_FORM_READY) {
                return Ok(HubSpotMessage::FormReady);
            }
            return Ok(HubSpotMessage::OtherCallback {
                event_name: event_name.map(str::to_string),
            });
        }

        Err(PayloadError::UnrecognizedShape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_submission_with_record_data() {
        let msg = HubSpotMessage::parse(&json!({
            "type": "hsFormCallback",
            "eventName": "onFormSubmitted",
            "data": [{"name": "0-1/email", "value": "x@y.com"}]
        }))
        .expect("parse");
        let HubSpotMessage::FormSubmission { event, data } = msg else {
            panic!("expected submission");
        };
        assert_eq!(event, SubmissionEvent::Submitted);
        assert_eq!(data.get("email"), Some("x@y.com"));
    }

    #[test]
    fn test_message_type_alias_and_string_payload() {
        let raw = r#"{"messageType":"hsFormCallback","eventName":"onFormSubmit"}"#;
        let msg = HubSpotMessage::parse(&Value::String(raw.to_string())).expect("parse");
        assert_eq!(
            msg,
            HubSpotMessage::FormSubmission {
                event: SubmissionEvent::Submit,
                data: FormData::new(),
            }
        );
    }

    #[test]
    fn test_developer_embed() {
        let msg = HubSpotMessage::parse(&json!({"formGuid": "g-1", "accepted": true})).expect("parse");
        assert_eq!(
            msg,
            HubSpotMessage::DeveloperEmbedAccepted {
                form_guid: "g-1".to_string()
            }
        );
        assert_eq!(
            HubSpotMessage::parse(&json!({"formGuid": "g-1", "accepted": "true"})),
            Err(PayloadError::UnrecognizedShape)
        );
        assert_eq!(
            HubSpotMessage::parse(&json!({"formGuid": "", "accepted": true})),
            Err(PayloadError::UnrecognizedShape)
        );
    }

    #[test]
    fn test_ready_and_other_callbacks() {
        assert_eq!(
            HubSpotMessage::parse(&json!({"type": "hsFormCallback", "eventName": "onFormReady"})),
            Ok(HubSpotMessage::FormReady)
        );
        assert_eq!(
            HubSpotMessage::parse(&json!({"type": "hsFormCallback", "eventName": "onBeforeFormInit"})),
            Ok(HubSpotMessage::OtherCallback {
                event_name: Some("onBeforeFormInit".to_string())
            })
        );
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(matches!(
            HubSpotMessage::parse(&Value::String("{not json".to_string())),
            Err(PayloadError::InvalidJson(_))
        ));
        assert_eq!(
            HubSpotMessage::parse(&json!(42)),
            Err(PayloadError::UnrecognizedShape)
        );
        assert_eq!(
            HubSpotMessage::parse(&json!({"type": "somethingElse"})),
            Err(PayloadError::UnrecognizedShape)
        );
        assert_eq!(
            HubSpotMessage::parse(&Value::String("\"just a string\"".to_string())),
            Err(PayloadError::UnrecognizedShape)
        );
    }
}
