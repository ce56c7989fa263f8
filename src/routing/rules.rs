//! Routing rules.
//!
//! Each question lists the field names it may be reported under. The first
//! non-empty value across those names (plain or positionally prefixed) is the
//! answer. The scheduler destination requires an affirmative answer to every
//! question; anything else, including an unanswered question, goes to the
//! soft destination.

use log::debug;
use serde::{Deserialize, Serialize};

use super::response::Answer;
use super::Destination;
use crate::config::{FIELD_PREFIXES, IDENTITY_FIELDS, MULTI_PRACTICE_FIELDS};
use crate::form::FormData;

/// A yes/no question the router gates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingQuestion {
    /// Label used in logs
    pub name: String,
    /// Field names the answer may appear under, in priority order
    pub fields: Vec<String>,
}

impl RoutingQuestion {
    pub fn new(name: &str, fields: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Question set and destination tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingRules {
    /// Questions that must all be answered affirmatively
    pub questions: Vec<RoutingQuestion>,
    /// Destination when every question is affirmative
    pub scheduler_destination: Destination,
    /// Destination otherwise
    pub soft_destination: Destination,
    /// Extra exact-match negative phrases
    pub negative_phrases: Vec<String>,
}

impl Default for RoutingRules {
    fn default() -> Self {
        Self {
            questions: vec![RoutingQuestion::new(
                "multi_practice",
                MULTI_PRACTICE_FIELDS,
            )],
            scheduler_destination: Destination::general(),
            soft_destination: Destination::success(),
            negative_phrases: Vec::new(),
        }
    }
}

/// Returns the first non-empty value for any of `field_names`.
///
/// Each name is tried as is, then with the `0-1/`, `0-2/`, `0-3/` prefixes,
/// before moving to the next name.
pub fn find_first_value<'a, S: AsRef<str>>(
    form_data: &'a FormData,
    field_names: &[S],
) -> Option<&'a str> {
    for field_name in field_names {
        let field_name = field_name.as_ref();
        if let Some(value) = form_data.get_non_empty(field_name) {
            return Some(value);
        }
        for prefix in FIELD_PREFIXES {
            if let Some(value) = form_data.get_non_empty(&format!("{prefix}{field_name}")) {
                return Some(value);
            }
        }
    }
    None
}

impl RoutingRules {
    /// Picks the destination for a submission.
    ///
    /// Pure function of the form data and the rules.
    pub fn determine_destination(&self, form_data: &FormData) -> Destination {
        for question in &self.questions {
            let value = find_first_value(form_data, &question.fields);
            let answer = Answer::classify(value, &self.negative_phrases);
            if answer != Answer::Affirmative {
                debug!(
                    "Question `{}` not answered yes ({:?}, value: {:?}), routing to {}",
                    question.name, answer, value, self.soft_destination
                );
                return self.soft_destination.clone();
            }
        }

        debug!(
            "All {} routing question(s) answered yes, routing to {}",
            self.questions.len(),
            self.scheduler_destination
        );
        self.scheduler_destination.clone()
    }

    /// True when the payload carries an answer to any question or a basic
    /// identity field. Payloads without either are not worth routing.
    pub fn has_routing_data(&self, form_data: &FormData) -> bool {
        let has_answer = self
            .questions
            .iter()
            .any(|q| find_first_value(form_data, &q.fields).is_some());
        has_answer || IDENTITY_FIELDS.iter().any(|f| form_data.has(f))
    }
}

/// Routes with the default rules.
pub fn determine_scheduler_type(form_data: &FormData) -> Destination {
    RoutingRules::default().determine_destination(form_data)
}
