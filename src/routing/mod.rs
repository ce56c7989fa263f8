//! Scheduler routing decisions.
//!
//! This module provides:
//! - Answer classification (`is_affirmative`, `is_negative`)
//! - Multi-key field lookup (`find_first_value`)
//! - The configurable rule set that maps form answers to a destination tag

mod response;
mod rules;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{DESTINATION_GENERAL, DESTINATION_SUCCESS};

pub use response::{is_affirmative, is_negative, is_negative_with, normalize_response, Answer};
pub use rules::{determine_scheduler_type, find_first_value, RoutingQuestion, RoutingRules};

/// Destination tag produced by the rule engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Destination(String);

impl Destination {
    pub fn new(tag: impl Into<String>) -> Self {
        Destination(tag.into())
    }

    /// The scheduler destination of the production router.
    pub fn general() -> Self {
        Destination::new(DESTINATION_GENERAL)
    }

    /// The soft (thank-you page) destination of the production router.
    pub fn success() -> Self {
        Destination::new(DESTINATION_SUCCESS)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
