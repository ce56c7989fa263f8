//! Answer classification.
//!
//! Free-text and option answers are compared after trimming and lowercasing.
//! A value is affirmative, negative, or neither; affirmative wins when a value
//! would match both vocabularies.

use crate::config::{MULTI_OWNER_PHRASES, NO_VALUES, YES_VALUES};

/// Classified answer to a yes/no routing question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Affirmative,
    Negative,
    /// Answered, but with a value neither vocabulary recognizes
    Unrecognized,
    Unanswered,
}

impl Answer {
    /// Classifies an optional field value.
    pub fn classify(value: Option<&str>, extra_negative: &[String]) -> Self {
        let Some(value) = value else {
            return Answer::Unanswered;
        };
        if normalize_response(value).is_empty() {
            Answer::Unanswered
        } else if is_affirmative(value) {
            Answer::Affirmative
        } else if is_negative_with(value, extra_negative) {
            Answer::Negative
        } else {
            Answer::Unrecognized
        }
    }
}

/// Trims and lowercases an answer.
pub fn normalize_response(value: &str) -> String {
    value.trim().to_lowercase()
}

/// True for "yes"-like answers and multi-owner phrasings.
pub fn is_affirmative(value: &str) -> bool {
    let normalized = normalize_response(value);
    if normalized.is_empty() {
        return false;
    }
    YES_VALUES.contains(&normalized.as_str())
        || normalized.starts_with("yes")
        || MULTI_OWNER_PHRASES
            .iter()
            .any(|phrase| normalized.contains(phrase))
}

/// True for "no"-like answers that are not also affirmative.
pub fn is_negative(value: &str) -> bool {
    is_negative_with(value, &[])
}

/// [`is_negative`] with additional exact-match phrases (e.g. revenue
/// thresholds such as "under $100k").
pub fn is_negative_with(value: &str, extra: &[String]) -> bool {
    let normalized = normalize_response(value);
    if normalized.is_empty() || is_affirmative(&normalized) {
        return false;
    }
    NO_VALUES.contains(&normalized.as_str())
        || extra.iter().any(|p| normalize_response(p) == normalized)
        || normalized.starts_with("no")
}
