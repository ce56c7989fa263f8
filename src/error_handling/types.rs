//! Error type definitions.
//!
//! This module defines the error types used throughout the router, plus the
//! `ErrorType` taxonomy used to count degraded code paths.

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Error types for browser storage access (session/local storage, cookies).
///
/// Every storage failure is recoverable: callers log it and treat the value
/// as absent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Storage is disabled (private browsing, blocked by the browser, etc.).
    #[error("{backend} is unavailable")]
    Unavailable {
        /// Name of the backend that refused access
        backend: &'static str,
    },

    /// The write exceeded the backend's quota.
    #[error("{backend} quota exceeded while writing `{key}`")]
    QuotaExceeded {
        /// Name of the backend
        backend: &'static str,
        /// Key being written
        key: String,
    },

    /// A stored value could not be serialized or deserialized.
    #[error("Stored value for `{key}` is not valid: {reason}")]
    Serialization {
        /// Key being read or written
        key: String,
        /// Underlying serializer message
        reason: String,
    },
}

/// Error types for inbound `postMessage` payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// The message origin is not a HubSpot host.
    #[error("Untrusted message origin: {0}")]
    UntrustedOrigin(String),

    /// A string payload could not be parsed as JSON.
    #[error("Payload is not valid JSON: {0}")]
    InvalidJson(String),

    /// The payload is JSON but matches no known message shape.
    #[error("Unrecognized message shape")]
    UnrecognizedShape,
}

/// Error returned by a navigation attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// The host refused the navigation (e.g. sandboxed frame).
    #[error("Navigation to {target} was blocked: {reason}")]
    Blocked {
        /// Target URL or path
        target: String,
        /// Reason reported by the host
        reason: String,
    },
}

/// Error returned when writing to a form field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// A synthetic `input`/`change` event could not be dispatched.
    #[error("Failed to dispatch `{event}` on field `{field}`: {reason}")]
    EventDispatch {
        /// Field name
        field: String,
        /// Event type
        event: &'static str,
        /// Reason reported by the host
        reason: String,
    },
}

/// Error returned by an analytics sink.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Analytics sink `{sink}` failed: {reason}")]
pub struct AnalyticsError {
    /// Sink name (e.g. "amplitude")
    pub sink: String,
    /// Failure description
    pub reason: String,
}

/// Error types for router configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configured scheduler URL is not an absolute URL.
    #[error("Invalid scheduler URL for `{destination}`: {source}")]
    InvalidSchedulerUrl {
        /// Destination tag whose URL failed to parse
        destination: String,
        /// Parser error
        #[source]
        source: url::ParseError,
    },

    /// The destination table does not contain the designated default entry.
    #[error("Default destination `{0}` has no scheduler entry")]
    MissingDefaultDestination(String),

    /// The scheduler and soft destinations share a tag, so the scheduler
    /// branch could never be taken.
    #[error("Scheduler destination `{0}` is also the soft destination")]
    IndistinctDestinations(String),

    /// No routing question is configured.
    #[error("Routing rules must contain at least one question")]
    NoQuestions,

    /// The configuration file could not be read.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON for `RouterConfig`.
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Degraded code paths the router recovers from.
///
/// None of these abort processing; they are counted so a host can report how
/// often a visitor lost a prefill or a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    // Storage
    StorageReadError,
    StorageWriteError,
    CookieFallbackWrite,
    // Messages
    UntrustedOrigin,
    MalformedPayload,
    // Field targets
    MissingFieldTarget,
    MissingSchedulerTarget,
    FieldEventDispatchError,
    // Navigation
    NavigationReplaceBlocked,
    NavigationFailed,
    // Analytics
    AnalyticsError,
}
