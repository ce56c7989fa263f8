//! Error handling and degraded-path statistics.
//!
//! This module provides:
//! - Error type definitions for storage, payloads, navigation, analytics and config
//! - The `ErrorType` taxonomy of recoverable failures
//! - Atomic counters for those failures
//!
//! Nothing in the router is fatal at page level: storage, payload, field and
//! navigation failures are logged, counted and skipped.

mod stats;
mod types;

// Re-export public API
pub use stats::ProcessingStats;
pub use types::{
    AnalyticsError, ConfigError, ErrorType, FieldError, InitializationError, NavigationError,
    PayloadError, StorageError,
};
