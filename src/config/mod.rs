//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (storage keys, routes, answer vocabularies, timings)
//! - The `RouterConfig` destination/rules/mapping table
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{
    is_stdin_path, FieldMapping, LogFormat, LogLevel, Opt, RouteDestinations, RouterConfig,
    SchedulerEntry,
};
