//! Utility functions.
//!
//! This module provides:
//! - Tracking parameter sanitization
//! - Log-safe rendering of message-derived text

pub mod sanitize;
