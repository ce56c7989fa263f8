//! Inbound HubSpot `postMessage` handling.
//!
//! This module provides:
//! - Origin allow-listing for HubSpot form frames
//! - Classification of message payloads into [`HubSpotMessage`]
//! - [`MessageListener`], which feeds submissions to a coordinator

mod listener;
mod message;
mod origin;

pub use listener::{ListenerAction, MessageListener};
pub use message::{HubSpotMessage, SubmissionEvent};
pub use origin::{check_origin, is_hubspot_origin};
