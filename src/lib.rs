//! scheduler_router library: HubSpot form routing and affiliate click id carry-over
//!
//! This library reproduces the decision logic of a marketing site's page
//! scripts: it normalizes HubSpot form payloads, decides whether a visitor is
//! sent to a scheduler or a thank-you page, builds prefilled scheduler URLs,
//! and keeps the PartnerStack click id attached across page loads and form
//! submissions.
//!
//! Browser facilities (storage, cookies, navigation, analytics clients, form
//! inputs) are traits with in-memory implementations, so the logic runs and
//! is tested outside a browser.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use scheduler_router::coordinator::RecordingNavigator;
//! use scheduler_router::storage::BrowserStorage;
//! use scheduler_router::{normalize_form_data, ProcessingStats, RouterConfig, SubmissionCoordinator};
//!
//! let mut coordinator = SubmissionCoordinator::new(
//!     RouterConfig::default(),
//!     BrowserStorage::in_memory(),
//!     Box::new(RecordingNavigator::new()),
//!     Arc::new(ProcessingStats::new()),
//! );
//!
//! let form = normalize_form_data(&serde_json::json!({
//!     "does_your_practice_have_multiple_owners": "Yes",
//!     "email": "a@b.com"
//! }));
//! let outcome = coordinator.handle_form_submission(form).unwrap();
//! assert_eq!(outcome.destination.as_str(), "general");
//! assert_eq!(outcome.redirect, "/thank-you/schedule?email=a%40b.com");
//!
//! // The latch allows one routing action per coordinator.
//! assert!(coordinator.handle_form_submission(Default::default()).is_none());
//! ```

pub mod config;
pub mod coordinator;
pub mod error_handling;
pub mod form;
pub mod identifier;
pub mod initialization;
pub mod messages;
pub mod prefill;
pub mod routing;
pub mod scheduler;
pub mod scheduler_page;
pub mod storage;
pub mod utils;

// Re-export public API
pub use config::{LogFormat, LogLevel, RouterConfig};
pub use coordinator::{RouterState, RoutingOutcome, SubmissionCoordinator};
pub use error_handling::{ErrorType, ProcessingStats};
pub use form::{normalize_form_data, FormData};
pub use identifier::resolve_identifier;
pub use messages::{ListenerAction, MessageListener};
pub use routing::{determine_scheduler_type, find_first_value, Destination};
pub use scheduler::{build_redirect_path, build_scheduler_url};
