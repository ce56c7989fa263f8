//! Form submission handling.
//!
//! This module provides:
//! - `SubmissionCoordinator`: the one-shot routing action for a page
//! - `Navigator` and `AnalyticsSink`: the host's location and analytics clients
//! - In-memory recording implementations of both
//!
//! A coordinator routes at most once. The first submission resolves the click
//! id, picks a destination, persists what the scheduler page needs and
//! redirects. Every later submission is ignored. Failures on the way are
//! logged and counted; nothing here returns an error to the caller.

mod analytics;
mod navigation;

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{debug, info, warn};
use serde::Serialize;

use crate::config::{
    RouterConfig, FALLBACK_COOKIE_MAX_AGE_SECS, FALLBACK_FORM_DATA_COOKIE,
    FALLBACK_SCHEDULER_COOKIE, FIELD_PREFIXES, FORM_DATA_KEY, PARTNERSTACK_FIELD_NAME,
    ROUTER_DATA_KEY, ROUTER_DATA_SOURCE,
};
use crate::error_handling::{ErrorType, ProcessingStats, StorageError};
use crate::form::FormData;
use crate::identifier::{persist_identifier, resolve_identifier, standard_sources};
use crate::routing::Destination;
use crate::scheduler::{build_redirect_path, build_scheduler_url};
use crate::storage::{write_json, BrowserStorage, CookieStore, KeyValueStore, SetCookie};

pub use analytics::{emit, AnalyticsSink, PropertySet, RecordingSink, RoutingEvent};
pub use navigation::{navigate, NavigationMethod, Navigator, RecordingNavigator};

/// Idempotency latch of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouterState {
    /// No submission has been routed yet
    #[default]
    Idle,
    /// A routing action was taken; terminal
    Routed,
}

/// Session-storage blob read by the scheduler page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterRecord<'a> {
    pub scheduler_type: &'a str,
    #[serde(rename = "formData")]
    pub form_data: &'a FormData,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub source: &'static str,
}

/// Result of a routed submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingOutcome {
    pub destination: Destination,
    /// Relative redirect target, e.g. `/thank-you/schedule?email=a%40b.com`
    pub redirect: String,
    /// How the redirect was performed; `None` when the host refused it
    pub navigation: Option<NavigationMethod>,
    /// Click id attached to the submission
    pub identifier: Option<String>,
    /// Prefilled scheduler page; absent for the soft destination
    pub scheduler_url: Option<String>,
    /// The form data after click id injection
    pub form_data: FormData,
}

/// Owns the routing latch and the host facilities a routing action touches.
pub struct SubmissionCoordinator {
    config: RouterConfig,
    storage: BrowserStorage,
    navigator: Box<dyn Navigator>,
    sinks: Vec<Box<dyn AnalyticsSink>>,
    stats: Arc<ProcessingStats>,
    global_identifier: Option<String>,
    state: RouterState,
}

impl SubmissionCoordinator {
    pub fn new(
        config: RouterConfig,
        storage: BrowserStorage,
        navigator: Box<dyn Navigator>,
        stats: Arc<ProcessingStats>,
    ) -> Self {
        Self {
            config,
            storage,
            navigator,
            sinks: Vec::new(),
            stats,
            global_identifier: None,
            state: RouterState::Idle,
        }
    }

    /// Adds an analytics client.
    pub fn with_sink(mut self, sink: Box<dyn AnalyticsSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Sets the click id held in page memory, the highest priority source.
    pub fn with_global_identifier(mut self, id: Option<String>) -> Self {
        self.global_identifier = id;
        self
    }

    pub fn state(&self) -> RouterState {
        self.state
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn storage(&self) -> &BrowserStorage {
        &self.storage
    }

    pub fn stats(&self) -> &Arc<ProcessingStats> {
        &self.stats
    }

    /// Resolves the click id from page memory, storage and cookies.
    pub fn resolve_identifier(&self) -> Option<String> {
        let sources = standard_sources(&self.storage, self.global_identifier.clone());
        resolve_identifier(&sources, &self.stats)
    }

    /// Routes a submitted form.
    ///
    /// Only the first call on a coordinator does anything; later calls
    /// return `None`.
    ///
    /// # Arguments
    ///
    /// * `form_data` - Normalized field values of the submission
    ///
    /// # Returns
    ///
    /// The routing outcome of the first call, `None` afterwards.
    pub fn handle_form_submission(&mut self, mut form_data: FormData) -> Option<RoutingOutcome> {
        if self.state == RouterState::Routed {
            debug!("Already routed, ignoring duplicate submission");
            return None;
        }
        self.state = RouterState::Routed;

        let identifier = self.resolve_identifier();
        if let Some(id) = &identifier {
            form_data.insert(PARTNERSTACK_FIELD_NAME, id.as_str());
            for prefix in FIELD_PREFIXES {
                form_data.insert(format!("{prefix}{PARTNERSTACK_FIELD_NAME}"), id.as_str());
            }
            persist_identifier(&self.storage, id, &self.stats);
            debug!("Attached click id to submission");
        }

        let destination = self.config.rules.determine_destination(&form_data);
        info!("Routing submission to {}", destination);

        let (redirect, scheduler_url) = if destination == self.config.rules.soft_destination {
            (build_redirect_path(&self.config.routes.success, &form_data), None)
        } else {
            self.persist_router_data(&destination, &form_data);
            self.persist_form_data(&form_data);
            let scheduler_url = match build_scheduler_url(&self.config, &destination, &form_data) {
                Ok(url) => Some(url.to_string()),
                Err(e) => {
                    warn!("Could not build scheduler URL: {}", e);
                    None
                }
            };
            (build_redirect_path(&self.config.routes.schedule, &form_data), scheduler_url)
        };

        let navigation = navigate(self.navigator.as_ref(), &redirect, &self.stats);
        emit(&self.sinks, &RoutingEvent::new(&destination, &form_data), &self.stats);

        Some(RoutingOutcome {
            destination,
            redirect,
            navigation,
            identifier,
            scheduler_url,
            form_data,
        })
    }

    /// Writes `scheduler_router_data`, falling back to short-lived cookies.
    fn persist_router_data(&self, destination: &Destination, form_data: &FormData) {
        let record = RouterRecord {
            scheduler_type: destination.as_str(),
            form_data,
            timestamp: chrono::Utc::now().timestamp_millis(),
            source: ROUTER_DATA_SOURCE,
        };
        let Err(e) = write_json(self.storage.session.as_ref(), ROUTER_DATA_KEY, &record) else {
            return;
        };
        debug!("Session storage failed, using cookies: {}", e);
        self.stats.increment_error(ErrorType::StorageWriteError);

        if let Err(e) = self.write_fallback_cookies(destination, form_data) {
            warn!("Fallback cookie write failed: {}", e);
        }
        self.stats.increment_error(ErrorType::CookieFallbackWrite);
    }

    fn write_fallback_cookies(
        &self,
        destination: &Destination,
        form_data: &FormData,
    ) -> Result<(), StorageError> {
        let json = serde_json::to_string(form_data).map_err(|e| StorageError::Serialization {
            key: FALLBACK_FORM_DATA_COOKIE.to_string(),
            reason: e.to_string(),
        })?;
        let cookies = self.storage.cookies.as_ref();
        cookies.set_cookie(
            &SetCookie::raw(FALLBACK_SCHEDULER_COOKIE, destination.as_str())
                .max_age(FALLBACK_COOKIE_MAX_AGE_SECS),
        )?;
        cookies.set_cookie(
            &SetCookie::raw(FALLBACK_FORM_DATA_COOKIE, &BASE64.encode(json))
                .max_age(FALLBACK_COOKIE_MAX_AGE_SECS),
        )
    }

    /// Writes `hubspot_form_data` to local storage for the scheduler page.
    fn persist_form_data(&self, form_data: &FormData) {
        if let Err(e) = write_json(self.storage.local.as_ref(), FORM_DATA_KEY, form_data) {
            debug!("Failed to write {} to {}: {}", FORM_DATA_KEY, self.storage.local.backend(), e);
            self.stats.increment_error(ErrorType::StorageWriteError);
        }
    }
}

impl std::fmt::Debug for SubmissionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionCoordinator")
            .field("state", &self.state)
            .field("sinks", &self.sinks.len())
            .finish_non_exhaustive()
    }
}
