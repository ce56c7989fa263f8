//! The scheduler page side of routing.
//!
//! This module provides:
//! - `load_stored_form_data`: reads what a routed submission persisted
//! - `build_page_scheduler_url` and `ensure_embed`: the embed URL
//! - `SchedulerPage`: injects the prefilled scheduler into the
//!   `scheduler-target` element
//!
//! Stored data is consumed once. The session blob and fallback cookies are
//! cleared as soon as they are read; `hubspot_form_data` is left for later
//! prefills.

mod embed;
mod stored;

use std::sync::Arc;

use log::{debug, error, info, warn};
use serde::Serialize;
use url::Url;

use crate::config::{RouterConfig, SCHEDULER_TARGET_ID};
use crate::coordinator::{navigate, NavigationMethod, Navigator};
use crate::error_handling::{ErrorType, ProcessingStats};
use crate::form::FormData;
use crate::routing::Destination;
use crate::storage::BrowserStorage;

pub use embed::{build_page_scheduler_url, ensure_embed, has_visitor_data};
pub use stored::{load_stored_form_data, StoredFormData, StoredSource};

/// The element with id `scheduler-target` that hosts the scheduler embed.
pub trait SchedulerTarget {
    /// `src` of a scheduler already embedded in the target, if any.
    fn current_source(&self) -> Option<String>;

    /// Replaces the target's content with an embed of `url`.
    fn embed(&mut self, url: &str);
}

/// In-memory scheduler target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTarget {
    pub source: Option<String>,
    /// Every URL embedded so far
    pub embeds: Vec<String>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// A target that already holds a scheduler embed.
    pub fn with_source(source: &str) -> Self {
        Self {
            source: Some(source.to_string()),
            embeds: Vec::new(),
        }
    }
}

impl SchedulerTarget for MemoryTarget {
    fn current_source(&self) -> Option<String> {
        self.source.clone()
    }

    fn embed(&mut self, url: &str) {
        self.source = Some(url.to_string());
        self.embeds.push(url.to_string());
    }
}

/// What the scheduler page did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PageAction {
    /// A prefilled scheduler was embedded
    Embedded {
        url: String,
        /// Storage the form data came from; `None` for query-only data
        source: Option<StoredSource>,
    },
    /// No visitor data; the existing embed was kept, with `embed=true`
    /// added when missing
    Kept { url: String },
    /// No visitor data and nothing embedded; sent to the intake form
    Redirected {
        target: String,
        navigation: Option<NavigationMethod>,
    },
    /// Nothing could be done (no target element, no scheduler entry)
    Skipped,
}

/// Renders the scheduler on the page routed submissions land on.
pub struct SchedulerPage {
    config: RouterConfig,
    storage: BrowserStorage,
    stats: Arc<ProcessingStats>,
}

impl SchedulerPage {
    pub fn new(config: RouterConfig, storage: BrowserStorage, stats: Arc<ProcessingStats>) -> Self {
        Self {
            config,
            storage,
            stats,
        }
    }

    pub fn stats(&self) -> &Arc<ProcessingStats> {
        &self.stats
    }

    /// Sets up the scheduler embed.
    ///
    /// Page query parameters are merged with the stored form data (stored
    /// values win). With visitor data, the target gets a prefilled scheduler
    /// for the stored destination. Without it, an existing embed is kept and
    /// a page with no embed sends the visitor to the intake route.
    ///
    /// A missing target element is logged as an error and nothing else
    /// happens; stored data is left untouched for a later attempt.
    ///
    /// # Arguments
    ///
    /// * `query` - The page URL's query parameters
    /// * `target` - The `scheduler-target` element, if the page has one
    /// * `navigator` - Used for the intake redirect
    pub fn render(
        &self,
        query: &FormData,
        target: Option<&mut dyn SchedulerTarget>,
        navigator: &dyn Navigator,
    ) -> PageAction {
        let Some(target) = target else {
            error!("Scheduler target element #{} not found", SCHEDULER_TARGET_ID);
            self.stats.increment_error(ErrorType::MissingSchedulerTarget);
            return PageAction::Skipped;
        };

        let stored = load_stored_form_data(&self.storage, &self.stats);
        let form_data = match &stored {
            Some(stored) => query.merged_with(&stored.form_data),
            None => query.clone(),
        };

        if !has_visitor_data(&form_data) {
            return self.without_visitor_data(target, navigator);
        }

        let destination = stored
            .as_ref()
            .and_then(|s| s.scheduler_type.as_deref())
            .map(Destination::new)
            .unwrap_or_else(|| Destination::new(self.config.default_destination.as_str()));

        match build_page_scheduler_url(&self.config, &destination, &form_data) {
            Ok(url) => {
                info!("Embedding {} scheduler", destination);
                target.embed(url.as_str());
                PageAction::Embedded {
                    url: url.into(),
                    source: stored.map(|s| s.source),
                }
            }
            Err(e) => {
                error!("Could not build scheduler URL: {}", e);
                PageAction::Skipped
            }
        }
    }

    fn without_visitor_data(
        &self,
        target: &mut dyn SchedulerTarget,
        navigator: &dyn Navigator,
    ) -> PageAction {
        if let Some(current) = target.current_source() {
            debug!("No form data, keeping existing scheduler embed");
            return match Url::parse(&current) {
                Ok(mut url) => {
                    if ensure_embed(&mut url) {
                        debug!("Added embed=true to existing scheduler URL");
                        target.embed(url.as_str());
                    }
                    PageAction::Kept { url: url.into() }
                }
                Err(e) => {
                    warn!("Existing scheduler URL {} is not valid: {}", current, e);
                    PageAction::Kept { url: current }
                }
            };
        }

        info!("No form data found, redirecting to {}", self.config.routes.intake);
        let target = self.config.routes.intake.clone();
        let navigation = navigate(navigator, &target, &self.stats);
        PageAction::Redirected { target, navigation }
    }
}

impl std::fmt::Debug for SchedulerPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerPage")
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}
