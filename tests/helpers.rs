// Shared test helpers for building coordinators over in-memory browser storage.

use std::sync::Arc;

use scheduler_router::coordinator::{
    NavigationMethod, Navigator, RecordingNavigator, RecordingSink,
};
use scheduler_router::error_handling::NavigationError;
use scheduler_router::storage::{BrowserStorage, MemoryCookieJar, MemoryStore};
use scheduler_router::{ProcessingStats, RouterConfig, SubmissionCoordinator};

/// Handles to everything a test coordinator writes to.
#[allow(dead_code)] // Not every test file inspects every handle
pub struct Page {
    pub session: Arc<MemoryStore>,
    pub local: Arc<MemoryStore>,
    pub cookies: Arc<MemoryCookieJar>,
    pub navigator: Arc<RecordingNavigator>,
    pub analytics: Arc<RecordingSink>,
    pub stats: Arc<ProcessingStats>,
}

#[allow(dead_code)]
impl Page {
    pub fn visits(&self) -> Vec<(NavigationMethod, String)> {
        self.navigator.visits()
    }

    pub fn storage(&self) -> BrowserStorage {
        BrowserStorage::new(
            self.session.clone(),
            self.local.clone(),
            self.cookies.clone(),
        )
    }
}

struct SharedNavigator(Arc<RecordingNavigator>);

impl Navigator for SharedNavigator {
    fn replace(&self, target: &str) -> Result<(), NavigationError> {
        self.0.replace(target)
    }

    fn assign(&self, target: &str) -> Result<(), NavigationError> {
        self.0.assign(target)
    }
}

/// A fresh page with the given cookie header and the default config.
#[allow(dead_code)]
pub fn page_with_cookies(cookie_string: &str) -> (SubmissionCoordinator, Page) {
    page_with_config(RouterConfig::default(), cookie_string)
}

/// A fresh page with a custom config.
#[allow(dead_code)]
pub fn page_with_config(
    config: RouterConfig,
    cookie_string: &str,
) -> (SubmissionCoordinator, Page) {
    let page = Page {
        session: Arc::new(MemoryStore::session()),
        local: Arc::new(MemoryStore::local()),
        cookies: Arc::new(MemoryCookieJar::from_cookie_string(cookie_string)),
        navigator: Arc::new(RecordingNavigator::new()),
        analytics: Arc::new(RecordingSink::new("amplitude")),
        stats: Arc::new(ProcessingStats::new()),
    };
    let coordinator = SubmissionCoordinator::new(
        config,
        page.storage(),
        Box::new(SharedNavigator(page.navigator.clone())),
        page.stats.clone(),
    )
    .with_sink(Box::new(page.analytics.clone()));
    (coordinator, page)
}
