//! Page navigation.

use std::sync::Mutex;

use log::{debug, error};
use serde::Serialize;

use crate::error_handling::{ErrorType, NavigationError, ProcessingStats};

/// How a redirect was performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMethod {
    /// `location.replace()`; the form page leaves the history stack
    Replace,
    /// `location.href = ...`
    Assign,
}

/// The host's `window.location`.
pub trait Navigator: Send + Sync {
    fn replace(&self, target: &str) -> Result<(), NavigationError>;

    fn assign(&self, target: &str) -> Result<(), NavigationError>;
}

/// Navigates with `replace`, falling back to `assign`.
///
/// Returns the method that succeeded, or `None` if both were refused.
pub fn navigate(
    navigator: &dyn Navigator,
    target: &str,
    stats: &ProcessingStats,
) -> Option<NavigationMethod> {
    match navigator.replace(target) {
        Ok(()) => return Some(NavigationMethod::Replace),
        Err(e) => {
            debug!("replace() failed, using href for redirect: {}", e);
            stats.increment_error(ErrorType::NavigationReplaceBlocked);
        }
    }
    match navigator.assign(target) {
        Ok(()) => Some(NavigationMethod::Assign),
        Err(e) => {
            error!("Redirect to {} failed: {}", target, e);
            stats.increment_error(ErrorType::NavigationFailed);
            None
        }
    }
}

/// Navigator that records targets instead of leaving the page.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<(NavigationMethod, String)>>,
    block_replace: bool,
    block_assign: bool,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuses `replace()` calls, like a sandboxed frame.
    pub fn blocking_replace(mut self) -> Self {
        self.block_replace = true;
        self
    }

    /// Refuses `assign()` calls.
    pub fn blocking_assign(mut self) -> Self {
        self.block_assign = true;
        self
    }

    /// Successful navigations, oldest first.
    pub fn visits(&self) -> Vec<(NavigationMethod, String)> {
        self.visits.lock().map(|v| v.clone()).unwrap_or_default()
    }

    fn record(&self, method: NavigationMethod, target: &str, blocked: bool) -> Result<(), NavigationError> {
        if blocked {
            return Err(NavigationError::Blocked {
                target: target.to_string(),
                reason: format!("{method:?} disabled"),
            });
        }
        if let Ok(mut visits) = self.visits.lock() {
            visits.push((method, target.to_string()));
        }
        Ok(())
    }
}

impl Navigator for RecordingNavigator {
    fn replace(&self, target: &str) -> Result<(), NavigationError> {
        self.record(NavigationMethod::Replace, target, self.block_replace)
    }

    fn assign(&self, target: &str) -> Result<(), NavigationError> {
        self.record(NavigationMethod::Assign, target, self.block_assign)
    }
}
