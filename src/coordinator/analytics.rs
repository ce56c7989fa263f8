//! Analytics events for routing outcomes.

use std::sync::Mutex;

use log::warn;
use serde::Serialize;

use crate::config::ANALYTICS_EVENT;
use crate::error_handling::{AnalyticsError, ErrorType, ProcessingStats};
use crate::form::FormData;
use crate::routing::Destination;

/// Which routing properties a client receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertySet {
    /// Every property
    #[default]
    All,
    /// `scheduler_type`, `has_email`, `has_name` (Amplitude)
    Identity,
    /// `scheduler_type`, `method` (PostHog)
    Method,
}

/// Properties sent with `scheduler_router_triggered`.
///
/// Properties a client does not receive are `None` and left out of the
/// serialized event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingEvent {
    pub name: &'static str,
    pub scheduler_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_email: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_name: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<&'static str>,
}

impl RoutingEvent {
    pub fn new(destination: &Destination, form_data: &FormData) -> Self {
        Self {
            name: ANALYTICS_EVENT,
            scheduler_type: destination.to_string(),
            has_email: Some(form_data.has("email")),
            has_name: Some(form_data.has("firstname") || form_data.has("first_name")),
            method: Some("redirect"),
        }
    }

    /// Copy of the event carrying only the properties of `set`.
    pub fn restricted_to(&self, set: PropertySet) -> Self {
        let mut event = self.clone();
        match set {
            PropertySet::All => {}
            PropertySet::Identity => event.method = None,
            PropertySet::Method => {
                event.has_email = None;
                event.has_name = None;
            }
        }
        event
    }
}

/// An analytics client (Amplitude, PostHog, ...).
pub trait AnalyticsSink: Send + Sync {
    fn name(&self) -> &str;

    /// Properties this client is sent.
    fn property_set(&self) -> PropertySet {
        PropertySet::All
    }

    fn track(&self, event: &RoutingEvent) -> Result<(), AnalyticsError>;
}

/// Sends `event` to every sink, restricted to the sink's property set.
///
/// Failures are logged and counted only.
pub fn emit(sinks: &[Box<dyn AnalyticsSink>], event: &RoutingEvent, stats: &ProcessingStats) {
    for sink in sinks {
        if let Err(e) = sink.track(&event.restricted_to(sink.property_set())) {
            warn!("{}", e);
            stats.increment_error(ErrorType::AnalyticsError);
        }
    }
}

/// Sink that keeps events in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    name: String,
    events: Mutex<Vec<RoutingEvent>>,
    properties: PropertySet,
    failing: bool,
}

impl RecordingSink {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// A sink whose every `track` call fails.
    pub fn failing(name: &str) -> Self {
        Self {
            failing: true,
            ..Self::new(name)
        }
    }

    /// Restricts the properties this sink receives.
    pub fn with_property_set(mut self, properties: PropertySet) -> Self {
        self.properties = properties;
        self
    }

    pub fn events(&self) -> Vec<RoutingEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl AnalyticsSink for RecordingSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn property_set(&self) -> PropertySet {
        self.properties
    }

    fn track(&self, event: &RoutingEvent) -> Result<(), AnalyticsError> {
        if self.failing {
            return Err(AnalyticsError {
                sink: self.name.clone(),
                reason: "client not loaded".to_string(),
            });
        }
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
        Ok(())
    }
}

impl<T: AnalyticsSink + ?Sized> AnalyticsSink for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn property_set(&self) -> PropertySet {
        (**self).property_set()
    }

    fn track(&self, event: &RoutingEvent) -> Result<(), AnalyticsError> {
        (**self).track(event)
    }
}
