//! Configuration types and CLI options.
//!
//! This module defines the router configuration (destination table, redirect
//! routes, routing rules, field mappings) and the command-line options of the
//! `scheduler_router` binary.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::constants::{
    DEFAULT_COOKIE_DOMAIN, DESTINATION_GENERAL, GENERAL_SCHEDULER_URL, ROUTE_INTAKE,
    ROUTE_SCHEDULE, ROUTE_SUCCESS, UTM_PARAMS,
};
use crate::error_handling::ConfigError;
use crate::routing::RoutingRules;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Command-line options for the `scheduler_router` binary.
#[derive(Debug, Parser)]
#[command(
    name = "scheduler_router",
    version,
    about = "Replays a HubSpot form payload through the scheduler router"
)]
pub struct Opt {
    /// JSON payload file (use '-' to read from stdin)
    pub payload: PathBuf,

    /// Treat the payload as a postMessage event from this origin
    #[arg(long)]
    pub origin: Option<String>,

    /// Router configuration file (JSON); built-in defaults when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Click id to place in session storage before routing
    #[arg(long)]
    pub identifier: Option<String>,

    /// Landing page URL whose ps_xid/ps_partner_key query parameters are captured
    #[arg(long)]
    pub landing_url: Option<String>,

    /// After routing, render the scheduler page from what the submission stored
    #[arg(long)]
    pub scheduler_page: bool,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

/// A scheduler page a destination tag resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerEntry {
    /// Absolute scheduler URL
    pub url: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Relative redirect paths for the two routing outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDestinations {
    /// Soft destination (thank-you page without a scheduler)
    pub success: String,
    /// Scheduler landing route
    pub schedule: String,
    /// Intake form the scheduler page falls back to without form data
    #[serde(default = "default_intake_route")]
    pub intake: String,
}

fn default_intake_route() -> String {
    ROUTE_INTAKE.to_string()
}

impl Default for RouteDestinations {
    fn default() -> Self {
        Self {
            success: ROUTE_SUCCESS.to_string(),
            schedule: ROUTE_SCHEDULE.to_string(),
            intake: default_intake_route(),
        }
    }
}

/// Maps one scheduler query parameter to the form fields that can fill it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Target query parameter
    pub param: String,
    /// Candidate field names, first non-empty wins
    pub fields: Vec<String>,
}

impl FieldMapping {
    fn new(param: &str, fields: &[&str]) -> Self {
        Self {
            param: param.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Router configuration.
///
/// `Default` reproduces the production router: a single `general` scheduler,
/// the multi-practice question, and the standard prefill mapping. Any field
/// may be overridden from a JSON file.
///
/// # Examples
///
/// ```
/// use scheduler_router::RouterConfig;
///
/// let config = RouterConfig::default();
/// assert_eq!(config.default_destination, "general");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Destination tag -> scheduler page
    pub schedulers: BTreeMap<String, SchedulerEntry>,

    /// Entry used when a destination tag has no scheduler of its own
    pub default_destination: String,

    /// Redirect routes
    pub routes: RouteDestinations,

    /// Routing questions and destination tags
    pub rules: RoutingRules,

    /// Scheduler query parameter prefill table
    pub field_mappings: Vec<FieldMapping>,

    /// UTM parameters copied through verbatim
    pub utm_params: Vec<String>,

    /// Domain attribute for click id cookies (none = host-only cookie)
    pub cookie_domain: Option<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        let mut schedulers = BTreeMap::new();
        schedulers.insert(
            DESTINATION_GENERAL.to_string(),
            SchedulerEntry {
                url: GENERAL_SCHEDULER_URL.to_string(),
                name: "Consultation Scheduler".to_string(),
                description: "General consultation scheduling".to_string(),
            },
        );

        Self {
            schedulers,
            default_destination: DESTINATION_GENERAL.to_string(),
            routes: RouteDestinations::default(),
            rules: RoutingRules::default(),
            field_mappings: vec![
                FieldMapping::new("email", &["email", "email_address"]),
                FieldMapping::new("firstName", &["firstname", "first_name", "fname"]),
                FieldMapping::new("lastName", &["lastname", "last_name", "lname"]),
                FieldMapping::new("company", &["company", "practice_name", "business_name"]),
                FieldMapping::new("phone", &["phone", "phone_number", "telephone"]),
            ],
            utm_params: UTM_PARAMS.iter().map(|p| p.to_string()).collect(),
            cookie_domain: Some(DEFAULT_COOKIE_DOMAIN.to_string()),
        }
    }
}

impl RouterConfig {
    /// Loads a configuration from a JSON file and validates it.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, is not valid JSON, or
    /// fails [`RouterConfig::validate`].
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: RouterConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every scheduler URL is absolute, that the default
    /// destination has an entry, that the scheduler and soft destinations
    /// differ, and that at least one question is configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (destination, entry) in &self.schedulers {
            url::Url::parse(&entry.url).map_err(|source| ConfigError::InvalidSchedulerUrl {
                destination: destination.clone(),
                source,
            })?;
        }
        if !self.schedulers.contains_key(&self.default_destination) {
            return Err(ConfigError::MissingDefaultDestination(
                self.default_destination.clone(),
            ));
        }
        if self.rules.scheduler_destination == self.rules.soft_destination {
            return Err(ConfigError::IndistinctDestinations(
                self.rules.soft_destination.to_string(),
            ));
        }
        if self.rules.questions.is_empty() {
            return Err(ConfigError::NoQuestions);
        }
        Ok(())
    }

    /// Resolves a destination tag to its scheduler entry, falling back to the
    /// default destination.
    pub fn scheduler_for(&self, destination: &str) -> Option<&SchedulerEntry> {
        self.schedulers
            .get(destination)
            .or_else(|| self.schedulers.get(&self.default_destination))
    }
}

/// `-` means stdin for payload arguments.
pub fn is_stdin_path(path: &Path) -> bool {
    path.as_os_str() == "-"
}
