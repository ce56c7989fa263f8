//! Configuration constants.
//!
//! Storage keys, route paths, answer vocabularies and timing values shared by
//! the router. Keys and paths are an external contract with the pages that
//! embed the router and must not change.

use std::time::Duration;

// Destination tags
pub const DESTINATION_GENERAL: &str = "general";
pub const DESTINATION_SUCCESS: &str = "success";

/// Scheduler page the `general` destination embeds.
pub const GENERAL_SCHEDULER_URL: &str = "https://meetings.hubspot.com/bz/consultation";

// Redirect routes (relative to the current site)
pub const ROUTE_SUCCESS: &str = "/thank-you/success";
pub const ROUTE_SCHEDULE: &str = "/thank-you/schedule";
/// Where the scheduler page sends visitors who arrive without form data.
pub const ROUTE_INTAKE: &str = "/free-consult";

/// Questions whose "yes" answer sends the visitor to the scheduler.
pub const MULTI_PRACTICE_FIELDS: &[&str] = &[
    "do_you_file_taxes_as_an_independent_contractor_or_as_the_sole_owner_of_your_business_",
    "does_your_practice_have_multiple_owners",
];

/// Positional prefixes HubSpot adds to field names of multi-step forms.
pub const FIELD_PREFIXES: &[&str] = &["0-1/", "0-2/", "0-3/"];

// Answer vocabularies (compared after trim + lowercase)
pub const YES_VALUES: &[&str] = &["yes", "true", "y", "1", "multiple owners", "multi"];
pub const NO_VALUES: &[&str] = &["no", "false", "n", "0"];
pub const MULTI_OWNER_PHRASES: &[&str] = &[
    "multiple owners",
    "multi practice",
    "multi-owner",
    "multi owner",
    "multi-practice",
];

/// Fields that count as a visitor identity when deciding whether a payload
/// carries enough data to route.
pub const IDENTITY_FIELDS: &[&str] = &[
    "email",
    "firstname",
    "first_name",
    "lastname",
    "last_name",
    "company",
    "practice_name",
];

/// Query parameters copied verbatim onto scheduler URLs.
pub const UTM_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_content",
    "utm_term",
];

// Click id (PartnerStack) keys
pub const PARTNERSTACK_FIELD_NAME: &str = "partnerstack_click_id";
pub const PS_XID: &str = "ps_xid";
pub const PSX_ID: &str = "psx_id";
pub const PS_PARTNER_KEY: &str = "ps_partner_key";
/// Keys checked in session and local storage, in order.
pub const IDENTIFIER_STORAGE_KEYS: &[&str] = &[PARTNERSTACK_FIELD_NAME, PS_XID, PSX_ID];
/// Cookie names checked, in order.
pub const IDENTIFIER_COOKIE_KEYS: &[&str] = &[PS_XID, PSX_ID, PARTNERSTACK_FIELD_NAME];
/// Placeholder strings some integrations write instead of a missing value.
pub const SENTINEL_VALUES: &[&str] = &["undefined", "null"];

// Persisted routing data
pub const ROUTER_DATA_KEY: &str = "scheduler_router_data";
pub const FORM_DATA_KEY: &str = "hubspot_form_data";
pub const FALLBACK_SCHEDULER_COOKIE: &str = "scheduler_type";
pub const FALLBACK_FORM_DATA_COOKIE: &str = "form_data";
pub const ROUTER_DATA_SOURCE: &str = "hubspot_form";

/// Max-age of the fallback routing cookies (1 hour).
pub const FALLBACK_COOKIE_MAX_AGE_SECS: u64 = 60 * 60;
/// Max-age of the click id cookies (90 days).
pub const IDENTIFIER_COOKIE_MAX_AGE_SECS: u64 = 90 * 24 * 60 * 60;
pub const DEFAULT_COOKIE_DOMAIN: &str = ".joinheard.com";

// Scheduler page
/// Id of the element that hosts the scheduler embed.
pub const SCHEDULER_TARGET_ID: &str = "scheduler-target";
/// Form fields copied onto the scheduler page URL under their own names.
pub const SCHEDULER_PASSTHROUGH_FIELDS: &[&str] = &[
    "is_your_practice_a_c_corp_or_our_does_it_have_multiple_owners_",
    "what_best_describes_your_practice_",
    "referrer",
    "submissionGuid",
    "uuid",
];
/// Page query keys that alone do not count as visitor data.
pub const PAGE_QUERY_IGNORED_KEYS: &[&str] = &["debug", "utm_source", "utm_medium", "utm_campaign"];
/// Prefix of HubSpot group fields, also ignored on the scheduler page.
pub const HUBSPOT_GROUP_FIELD_PREFIX: &str = "group[";

// HubSpot message contract
pub const HS_FORM_CALLBACK: &str = "hsFormCallback";
pub const EVENT_FORM_SUBMITTED: &str = "onFormSubmitted";
pub const EVENT_FORM_SUBMIT: &str = "onFormSubmit";
pub const EVENT_FORM_READY: &str = "onFormReady";
/// Host suffixes accepted as HubSpot message origins.
pub const HUBSPOT_HOST_SUFFIXES: &[&str] = &[
    "hubspot.com",
    "hsforms.com",
    "hsforms.net",
    "hsappstatic.net",
];
/// Host fragments accepted as HubSpot message origins.
pub const HUBSPOT_HOST_FRAGMENTS: &[&str] = &["hubspot", "hsforms"];

/// Pages that should always carry `ps_xid` in their URL.
pub const TRACKING_PAGES: &[&str] = &["/free-consult", "/thank-you", "/schedule", "/consultation"];

// Analytics
pub const ANALYTICS_EVENT: &str = "scheduler_router_triggered";

// Prefill timing
/// Delays of the bounded identifier injection attempts after page load.
pub const INJECTION_DELAYS: &[Duration] = &[
    Duration::from_millis(0),
    Duration::from_millis(1000),
    Duration::from_millis(3000),
];
/// Delay between `onFormReady` and the injection attempt.
pub const FORM_READY_INJECTION_DELAY: Duration = Duration::from_millis(100);
/// Poll interval for watching hidden field values.
pub const FIELD_WATCH_INTERVAL: Duration = Duration::from_millis(500);
/// Upper bound on hidden field polls (one minute at the default interval).
pub const FIELD_WATCH_MAX_POLLS: usize = 120;
