//! Message origin allow-list.

use url::Url;

use crate::config::{HUBSPOT_HOST_FRAGMENTS, HUBSPOT_HOST_SUFFIXES};
use crate::error_handling::PayloadError;

/// True when `origin` is a HubSpot forms host.
///
/// The hostname must end with one of the HubSpot suffixes or contain
/// `hubspot`/`hsforms`. Origins that do not parse as URLs are rejected.
pub fn is_hubspot_origin(origin: &str) -> bool {
    let Ok(url) = Url::parse(origin) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    HUBSPOT_HOST_SUFFIXES.iter().any(|s| host.ends_with(s))
        || HUBSPOT_HOST_FRAGMENTS.iter().any(|f| host.contains(f))
}

/// [`is_hubspot_origin`] as a `Result`.
pub fn check_origin(origin: &str) -> Result<(), PayloadError> {
    if is_hubspot_origin(origin) {
        Ok(())
    } else {
        Err(PayloadError::UntrustedOrigin(origin.to_string()))
    }
}
