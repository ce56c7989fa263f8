//! Scheduler URL construction.

use log::debug;
use url::Url;

use crate::config::RouterConfig;
use crate::error_handling::ConfigError;
use crate::form::FormData;
use crate::routing::Destination;

/// Sets `key` to `value`, replacing the first existing occurrence and dropping
/// any others (the `URLSearchParams.set` contract).
pub(crate) fn set_query_param(url: &mut Url, key: &str, value: &str) {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    match pairs.iter().position(|(k, _)| k == key) {
        Some(idx) => {
            pairs[idx].1 = value.to_string();
            let mut seen = false;
            pairs.retain(|(k, _)| {
                if k != key {
                    return true;
                }
                let keep = !seen;
                seen = true;
                keep
            });
        }
        None => pairs.push((key.to_string(), value.to_string())),
    }

    url.query_pairs_mut().clear().extend_pairs(pairs);
}

/// Builds the embeddable scheduler URL for a destination.
///
/// The destination's base URL comes from the config table (unknown tags use
/// the default entry). `embed=true` is always set; mapped identity fields and
/// whitelisted UTM parameters are added when present in the form.
///
/// # Errors
///
/// Returns `ConfigError` if no scheduler entry resolves or its URL is not
/// absolute. [`RouterConfig::validate`] rules both out for loaded configs.
///
/// # Examples
///
/// ```
/// use scheduler_router::form::FormData;
/// use scheduler_router::routing::Destination;
/// use scheduler_router::{build_scheduler_url, RouterConfig};
///
/// let form: FormData = [("first_name", "Ada"), ("utm_source", "news")].into_iter().collect();
/// let url = build_scheduler_url(&RouterConfig::default(), &Destination::general(), &form).unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://meetings.hubspot.com/bz/consultation?embed=true&firstName=Ada&utm_source=news"
/// );
/// ```
pub fn build_scheduler_url(
    config: &RouterConfig,
    destination: &Destination,
    form_data: &FormData,
) -> Result<Url, ConfigError> {
    let entry = config
        .scheduler_for(destination.as_str())
        .ok_or_else(|| ConfigError::MissingDefaultDestination(config.default_destination.clone()))?;

    let mut url = Url::parse(&entry.url).map_err(|source| ConfigError::InvalidSchedulerUrl {
        destination: destination.to_string(),
        source,
    })?;

    set_query_param(&mut url, "embed", "true");

    for mapping in &config.field_mappings {
        let found = mapping
            .fields
            .iter()
            .find_map(|f| form_data.get_non_empty(f).map(|v| (f, v)));
        if let Some((field, value)) = found {
            debug!("Mapping {} -> {}: {}", field, mapping.param, value);
            set_query_param(&mut url, &mapping.param, value);
        }
    }

    for param in &config.utm_params {
        if let Some(value) = form_data.get_non_empty(param) {
            set_query_param(&mut url, param, value);
        }
    }

    debug!("Built scheduler URL: {}", url);
    Ok(url)
}
