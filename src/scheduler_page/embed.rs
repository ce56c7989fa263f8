//! Scheduler embed URLs on the scheduler page.

use log::debug;
use url::Url;

use crate::config::{
    RouterConfig, HUBSPOT_GROUP_FIELD_PREFIX, IDENTITY_FIELDS, PAGE_QUERY_IGNORED_KEYS,
    PARTNERSTACK_FIELD_NAME, PS_XID, SCHEDULER_PASSTHROUGH_FIELDS,
};
use crate::error_handling::ConfigError;
use crate::form::FormData;
use crate::routing::{find_first_value, Destination};
use crate::scheduler::{build_scheduler_url, set_query_param};

/// Adds `embed=true` to a scheduler URL that has no `embed` parameter.
///
/// Returns `true` if the URL was changed. An existing `embed` value is left
/// alone.
///
/// ```
/// use scheduler_router::scheduler_page::ensure_embed;
/// use url::Url;
///
/// let mut url = Url::parse("https://meetings.hubspot.com/bz/consultation?email=a%40b.com").unwrap();
/// assert!(ensure_embed(&mut url));
/// assert_eq!(url.query(), Some("email=a%40b.com&embed=true"));
/// assert!(!ensure_embed(&mut url));
/// ```
pub fn ensure_embed(url: &mut Url) -> bool {
    if url.query_pairs().any(|(k, _)| k == "embed") {
        return false;
    }
    url.query_pairs_mut().append_pair("embed", "true");
    true
}

/// True if the page has visitor data worth prefilling a scheduler with.
///
/// An identity field (under any prefix) is enough. Otherwise any non-empty
/// value counts except debug/UTM query keys and HubSpot `group[...]` fields.
pub fn has_visitor_data(form_data: &FormData) -> bool {
    if find_first_value(form_data, IDENTITY_FIELDS).is_some() {
        return true;
    }
    form_data.iter().any(|(key, value)| {
        !value.is_empty()
            && !PAGE_QUERY_IGNORED_KEYS.contains(&key)
            && !key.starts_with(HUBSPOT_GROUP_FIELD_PREFIX)
    })
}

/// Builds the scheduler URL the scheduler page embeds.
///
/// Starts from [`build_scheduler_url`] and additionally
/// - fills mapped parameters from `0-1/`, `0-2/`, `0-3/` prefixed fields
///   when no plain field matched,
/// - carries the click id as `partnerstack_click_id`,
/// - copies HubSpot-specific answer fields under their own names.
///
/// # Errors
///
/// Returns `ConfigError` under the same conditions as [`build_scheduler_url`].
pub fn build_page_scheduler_url(
    config: &RouterConfig,
    destination: &Destination,
    form_data: &FormData,
) -> Result<Url, ConfigError> {
    let mut url = build_scheduler_url(config, destination, form_data)?;

    for mapping in &config.field_mappings {
        if url.query_pairs().any(|(k, _)| k == mapping.param.as_str()) {
            continue;
        }
        if let Some(value) = find_first_value(form_data, &mapping.fields) {
            debug!("Mapping prefixed field -> {}: {}", mapping.param, value);
            set_query_param(&mut url, &mapping.param, value);
        }
    }

    if let Some(id) = find_first_value(form_data, &[PARTNERSTACK_FIELD_NAME, PS_XID]) {
        debug!("Adding click id to scheduler URL");
        set_query_param(&mut url, PARTNERSTACK_FIELD_NAME, id);
    }

    for field in SCHEDULER_PASSTHROUGH_FIELDS {
        if let Some(value) = find_first_value(form_data, &[field]) {
            set_query_param(&mut url, field, value);
        }
    }

    debug!("Built scheduler page URL: {}", url);
    Ok(url)
}
