//! Post-submission redirect targets.
//!
//! Redirects expose at most the email address in the query string; every
//! other answer travels through session storage.

use url::form_urlencoded;

use crate::form::FormData;

/// Builds `route` plus `?email=...` when the form has an email.
///
/// ```
/// use scheduler_router::build_redirect_path;
/// use scheduler_router::form::FormData;
///
/// let form: FormData = [("email", "a@b.com"), ("phone", "555")].into_iter().collect();
/// assert_eq!(build_redirect_path("/thank-you/schedule", &form), "/thank-you/schedule?email=a%40b.com");
/// assert_eq!(build_redirect_path("/thank-you/success", &FormData::new()), "/thank-you/success");
/// ```
pub fn build_redirect_path(route: &str, form_data: &FormData) -> String {
    match form_data.get_non_empty("email") {
        Some(email) => {
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair("email", email)
                .finish();
            format!("{route}?{query}")
        }
        None => route.to_string(),
    }
}
