//! Utilities for sanitizing values that arrive from URLs and messages.
//!
//! Tracking parameters are reduced to a conservative token alphabet before
//! they are written to cookies; message-derived text is stripped of control
//! characters before it is logged.

/// Maximum length of message-derived text written to logs.
const MAX_LOG_VALUE_LENGTH: usize = 200;

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '+' | '/' | '=')
}

/// Sanitizes a tracking query parameter (`ps_xid`, `ps_partner_key`).
///
/// Trims the value and keeps only `A-Z a-z 0-9 . _ - + / =`. Returns an
/// empty string when nothing survives.
///
/// ```
/// use scheduler_router::utils::sanitize::sanitize_tracking_param;
///
/// assert_eq!(sanitize_tracking_param("  abc<script>123 "), "abcscript123");
/// ```
pub fn sanitize_tracking_param(value: &str) -> String {
    value.trim().chars().filter(|c| is_token_char(*c)).collect()
}

/// Removes control characters (except tab/newline/carriage return) and
/// truncates the result for logging.
pub fn sanitize_for_log(value: &str) -> String {
    let sanitized: String = value
        .chars()
        .filter(|c| {
            let code = *c as u32;
            code >= 0x20 || code == 0x09 || code == 0x0A || code == 0x0D
        })
        .collect();

    if sanitized.chars().count() > MAX_LOG_VALUE_LENGTH {
        let truncated: String = sanitized.chars().take(MAX_LOG_VALUE_LENGTH).collect();
        format!("{truncated}... (truncated)")
    } else {
        sanitized
    }
}
