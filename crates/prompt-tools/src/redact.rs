//! Scrubbing of upstream URLs before they reach the logs.

use url::Url;

/// Strip userinfo, query and fragment from `url`.
///
/// The query is dropped because list filters (`search`, ids) are caller data, not diagnostics.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

/// Render a `reqwest` error with any embedded URL passed through [`redact_url`].
#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let msg = e.to_string();
    match e.url() {
        Some(u) => msg.replace(u.as_str(), &redact_url(u)),
        None => msg,
    }
}
