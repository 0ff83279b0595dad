//! Shared utility functions

use reqwest::Url;

/// Maximum number of characters of an upstream body kept in error messages.
const PREVIEW_CHARS: usize = 500;

/// Append path segments to a base URL, percent-encoding each segment.
///
/// # Examples
///
/// ```
/// use relay_server::util::join_url;
///
/// let url = join_url("https://graph.facebook.com/v22.0", &["123_456", "comments"]).unwrap();
/// assert_eq!(url.as_str(), "https://graph.facebook.com/v22.0/123_456/comments");
/// ```
pub fn join_url(base: &str, segments: &[&str]) -> Result<Url, String> {
    let mut url = Url::parse(base).map_err(|e| format!("Invalid base URL {base}: {e}"))?;
    url.path_segments_mut()
        .map_err(|()| format!("Base URL cannot have a path: {base}"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Truncate an upstream response body for logging and error messages.
pub fn body_preview(body: &str) -> String {
    body.chars().take(PREVIEW_CHARS).collect()
}
