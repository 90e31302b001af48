use crate::error::{Result, ShortenerError};
use url::Url;

/// Checks that `long_url` is an absolute http(s) URL with a host.
///
/// The service stores whatever it is given; callers run this first.
pub fn validate_long_url(long_url: &str) -> Result<()> {
    if long_url.trim().is_empty() {
        return Err(ShortenerError::InvalidUrl("url cannot be empty".to_string()));
    }

    let parsed = Url::parse(long_url)
        .map_err(|e| ShortenerError::InvalidUrl(format!("{long_url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ShortenerError::InvalidUrl(format!(
                "scheme must be http or https, got '{other}'"
            )))
        }
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(ShortenerError::InvalidUrl(format!("{long_url}: missing host"))),
    }
}
