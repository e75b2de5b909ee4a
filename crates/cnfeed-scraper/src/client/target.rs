//! Resolution of the page to fetch from a dealer slug or a full URL.

use crate::error::ScraperError;

/// Resolves the dealer listing URL to fetch.
///
/// An explicit `url` wins over `dealer` and must be absolute http(s). A slug
/// becomes `{base}/concesionario/{slug}/`. Blank inputs count as absent.
///
/// # Errors
///
/// - [`ScraperError::InvalidTarget`]: `url` is not an absolute http(s) URL,
///   or the slug contains a path separator.
/// - [`ScraperError::MissingTarget`]: neither input was supplied.
pub fn build_dealer_url(
    dealer: Option<&str>,
    url: Option<&str>,
    base: &str,
) -> Result<String, ScraperError> {
    if let Some(raw) = url.map(str::trim).filter(|s| !s.is_empty()) {
        let parsed = reqwest::Url::parse(raw).map_err(|e| ScraperError::InvalidTarget {
            input: raw.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScraperError::InvalidTarget {
                input: raw.to_owned(),
                reason: format!("unsupported scheme \"{}\"", parsed.scheme()),
            });
        }
        return Ok(parsed.to_string());
    }

    let slug = dealer
        .map(|s| s.trim().trim_matches('/'))
        .filter(|s| !s.is_empty())
        .ok_or(ScraperError::MissingTarget)?;
    if slug.contains('/') {
        return Err(ScraperError::InvalidTarget {
            input: slug.to_owned(),
            reason: "dealer slug must be a single path segment".to_owned(),
        });
    }
    Ok(format!(
        "{}/concesionario/{slug}/",
        base.trim_end_matches('/')
    ))
}

/// Extracts the hostname from a URL for use in error messages.
///
/// Falls back to the full URL string if parsing fails.
pub(super) fn extract_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}
