//! Small text helpers shared by the payload extractor and the DOM indexer.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(?:quot|#34|#39|apos|lt|gt|amp);").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Removes every `<...>` tag from `fragment`, keeping the text between them.
#[must_use]
pub fn strip_tags(fragment: &str) -> Cow<'_, str> {
    TAG_RE.replace_all(fragment, "")
}

/// Strips tags, collapses whitespace runs to a single space and trims.
#[must_use]
pub fn tag_text(fragment: &str) -> String {
    let stripped = strip_tags(fragment);
    WHITESPACE_RE.replace_all(&stripped, " ").trim().to_owned()
}

/// Decodes the fixed entity set that shows up when a JSON payload has been
/// HTML-escaped into an attribute or script body.
///
/// Only `&quot;`, `&#34;`, `&#39;`, `&apos;`, `&lt;`, `&gt;` and `&amp;` are
/// handled. Decoding is a single pass, so `&amp;quot;` becomes `&quot;`.
#[must_use]
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    ENTITY_RE.replace_all(text, |caps: &regex::Captures<'_>| match &caps[0] {
        "&quot;" | "&#34;" => "\"",
        "&#39;" | "&apos;" => "'",
        "&lt;" => "<",
        "&gt;" => ">",
        _ => "&",
    })
}

/// Resolves `href` to an absolute URL against `base`.
///
/// - empty input yields an empty string
/// - `http://` / `https://` links (any case) are returned untouched
/// - scheme-relative `//host/path` links get `https:` prepended
/// - anything else is joined onto `base`; if that fails the input is
///   returned as-is
#[must_use]
pub fn absolutize_url(href: &str, base: &str) -> String {
    if href.is_empty() {
        return String::new();
    }
    if has_http_scheme(href) {
        return href.to_owned();
    }
    if href.starts_with("//") {
        return format!("https:{href}");
    }
    reqwest::Url::parse(base)
        .and_then(|b| b.join(href))
        .map_or_else(|_| href.to_owned(), |u| u.to_string())
}

fn has_http_scheme(href: &str) -> bool {
    let lower = href.get(..8).unwrap_or(href).to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}
