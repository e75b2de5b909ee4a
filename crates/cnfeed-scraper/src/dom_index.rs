//! Per-listing fields recovered from the card markup around each detail link.
//!
//! The embedded payload leaves out a handful of things the rendered cards
//! show: the warranty and VAT badges, the alt text of the environmental label
//! image, and sometimes the horsepower. Each detail-page anchor is taken as
//! the centre of a fixed window of raw HTML, and that window is searched for
//! those fragments. Results are keyed by the anchor's absolute URL.
//!
//! The window is symmetric and card boundaries are not parsed, so on dense
//! grids a window can reach into a neighbouring card. First match wins within
//! a window.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::markup::{absolutize_url, tag_text};

/// Bytes of HTML inspected on each side of a detail-link anchor.
pub const CORROBORATION_WINDOW: usize = 1800;

static DETAIL_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\b[^>]*href="([^"]+?(?:\.aspx|covo)[^"]*)""#).expect("valid regex")
});
static PRICE_INFO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<[^>]*class="[^"]*mt-CardAdPrice-infoItem[^"]*"[^>]*>(.*?)</[^>]*>"#)
        .expect("valid regex")
});
static ENV_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<li[^>]*class="[^"]*mt-CardAd-attrItemEnvironmentalLabel[^"]*"[^>]*>.*?<img[^>]*alt="([^"]+)"[^>]*>"#,
    )
    .expect("valid regex")
});
// ASCII digits and word boundaries only.
static HORSEPOWER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i-u)\b([0-9]+)\s*cv\b").expect("valid regex"));

/// Fields recovered from the markup surrounding one detail link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DomExtra {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub garantia_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iva_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etiqueta_ambiental_alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub potencia_cv_dom: Option<u32>,
}

impl DomExtra {
    /// `true` when at least one field was recovered.
    #[must_use]
    pub fn has_any(&self) -> bool {
        self.garantia_text.is_some()
            || self.iva_text.is_some()
            || self.etiqueta_ambiental_alt.is_some()
            || self.potencia_cv_dom.is_some()
    }

    /// Copies fields from `other` into any slot still empty on `self`.
    /// Fields already set are never overwritten.
    pub fn fill_missing_from(&mut self, other: DomExtra) {
        if self.garantia_text.is_none() {
            self.garantia_text = other.garantia_text;
        }
        if self.iva_text.is_none() {
            self.iva_text = other.iva_text;
        }
        if self.etiqueta_ambiental_alt.is_none() {
            self.etiqueta_ambiental_alt = other.etiqueta_ambiental_alt;
        }
        if self.potencia_cv_dom.is_none() {
            self.potencia_cv_dom = other.potencia_cv_dom;
        }
    }
}

/// Absolute detail URL → recovered fields. URLs with nothing recovered are
/// absent; a missing key means "no corroboration available".
#[derive(Debug, Clone, Default)]
pub struct DomIndex {
    entries: HashMap<String, DomExtra>,
}

impl DomIndex {
    #[must_use]
    pub fn get(&self, url: &str) -> Option<&DomExtra> {
        self.entries.get(url)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Merges `extra` into the entry for `url`.
    ///
    /// When the same URL is linked more than once (card title plus thumbnail),
    /// the first anchor to recover a field keeps it; later anchors only fill
    /// fields still missing.
    pub fn merge(&mut self, url: String, extra: DomExtra) {
        if !extra.has_any() {
            return;
        }
        self.entries
            .entry(url)
            .or_default()
            .fill_missing_from(extra);
    }
}

impl FromIterator<(String, DomExtra)> for DomIndex {
    fn from_iter<I: IntoIterator<Item = (String, DomExtra)>>(iter: I) -> Self {
        let mut index = DomIndex::default();
        for (url, extra) in iter {
            index.merge(url, extra);
        }
        index
    }
}

/// Scans `html` for detail-page anchors (`href` containing `.aspx` or `covo`)
/// and builds the corroboration index, resolving hrefs against `base`.
#[must_use]
pub fn build_dom_index(html: &str, base: &str) -> DomIndex {
    let mut anchors = 0usize;
    let mut index = DomIndex::default();

    for caps in DETAIL_LINK_RE.captures_iter(html) {
        let (Some(whole), Some(href)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        anchors += 1;
        let url = absolutize_url(href.as_str(), base);
        let window = corroboration_window(html, whole.start(), CORROBORATION_WINDOW);
        index.merge(url, scan_window(window));
    }

    tracing::debug!(
        anchors,
        indexed = index.len(),
        "built DOM corroboration index"
    );
    index
}

/// Returns the slice `[pos - radius, pos + radius)` clamped to `html` and
/// snapped outward to valid UTF-8 char boundaries.
fn corroboration_window(html: &str, pos: usize, radius: usize) -> &str {
    let candidate_start = pos.saturating_sub(radius);
    let start = (0..=candidate_start)
        .rev()
        .find(|&i| html.is_char_boundary(i))
        .unwrap_or(0);

    let candidate_end = pos.saturating_add(radius).min(html.len());
    let end = (candidate_end..=html.len())
        .find(|&i| html.is_char_boundary(i))
        .unwrap_or(html.len());

    &html[start..end]
}

fn scan_window(window: &str) -> DomExtra {
    let mut extra = DomExtra::default();

    for caps in PRICE_INFO_RE.captures_iter(window) {
        let Some(inner) = caps.get(1) else {
            continue;
        };
        let text = tag_text(inner.as_str());
        if text.is_empty() {
            continue;
        }
        let lower = text.to_lowercase();
        if lower.contains("garant") && extra.garantia_text.is_none() {
            extra.garantia_text = Some(text.clone());
        }
        if lower.contains("iva") && extra.iva_text.is_none() {
            extra.iva_text = Some(text);
        }
    }

    extra.etiqueta_ambiental_alt = ENV_LABEL_RE
        .captures(window)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_owned());

    extra.potencia_cv_dom = HORSEPOWER_RE
        .captures_iter(window)
        .find_map(|c| c.get(1)?.as_str().parse::<u32>().ok());

    extra
}

#[cfg(test)]
#[path = "dom_index_test.rs"]
mod tests;
