//! One-shot transform of a fetched dealer page into listing rows.
//!
//! ```text
//! html ──► extract_initial_props ──► extract_vehicles_list ──► items
//!   │                                                           │
//!   └──────► build_dom_index ──────────────► flatten_item ◄─────┘
//! ```

use std::collections::HashSet;

use serde_json::Value;

use crate::dom_index::{build_dom_index, DomIndex};
use crate::embedded::extract_initial_props;
use crate::error::ScraperError;
use crate::flatten::flatten_item;
use crate::listing::extract_vehicles_list;
use crate::types::{FieldValue, FlatRow};

/// Everything one page yields: raw records (for NDJSON), their flattened
/// rows in the same order, and the marketplace-reported total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage {
    pub raw_items: Vec<Value>,
    pub rows: Vec<FlatRow>,
    pub total_results: u64,
}

impl ListingPage {
    #[must_use]
    pub fn count(&self) -> usize {
        self.rows.len()
    }
}

/// Runs the full pipeline over `html`, resolving links against `base`.
///
/// # Errors
///
/// Returns [`ScraperError::PayloadNotFound`] when the page carries no
/// recoverable `__INITIAL_PROPS__` payload. Every other anomaly degrades to
/// empty or null output.
pub fn scrape_listing(html: &str, base: &str) -> Result<ListingPage, ScraperError> {
    let payload = extract_initial_props(html)?;
    let listing = extract_vehicles_list(&payload);
    let dom = build_dom_index(html, base);
    let rows = join_rows(&listing.items, &dom, base);

    tracing::info!(
        total_results = listing.total_results,
        count = rows.len(),
        dom_entries = dom.len(),
        "scraped dealer listing"
    );

    Ok(ListingPage {
        raw_items: listing.items,
        rows,
        total_results: listing.total_results,
    })
}

/// Joins payload records with the DOM index on absolute URL.
///
/// Every payload record yields a row, matched or not. Index entries that no
/// record points at are counted for diagnostics and otherwise dropped.
fn join_rows(items: &[Value], dom: &DomIndex, base: &str) -> Vec<FlatRow> {
    let rows: Vec<FlatRow> = items
        .iter()
        .map(|item| flatten_item(item, dom, base))
        .collect();

    if !dom.is_empty() {
        let linked = rows
            .iter()
            .filter_map(|row| match row.get("enlace_abs") {
                Some(FieldValue::Text(url)) => Some(url.as_str()),
                _ => None,
            })
            .collect::<HashSet<_>>();
        let orphaned = dom.urls().filter(|url| !linked.contains(url)).count();
        if orphaned > 0 {
            tracing::debug!(
                orphaned,
                "DOM corroboration entries without a matching payload record"
            );
        }
    }

    rows
}
