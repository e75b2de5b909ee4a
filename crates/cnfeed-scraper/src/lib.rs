//! Scraping and rendering of coches.net dealer listing pages.
//!
//! [`scrape_listing`] turns a fetched page into [`ListingPage`] rows;
//! [`render`] serializes them as JSON, NDJSON or CSV.

pub mod client;
pub mod dom_index;
pub mod embedded;
pub mod error;
pub mod export;
pub mod flatten;
pub mod listing;
pub mod markup;
pub mod pipeline;
pub(crate) mod rate_limit;
pub mod types;

pub use client::{build_dealer_url, DealerClient};
pub use error::ScraperError;
pub use export::{render, OutputFormat, RenderedOutput};
pub use pipeline::{scrape_listing, ListingPage};
pub use types::{FieldValue, FlatRow};
