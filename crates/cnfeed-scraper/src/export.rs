//! Rendering of a scraped listing as JSON, NDJSON or CSV.
//!
//! All renderers are infallible: values are already JSON trees or flat
//! scalars, so serialization goes through `serde_json::Value`'s `Display`.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::pipeline::ListingPage;
use crate::types::{normalize_number, FieldValue, FlatRow};

/// Columns that lead every CSV, in this order, when present in any row.
/// Remaining columns follow in first-seen order.
pub const PREFERRED_COLUMNS: &[&str] = &[
    "title",
    "make",
    "model",
    "year",
    "km",
    "price",
    "includesTaxes",
    "iva_incluido",
    "iva_text",
    "hasWarranty",
    "garantia_text",
    "warrantyId",
    "warrantyMonths",
    "hp",
    "potencia_cv",
    "fuelType",
    "environmentalLabel_json",
    "etiqueta_ambiental_alt",
    "bodyTypeId",
    "offerType",
    "isProfessional",
    "isFinanced",
    "isCertified",
    "location_region",
    "location_provincia",
    "location_ciudad",
    "location_region_id",
    "location_provincia_id",
    "location_provinceIds",
    "id",
    "url",
    "enlace_abs",
    "img",
    "imgUrl",
    "photos",
    "fotos_count",
    "videos",
    "videos_count",
    "makeId",
    "modelId",
    "specificFuelTypeId",
    "taxTypeId",
    "priceAverageIndicator",
    "priceRankIndicator",
    "creationDate",
    "publicationDate",
    "isUrlSemantic",
    "hasOnlineFinancing",
    "hasReservation",
    "seller_id",
    "seller_type",
    "seller_name",
    "seller_phone",
    "seller_email",
    "pack_type",
    "pack_legacyId",
];

const FILENAME_BASE: &str = "coches_concesionario";

/// Output format selected by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Enveloped, flattened rows.
    #[default]
    Json,
    /// Raw records, one per line.
    Jsonl,
    /// Flattened rows as a table.
    Csv,
}

impl OutputFormat {
    /// Lenient parse for query strings: case-insensitive, anything
    /// unrecognised (or absent) means [`OutputFormat::Json`].
    #[must_use]
    pub fn from_query(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }

    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json; charset=utf-8",
            Self::Jsonl => "application/x-ndjson; charset=utf-8",
            Self::Csv => "text/csv; charset=utf-8",
        }
    }

    /// Suggested download filename.
    #[must_use]
    pub fn filename(self) -> String {
        let suffix = match self {
            Self::Json => "_flat.json",
            Self::Jsonl => "_raw.jsonl",
            Self::Csv => "_flat.csv",
        };
        format!("{FILENAME_BASE}{suffix}")
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::Jsonl),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown format \"{other}\" (expected json, jsonl or csv)")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Jsonl => write!(f, "jsonl"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// A rendered response body plus the metadata the transport layer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedOutput {
    pub body: String,
    pub content_type: &'static str,
    pub filename: String,
}

/// Renders `page` in `format`.
///
/// `source_url` and `generated_at` only appear in the JSON envelope; `pretty`
/// only affects JSON.
#[must_use]
pub fn render(
    page: &ListingPage,
    format: OutputFormat,
    source_url: &str,
    generated_at: DateTime<Utc>,
    pretty: bool,
) -> RenderedOutput {
    let body = match format {
        OutputFormat::Json => to_json_envelope(page, source_url, generated_at, pretty),
        OutputFormat::Jsonl => to_jsonl(&page.raw_items),
        OutputFormat::Csv => to_csv(&page.rows),
    };
    RenderedOutput {
        body,
        content_type: format.content_type(),
        filename: format.filename(),
    }
}

/// `{ ok, meta: { url, totalResults, count, generatedAt }, items }`.
#[must_use]
pub fn to_json_envelope(
    page: &ListingPage,
    source_url: &str,
    generated_at: DateTime<Utc>,
    pretty: bool,
) -> String {
    let envelope = json!({
        "ok": true,
        "meta": {
            "url": source_url,
            "totalResults": page.total_results,
            "count": page.rows.len(),
            "generatedAt": generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        },
        "items": page.rows.iter().map(FlatRow::to_json).collect::<Vec<_>>(),
    });
    if pretty {
        format!("{envelope:#}")
    } else {
        envelope.to_string()
    }
}

/// One compact JSON record per line, each newline-terminated. No records
/// yields an empty string.
#[must_use]
pub fn to_jsonl(items: &[Value]) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(&item.to_string());
        out.push('\n');
    }
    out
}

/// Header plus one line per row, joined with `\n` (no trailing newline).
/// No rows yields an empty string.
///
/// Strings (header names included) are always double-quoted with inner
/// quotes doubled; numbers and booleans are bare; null/absent is empty.
#[must_use]
pub fn to_csv(rows: &[FlatRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let columns = union_columns(rows);

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        columns
            .iter()
            .map(|c| quote(c))
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in rows {
        lines.push(
            columns
                .iter()
                .map(|c| csv_cell(row.get(c)))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}

/// Union of all row keys: [`PREFERRED_COLUMNS`] first, then first-seen order.
#[must_use]
pub fn union_columns(rows: &[FlatRow]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut discovered: Vec<&str> = Vec::new();
    for key in rows.iter().flat_map(FlatRow::keys) {
        if seen.insert(key) {
            discovered.push(key);
        }
    }

    let mut columns: Vec<String> = PREFERRED_COLUMNS
        .iter()
        .filter(|c| seen.contains(**c))
        .map(|c| (*c).to_owned())
        .collect();
    columns.extend(
        discovered
            .into_iter()
            .filter(|k| !PREFERRED_COLUMNS.contains(k))
            .map(str::to_owned),
    );
    columns
}

fn csv_cell(value: Option<&FieldValue>) -> String {
    match value {
        None | Some(FieldValue::Null) => String::new(),
        Some(FieldValue::Bool(b)) => b.to_string(),
        Some(FieldValue::Number(n)) => n.to_string(),
        Some(FieldValue::Text(s)) => quote(s),
        Some(FieldValue::Raw(raw)) => match raw {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => normalize_number(n).to_string(),
            Value::String(s) => quote(s),
            nested @ (Value::Array(_) | Value::Object(_)) => quote(&nested.to_string()),
        },
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
