//! Flattening of raw vehicle records into tabular rows.
//!
//! Structural conversion only: scalars are copied, a few fields are derived,
//! the three known nested objects are expanded with a prefix, and gaps are
//! filled from the DOM corroboration index. Flattening never fails; anything
//! that cannot be coerced to the expected scalar is left null.

use serde_json::{Number, Value};

use crate::dom_index::{DomExtra, DomIndex};
use crate::markup::absolutize_url;
use crate::types::{normalize_number, whole_number, FieldValue, FlatRow};

/// `location` sub-keys and the row columns they are projected into.
const LOCATION_COLUMNS: [(&str, &str); 5] = [
    ("regionLiteral", "location_region"),
    ("mainProvince", "location_provincia"),
    ("cityLiteral", "location_ciudad"),
    ("regionId", "location_region_id"),
    ("mainProvinceId", "location_provincia_id"),
];

/// Flattens one raw vehicle record.
///
/// `base` is the marketplace origin used to absolutize `url`; the result is
/// also the key used to look the record up in `dom`.
#[must_use]
pub fn flatten_item(item: &Value, dom: &DomIndex, base: &str) -> FlatRow {
    let record = item.as_object();
    let field = |name: &str| record.and_then(|m| m.get(name));

    let mut row = FlatRow::new();

    if let Some(map) = record {
        for (key, value) in map {
            if let Some(scalar) = FieldValue::from_scalar(value) {
                row.set(key.as_str(), scalar);
            }
        }
    }

    row.set(
        "potencia_cv",
        integer_value(field("hp")).map_or(FieldValue::Null, FieldValue::Number),
    );
    row.set("iva_incluido", is_truthy(field("includesTaxes")));
    row.set("con_garantia", is_truthy(field("hasWarranty")));

    let enlace_abs = field("url")
        .and_then(Value::as_str)
        .map(|url| absolutize_url(url, base))
        .unwrap_or_default();
    row.set("enlace_abs", enlace_abs.as_str());

    project_location(&mut row, field("location"));
    copy_prefixed(&mut row, "seller_", field("seller"));
    copy_prefixed(&mut row, "pack_", field("pack"));

    row.set("fotos_count", array_len(field("photos")));
    row.set("videos_count", array_len(field("videos")));

    if let Some(extra) = dom.get(&enlace_abs) {
        merge_dom_extra(&mut row, extra);
    }

    row.set(
        "environmentalLabel_json",
        FieldValue::Raw(field("environmentalLabel").cloned().unwrap_or(Value::Null)),
    );

    row
}

/// Applies the payload-wins rule: markup values only land in columns the
/// payload left blank (`potencia_cv` only when null).
pub fn merge_dom_extra(row: &mut FlatRow, extra: &DomExtra) {
    let text_fields = [
        ("garantia_text", &extra.garantia_text),
        ("iva_text", &extra.iva_text),
        ("etiqueta_ambiental_alt", &extra.etiqueta_ambiental_alt),
    ];
    for (column, recovered) in text_fields {
        let Some(recovered) = recovered.as_deref().filter(|s| !s.is_empty()) else {
            continue;
        };
        if row.get(column).is_none_or(FieldValue::is_blank) {
            row.set(column, recovered);
        }
    }

    if let Some(cv) = extra.potencia_cv_dom {
        if row.get("potencia_cv").is_none_or(FieldValue::is_null) {
            row.set("potencia_cv", u64::from(cv));
        }
    }
}

/// Returns `value` when it is an integral JSON number.
fn integer_value(value: Option<&Value>) -> Option<Number> {
    match value {
        Some(Value::Number(n)) => whole_number(n),
        _ => None,
    }
}

/// Loose truthiness: null, `false`, `0`, `NaN` and `""` are false; anything
/// else, including empty arrays and objects, is true.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// Projects `location` into `location_*` columns.
///
/// A missing, null or falsy `location` still emits the five columns as null
/// so every row has them. A truthy non-object scalar projects nothing.
fn project_location(row: &mut FlatRow, location: Option<&Value>) {
    let loc = match location {
        Some(Value::Object(map)) => Some(map),
        Some(Value::Array(_)) => None,
        other if !is_truthy(other) => None,
        _ => return,
    };
    let get = |key: &str| loc.and_then(|m| m.get(key));

    for (source, column) in LOCATION_COLUMNS {
        row.set(column, FieldValue::scalar_or_null(get(source)));
    }

    if let Some(Value::Array(ids)) = get("provinceIds") {
        let joined = ids.iter().map(join_element).collect::<Vec<_>>().join(",");
        row.set("location_provinceIds", joined);
    }
}

fn join_element(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => normalize_number(n).to_string(),
        nested @ (Value::Array(_) | Value::Object(_)) => nested.to_string(),
    }
}

/// Copies scalar keys of a nested object into the row as `{prefix}{key}`.
fn copy_prefixed(row: &mut FlatRow, prefix: &str, nested: Option<&Value>) {
    let Some(Value::Object(map)) = nested else {
        return;
    };
    for (key, value) in map {
        if let Some(scalar) = FieldValue::from_scalar(value) {
            row.set(format!("{prefix}{key}"), scalar);
        }
    }
}

fn array_len(value: Option<&Value>) -> Option<usize> {
    value.and_then(Value::as_array).map(Vec::len)
}

#[cfg(test)]
#[path = "flatten_test.rs"]
mod tests;
