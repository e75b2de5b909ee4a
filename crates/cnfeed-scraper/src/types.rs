//! Output shapes for flattened listing rows.
//!
//! ## Observed shape of a raw vehicle record (coches.net dealer pages)
//!
//! ### Scalars
//! Most keys are plain scalars (`title`, `make`, `model`, `year`, `km`,
//! `price`, `fuelType`, `offerType`, ...). They are copied into the row
//! verbatim, including explicit `null`s.
//!
//! ### `hp`
//! An integer when known. Observed as `null` or absent for some listings; the
//! card markup usually still shows it as `"110 CV"`.
//!
//! ### `location`
//! Object with `regionLiteral`, `mainProvince`, `cityLiteral`, `regionId`,
//! `mainProvinceId` and a `provinceIds` array of integers.
//!
//! ### `seller` / `pack`
//! Small flat objects (`id`, `type`, `name`, ... / `type`, `legacyId`).
//!
//! ### `photos` / `videos`
//! Arrays of media objects; only their length is kept.
//!
//! ### `environmentalLabel`
//! Inconsistent: a string, a numeric id, an object, or absent. Carried through
//! unchanged as `environmentalLabel_json`.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Number, Value};

/// One cell of a [`FlatRow`].
///
/// Every value is a scalar or null. `Raw` exists only for
/// `environmentalLabel_json`, which keeps the source value as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    Raw(Value),
}

impl FieldValue {
    /// Converts a JSON value, keeping only scalars. Arrays and objects map
    /// to `None`.
    #[must_use]
    pub fn from_scalar(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => Some(Self::Number(normalize_number(n))),
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Like [`FieldValue::from_scalar`], but non-scalars become `Null`.
    #[must_use]
    pub fn scalar_or_null(value: Option<&Value>) -> Self {
        value.and_then(Self::from_scalar).unwrap_or(Self::Null)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Raw(Value::Null))
    }

    /// Null, empty text or `false`: the values a DOM fallback may replace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null | Self::Bool(false) => true,
            Self::Text(s) => s.is_empty(),
            Self::Number(n) => n.as_f64() == Some(0.0),
            Self::Bool(true) => false,
            Self::Raw(v) => v.is_null(),
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::Text(s) => Value::String(s.clone()),
            Self::Raw(v) => v.clone(),
        }
    }
}

/// Returns `n` as an integer when it is one, counting floats with no
/// fractional part (`120.0`, `1e5`) as integers.
#[allow(clippy::cast_possible_truncation)] // guarded by the fract/range check
pub(crate) fn whole_number(n: &Number) -> Option<Number> {
    if n.is_i64() || n.is_u64() {
        return Some(n.clone());
    }
    let f = n.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
        return Some(Number::from(f as i64));
    }
    None
}

/// Whole-valued floats become integers so they render as `15000`, not
/// `15000.0`. Fractional values are kept.
pub(crate) fn normalize_number(n: &Number) -> Number {
    whole_number(n).unwrap_or_else(|| n.clone())
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<u64> for FieldValue {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Raw(v) => v.serialize(serializer),
        }
    }
}

/// A flattened vehicle record: column name → cell, in insertion order.
///
/// Rows carry a few dozen keys, so lookups scan the backing `Vec`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRow {
    fields: Vec<(String, FieldValue)>,
}

impl FlatRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`. An existing key keeps its position and takes the new value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.fields.push((key, value));
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Builds the equivalent JSON object, keeping column order.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for FlatRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        value.to_json()
    }
}

impl From<Option<u32>> for FieldValue {
    fn from(n: Option<u32>) -> Self {
        n.map_or(Self::Null, |n| Self::Number(n.into()))
    }
}

impl From<Option<usize>> for FieldValue {
    fn from(n: Option<usize>) -> Self {
        n.map_or(Self::Null, |n| Self::Number((n as u64).into()))
    }
}
