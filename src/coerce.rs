//! Field-level value coercion
//!
//! Every function here is total: bad input degrades to `None` (or an empty
//! JSON default) so a single malformed field never aborts a row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static LEADING_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+").expect("valid regex"));
static ADDRESS_JUNK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Z0-9#/\-\s]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Expected shape of a JSON-encoded auxiliary field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    /// Mapping; falls back to `{}`
    Object,
    /// Sequence; falls back to `[]`
    Array,
}

impl JsonShape {
    fn empty(self) -> Value {
        match self {
            Self::Object => Value::Object(serde_json::Map::new()),
            Self::Array => Value::Array(Vec::new()),
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

/// Trimmed text, `None` when blank
pub fn to_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse a number, ignoring currency symbols and digit grouping
pub fn to_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse the leading base-10 integer (`"12.7"` gives 12)
pub fn to_integer(raw: &str) -> Option<i64> {
    LEADING_INT
        .find(raw.trim())
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Parse a calendar date or date-time into UTC
///
/// Naive values are taken as UTC; bare dates become midnight.
pub fn to_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%m/%d/%Y %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

/// Parse a JSON-encoded field, falling back to an empty value of `shape`
pub fn to_json(raw: &str, shape: JsonShape) -> Value {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(value) if shape.matches(&value) => value,
        _ => shape.empty(),
    }
}

/// Canonical form of a street address for matching
pub fn normalize_address(raw: &str) -> Option<String> {
    let upper = raw.to_uppercase();
    let stripped = ADDRESS_JUNK.replace_all(&upper, " ");
    let collapsed = WHITESPACE.replace_all(stripped.trim(), " ");
    to_text(&collapsed)
}
