//! Uniform field access over CSV and JSON rows

use crate::coerce;
use crate::types::{CsvRow, JsonObject};
use serde_json::Value;

/// Read a source field as trimmed, non-empty text
pub trait FieldSource {
    /// The raw text of `name`, `None` when missing or blank
    fn text(&self, name: &str) -> Option<String>;

    /// The first present field among `names`
    fn first_text(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| self.text(name))
    }

    /// `name` coerced with [`coerce::to_number`]
    fn number(&self, name: &str) -> Option<f64> {
        self.text(name).and_then(|raw| coerce::to_number(&raw))
    }

    /// `name` coerced with [`coerce::to_integer`]
    fn integer(&self, name: &str) -> Option<i64> {
        self.text(name).and_then(|raw| coerce::to_integer(&raw))
    }
}

impl FieldSource for CsvRow {
    fn text(&self, name: &str) -> Option<String> {
        self.get(name).and_then(|raw| coerce::to_text(raw))
    }
}

impl FieldSource for JsonObject {
    fn text(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::String(s) => coerce::to_text(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}
