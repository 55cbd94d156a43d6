//! Cursor type for paginated sources
//!
//! Persisted as a JSON object in `ingest_state.cursor`. The reset cursor is
//! stored as `{}` so the next run starts over.

use crate::types::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resumption offset for one paginated source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Number of upstream rows already consumed this cycle
    pub offset: u64,
}

impl Cursor {
    /// Cursor at the beginning of a source
    pub fn start() -> Self {
        Self::default()
    }

    /// Cursor at a given offset
    pub fn at(offset: u64) -> Self {
        Self { offset }
    }

    /// Cursor advanced past one page
    #[must_use]
    pub fn advance(self, page_size: u64) -> Self {
        Self {
            offset: self.offset.saturating_add(page_size),
        }
    }

    /// Persisted form; the start cursor is `{}`
    pub fn to_json(self) -> Value {
        let mut obj = JsonObject::new();
        if self.offset > 0 {
            obj.insert("offset".to_string(), Value::from(self.offset));
        }
        Value::Object(obj)
    }

    /// Read a persisted cursor
    ///
    /// Anything without a non-negative integer `offset` loads as the start.
    pub fn from_json(value: &Value) -> Self {
        let offset = value
            .get("offset")
            .and_then(|v| match v {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .unwrap_or(0);
        Self { offset }
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "offset={}", self.offset)
    }
}
