//! Record traits

use crate::error::Result;
use crate::types::{CsvRow, JsonObject};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// A row destined for one table
pub trait TableRecord: Serialize + Send + Sync {
    /// Destination table
    const TABLE: &'static str;
    /// Columns the upsert merges on
    const CONFLICT_KEY: &'static [&'static str];

    /// Serialize into a destination row keyed by column name
    fn to_row(&self) -> Result<JsonObject> {
        match serde_json::to_value(self)? {
            Value::Object(obj) => Ok(obj),
            other => Err(crate::Error::Other(format!(
                "{} record serialized to non-object: {other}",
                Self::TABLE
            ))),
        }
    }
}

/// A record built from a CSV row
pub trait CsvRecord: TableRecord + Sized {
    /// Returns `None` when the row has no usable conflict key
    fn from_csv(row: &CsvRow, now: DateTime<Utc>) -> Option<Self>;
}

/// A record built from one element of a paged JSON source
pub trait PagedRecord: TableRecord + Sized {
    /// Cursor name in `ingest_state`
    const SOURCE: &'static str;
    /// Columns requested through `$select`; empty selects all
    const SELECT: &'static [&'static str];

    /// Returns `None` when the row has no usable conflict key
    fn from_json(row: &JsonObject, now: DateTime<Utc>) -> Option<Self>;
}
