//! Upsert sink

use super::types::UpsertStore;
use crate::error::Result;
use crate::records::TableRecord;
use crate::types::JsonObject;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of one batch write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Rows sent to the store
    pub written: usize,
    /// Rows discarded for a missing conflict key
    pub dropped: usize,
    /// Rows superseded by a later row with the same key in the batch
    pub merged: usize,
}

/// Whether every conflict-key column holds a non-null, non-empty value
pub fn has_conflict_key(row: &JsonObject, conflict_key: &[&str]) -> bool {
    conflict_key.iter().all(|col| match row.get(*col) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    })
}

/// Keep the last row for each conflict-key tuple, in first-seen order
///
/// A single `ON CONFLICT DO UPDATE` statement cannot touch the same key twice.
pub fn collapse_duplicate_keys(rows: Vec<JsonObject>, conflict_key: &[&str]) -> Vec<JsonObject> {
    let mut slots: HashMap<Vec<String>, usize> = HashMap::with_capacity(rows.len());
    let mut unique: Vec<JsonObject> = Vec::with_capacity(rows.len());

    for row in rows {
        let key: Vec<String> = conflict_key
            .iter()
            .map(|col| key_part(row.get(*col)))
            .collect();
        match slots.get(&key) {
            Some(&idx) => unique[idx] = row,
            None => {
                slots.insert(key, unique.len());
                unique.push(row);
            }
        }
    }
    unique
}

fn key_part(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Batch writer enforcing the conflict-key invariant
#[derive(Clone)]
pub struct UpsertSink {
    store: Arc<dyn UpsertStore>,
}

impl UpsertSink {
    /// Create a sink over a store
    pub fn new(store: Arc<dyn UpsertStore>) -> Self {
        Self { store }
    }

    /// Upsert `rows` into `table` merging on `conflict_key`
    ///
    /// Rows lacking a key are dropped first, then rows sharing a key collapse
    /// to the last one. An empty batch issues no write.
    pub async fn upsert(
        &self,
        table: &str,
        rows: Vec<JsonObject>,
        conflict_key: &[&str],
    ) -> Result<WriteOutcome> {
        let total = rows.len();
        let keyed: Vec<JsonObject> = rows
            .into_iter()
            .filter(|row| has_conflict_key(row, conflict_key))
            .collect();
        let dropped = total - keyed.len();
        let before_merge = keyed.len();
        let unique = collapse_duplicate_keys(keyed, conflict_key);
        let merged = before_merge - unique.len();

        if dropped > 0 {
            warn!(table, dropped, "dropping rows without conflict key");
        }
        if merged > 0 {
            debug!(table, merged, "collapsed rows sharing a conflict key");
        }
        if unique.is_empty() {
            debug!(table, "nothing to write");
            return Ok(WriteOutcome {
                written: 0,
                dropped,
                merged,
            });
        }

        self.store.upsert(table, &unique, conflict_key).await?;
        Ok(WriteOutcome {
            written: unique.len(),
            dropped,
            merged,
        })
    }

    /// Upsert typed records into their own table
    pub async fn upsert_records<R: TableRecord>(&self, records: &[R]) -> Result<WriteOutcome> {
        let rows = records
            .iter()
            .map(TableRecord::to_row)
            .collect::<Result<Vec<_>>>()?;
        self.upsert(R::TABLE, rows, R::CONFLICT_KEY).await
    }
}

impl std::fmt::Debug for UpsertSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpsertSink").finish_non_exhaustive()
    }
}
