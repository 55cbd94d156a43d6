//! In-process store

use super::types::UpsertStore;
use crate::error::{Error, Result};
use crate::types::JsonObject;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Tables held in memory with the same merge semantics as the REST store
///
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<HashMap<String, Vec<JsonObject>>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<JsonObject>>>> {
        self.tables
            .lock()
            .map_err(|_| Error::Other("memory store lock poisoned".to_string()))
    }

    /// Snapshot of a table's rows in insertion order
    pub fn rows(&self, table: &str) -> Vec<JsonObject> {
        self.lock()
            .ok()
            .and_then(|tables| tables.get(table).cloned())
            .unwrap_or_default()
    }

    /// Number of rows in a table
    pub fn row_count(&self, table: &str) -> usize {
        self.rows(table).len()
    }
}

fn key_of(row: &JsonObject, conflict_key: &[&str]) -> Vec<Value> {
    conflict_key
        .iter()
        .map(|col| row.get(*col).cloned().unwrap_or(Value::Null))
        .collect()
}

#[async_trait]
impl UpsertStore for MemoryStore {
    async fn upsert(&self, table: &str, rows: &[JsonObject], conflict_key: &[&str]) -> Result<()> {
        let mut tables = self.lock()?;
        let existing = tables.entry(table.to_string()).or_default();

        for row in rows {
            let key = key_of(row, conflict_key);
            match existing
                .iter_mut()
                .find(|current| key_of(current, conflict_key) == key)
            {
                Some(current) => {
                    for (column, value) in row {
                        current.insert(column.clone(), value.clone());
                    }
                }
                None => existing.push(row.clone()),
            }
        }
        Ok(())
    }

    async fn insert(&self, table: &str, rows: &[JsonObject]) -> Result<()> {
        let mut tables = self.lock()?;
        tables
            .entry(table.to_string())
            .or_default()
            .extend(rows.iter().cloned());
        Ok(())
    }

    async fn fetch_one(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Option<JsonObject>> {
        let tables = self.lock()?;
        Ok(tables.get(table).and_then(|rows| {
            rows.iter()
                .find(|row| row.get(column).and_then(Value::as_str) == Some(value))
                .cloned()
        }))
    }
}
