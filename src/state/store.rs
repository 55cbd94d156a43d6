//! Cursor persistence in `ingest_state`

use super::types::Cursor;
use crate::error::Result;
use crate::sink::UpsertStore;
use crate::types::JsonObject;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Cursor table
pub const STATE_TABLE: &str = "ingest_state";

const STATE_KEY: &[&str] = &["source"];

/// Loads and saves one cursor row per source
#[derive(Clone)]
pub struct CursorStore {
    store: Arc<dyn UpsertStore>,
}

impl CursorStore {
    /// Create a cursor store over a store
    pub fn new(store: Arc<dyn UpsertStore>) -> Self {
        Self { store }
    }

    /// Persisted cursor for `source`, or the start when none is stored
    pub async fn load(&self, source: &str) -> Result<Cursor> {
        let cursor = self
            .store
            .fetch_one(STATE_TABLE, "source", source)
            .await?
            .and_then(|row| row.get("cursor").cloned())
            .map_or_else(Cursor::start, |value| Cursor::from_json(&value));

        debug!(source, %cursor, "loaded cursor");
        Ok(cursor)
    }

    /// Persist `cursor`, or the empty cursor when the source is `exhausted`
    pub async fn save(&self, source: &str, cursor: &Cursor, exhausted: bool) -> Result<()> {
        let persisted = if exhausted { Cursor::start() } else { *cursor };

        let mut row = JsonObject::new();
        row.insert("source".to_string(), Value::from(source));
        row.insert("cursor".to_string(), persisted.to_json());
        row.insert("updated_at".to_string(), Value::from(Utc::now().to_rfc3339()));

        self.store.upsert(STATE_TABLE, &[row], STATE_KEY).await?;

        if exhausted {
            info!(source, "source exhausted, cursor reset");
        } else {
            debug!(source, cursor = %persisted, "saved cursor");
        }
        Ok(())
    }

    /// Restart `source` from the beginning on its next run
    pub async fn reset(&self, source: &str) -> Result<()> {
        self.save(source, &Cursor::start(), true).await
    }
}

impl std::fmt::Debug for CursorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorStore").finish_non_exhaustive()
    }
}
