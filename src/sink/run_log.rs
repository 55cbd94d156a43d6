//! Append-only run log

use super::types::UpsertStore;
use crate::error::{Error, Result};
use crate::types::{RunStatus, TaskCounts};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Run-log table
pub const RUNS_TABLE: &str = "ingest_runs";

/// Source name of the per-invocation heartbeat row
pub const HEARTBEAT_SOURCE: &str = "heartbeat";

/// One row of `ingest_runs`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunLogEntry {
    pub source: String,
    pub status: RunStatus,
    pub detail: Option<String>,
    pub counts: TaskCounts,
    pub ran_at: DateTime<Utc>,
}

/// Writer for `ingest_runs`; rows are only ever inserted
#[derive(Clone)]
pub struct RunLog {
    store: Arc<dyn UpsertStore>,
}

impl RunLog {
    /// Create a run log over a store
    pub fn new(store: Arc<dyn UpsertStore>) -> Self {
        Self { store }
    }

    /// Insert one entry stamped with the current time
    pub async fn append(
        &self,
        source: &str,
        status: RunStatus,
        detail: Option<String>,
        counts: TaskCounts,
    ) -> Result<()> {
        let entry = RunLogEntry {
            source: source.to_string(),
            status,
            detail,
            counts,
            ran_at: Utc::now(),
        };
        let serde_json::Value::Object(row) = serde_json::to_value(&entry)? else {
            return Err(Error::Other("run log entry is not an object".to_string()));
        };

        self.store.insert(RUNS_TABLE, &[row]).await?;
        debug!(source, %status, "appended run log entry");
        Ok(())
    }
}

impl std::fmt::Debug for RunLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLog").finish_non_exhaustive()
    }
}
