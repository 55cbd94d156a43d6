//! Store trait

use crate::error::Result;
use crate::types::JsonObject;
use async_trait::async_trait;

/// A table store with conflict-key merge semantics
///
/// Each call is all-or-nothing: either every row lands or an error is
/// returned.
#[async_trait]
pub trait UpsertStore: Send + Sync {
    /// Insert rows, replacing any existing row with the same `conflict_key`
    async fn upsert(&self, table: &str, rows: &[JsonObject], conflict_key: &[&str]) -> Result<()>;

    /// Insert rows without conflict handling
    async fn insert(&self, table: &str, rows: &[JsonObject]) -> Result<()>;

    /// The first row whose `column` equals `value`
    async fn fetch_one(&self, table: &str, column: &str, value: &str)
        -> Result<Option<JsonObject>>;
}
