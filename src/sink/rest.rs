//! PostgREST-style store over HTTP

use super::types::UpsertStore;
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use crate::types::JsonObject;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use url::Url;

const MERGE_PREFER: &str = "resolution=merge-duplicates,return=minimal";
const INSERT_PREFER: &str = "return=minimal";

/// Store backed by a PostgREST endpoint (`{base}/rest/v1/{table}`)
#[derive(Debug, Clone)]
pub struct RestStore {
    client: HttpClient,
    base: Url,
    key: String,
}

impl RestStore {
    /// Create a store for `base_url`, authenticating with `key`
    pub fn new(client: HttpClient, base_url: &str, key: impl Into<String>) -> Result<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client,
            base: base.join("rest/v1/")?,
            key: key.into(),
        })
    }

    /// Endpoint URL for a table
    pub fn table_url(&self, table: &str) -> Result<Url> {
        Ok(self.base.join(table)?)
    }

    fn authed(&self, req: RequestConfig) -> RequestConfig {
        req.header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", self.key))
    }

    async fn post_rows(&self, table: &str, rows: &[JsonObject], req: RequestConfig) -> Result<()> {
        let url = self.table_url(table)?;
        let body = Value::Array(rows.iter().cloned().map(Value::Object).collect());
        self.client
            .post(url.as_str(), self.authed(req).json(body))
            .await
            .map_err(|e| e.for_table(table))?;
        debug!(table, rows = rows.len(), "wrote rows");
        Ok(())
    }
}

#[async_trait]
impl UpsertStore for RestStore {
    async fn upsert(&self, table: &str, rows: &[JsonObject], conflict_key: &[&str]) -> Result<()> {
        let req = RequestConfig::new()
            .query("on_conflict", conflict_key.join(","))
            .header("Prefer", MERGE_PREFER);
        self.post_rows(table, rows, req).await
    }

    async fn insert(&self, table: &str, rows: &[JsonObject]) -> Result<()> {
        let req = RequestConfig::new().header("Prefer", INSERT_PREFER);
        self.post_rows(table, rows, req).await
    }

    async fn fetch_one(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Option<JsonObject>> {
        let url = self.table_url(table)?;
        let req = self.authed(
            RequestConfig::new()
                .query("select", "*")
                .query(column, format!("eq.{value}"))
                .query("limit", "1"),
        );
        let rows: Vec<JsonObject> = self
            .client
            .get_json(url.as_str(), req)
            .await
            .map_err(|e| e.for_table(table))?;
        Ok(rows.into_iter().next())
    }
}
