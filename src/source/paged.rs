//! Paged JSON source reader

use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::types::JsonObject;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

/// Default `$order`; Socrata row ids keep offsets stable between pages
pub const DEFAULT_ORDER: &str = ":id";

/// One-page-at-a-time access to an offset-paged source
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page starting at `offset`; empty means exhausted
    async fn read_page(&self, offset: u64, limit: u64) -> Result<Vec<JsonObject>>;
}

/// Query parameters fixed for the lifetime of a source
#[derive(Debug, Clone, Default)]
pub struct PagedJsonSourceConfig {
    /// Query endpoint, e.g. `https://data.example.org/resource/xxxx-xxxx.json`
    pub endpoint: String,
    /// Columns for `$select`; empty selects everything
    pub select: Vec<String>,
    /// Optional `$where` expression
    pub filter: Option<String>,
    /// `$order` expression
    pub order: Option<String>,
    /// Sent as `X-App-Token` when present
    pub app_token: Option<String>,
}

impl PagedJsonSourceConfig {
    /// Config for an endpoint ordered by row id
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            order: Some(DEFAULT_ORDER.to_string()),
            ..Default::default()
        }
    }

    /// Restrict the selected columns
    #[must_use]
    pub fn with_select(mut self, columns: &[&str]) -> Self {
        self.select = columns.iter().map(ToString::to_string).collect();
        self
    }

    /// Set the `$where` filter
    #[must_use]
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    /// Set the app token
    #[must_use]
    pub fn with_app_token(mut self, token: Option<String>) -> Self {
        self.app_token = token;
        self
    }
}

/// Offset-paged reader for a Socrata-style query endpoint
#[derive(Debug, Clone)]
pub struct PagedJsonSource {
    client: HttpClient,
    config: PagedJsonSourceConfig,
}

impl PagedJsonSource {
    /// Create a reader on a shared client
    pub fn new(client: HttpClient, config: PagedJsonSourceConfig) -> Self {
        Self { client, config }
    }

    fn request(&self, offset: u64, limit: u64) -> RequestConfig {
        let mut req = RequestConfig::new();
        if !self.config.select.is_empty() {
            req = req.query("$select", self.config.select.join(","));
        }
        if let Some(ref filter) = self.config.filter {
            req = req.query("$where", filter);
        }
        if let Some(ref order) = self.config.order {
            req = req.query("$order", order);
        }
        req = req
            .query("$limit", limit.to_string())
            .query("$offset", offset.to_string());
        if let Some(ref token) = self.config.app_token {
            req = req.header("X-App-Token", token);
        }
        req
    }
}

#[async_trait]
impl PageSource for PagedJsonSource {
    async fn read_page(&self, offset: u64, limit: u64) -> Result<Vec<JsonObject>> {
        let endpoint = &self.config.endpoint;
        let body: Value = self
            .client
            .get_json(endpoint, self.request(offset, limit))
            .await
            .map_err(|e| e.for_source(endpoint))?;

        let Value::Array(items) = body else {
            return Err(Error::decode(format!(
                "Expected a JSON array from {endpoint}"
            )));
        };

        let total = items.len();
        let rows: Vec<JsonObject> = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(obj) => Some(obj),
                _ => None,
            })
            .collect();

        let skipped = total - rows.len();
        if skipped > 0 {
            // Empty means exhausted; a page of non-objects is not
            if rows.is_empty() {
                return Err(Error::decode(format!(
                    "Page at offset {offset} from {endpoint} holds {total} elements and none are objects"
                )));
            }
            warn!(endpoint, offset, skipped, "skipping non-object elements");
        }

        debug!(endpoint, offset, limit, rows = rows.len(), "fetched page");
        Ok(rows)
    }
}
