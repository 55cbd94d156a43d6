//! Runtime configuration
//!
//! Everything comes from environment variables and is validated once into an
//! immutable [`IngestConfig`]. Reads go through a lookup function so tests can
//! supply a map instead of the process environment.

use crate::engine::{PagingConfig, DEFAULT_MAX_PAGES_PER_RUN, DEFAULT_PAGE_SIZE};
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::jobs::Job;
use crate::types::BackoffType;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Load a `.env` file if present
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

// ============================================================================
// Variable names
// ============================================================================

pub const STORE_URL: &str = "STORE_URL";
pub const STORE_KEY: &str = "STORE_KEY";
pub const BUILDINGS_CSV_URL: &str = "BUILDINGS_CSV_URL";
pub const LISTINGS_CSV_URL: &str = "LISTINGS_CSV_URL";
pub const INTEL_CSV_URL: &str = "INTEL_CSV_URL";
pub const PLUTO_URL: &str = "PLUTO_URL";
pub const DOB_PERMITS_URL: &str = "DOB_PERMITS_URL";
pub const SOCRATA_APP_TOKEN: &str = "SOCRATA_APP_TOKEN";
pub const INGEST_TRIGGER_SECRET: &str = "INGEST_TRIGGER_SECRET";
pub const PLUTO_WHERE: &str = "PLUTO_WHERE";
pub const DOB_WHERE: &str = "DOB_WHERE";
pub const INGEST_PAGE_SIZE: &str = "INGEST_PAGE_SIZE";
pub const INGEST_MAX_PAGES_PER_RUN: &str = "INGEST_MAX_PAGES_PER_RUN";
pub const INGEST_HTTP_TIMEOUT_SECS: &str = "INGEST_HTTP_TIMEOUT_SECS";
pub const INGEST_HTTP_MAX_RETRIES: &str = "INGEST_HTTP_MAX_RETRIES";
pub const INGEST_HTTP_BACKOFF: &str = "INGEST_HTTP_BACKOFF";
pub const INGEST_HTTP_BACKOFF_MS: &str = "INGEST_HTTP_BACKOFF_MS";
pub const INGEST_RATE_LIMIT_RPS: &str = "INGEST_RATE_LIMIT_RPS";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HTTP_BACKOFF_MS: u64 = 250;
const MAX_HTTP_BACKOFF: Duration = Duration::from_secs(10);

// ============================================================================
// IngestConfig
// ============================================================================

/// Validated configuration for one process
#[derive(Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Storage base URL
    pub store_url: String,
    /// Storage service credential
    pub store_key: String,
    pub buildings_csv_url: Option<String>,
    pub listings_csv_url: Option<String>,
    pub intel_csv_url: Option<String>,
    pub pluto_url: Option<String>,
    pub dob_permits_url: Option<String>,
    /// `X-App-Token` for the query endpoints
    pub socrata_app_token: Option<String>,
    /// Shared secret for the trigger endpoint
    pub trigger_secret: Option<String>,
    pub pluto_where: Option<String>,
    pub dob_where: Option<String>,
    pub paging: PagingConfig,
    pub http_timeout: Duration,
    pub http_max_retries: u32,
    /// Delay growth between retries
    pub http_backoff: BackoffType,
    /// First retry delay
    pub http_backoff_initial: Duration,
    pub rate_limit_rps: Option<u32>,
}

impl IngestConfig {
    /// Read from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through `lookup`; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let opt = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| opt(key).ok_or_else(|| Error::missing_field(key));

        let store_url = required(STORE_URL)?;
        Url::parse(&store_url).map_err(|e| Error::invalid_value(STORE_URL, e.to_string()))?;

        let page_size = parse_or(opt(INGEST_PAGE_SIZE), INGEST_PAGE_SIZE, DEFAULT_PAGE_SIZE)?;
        let max_pages = parse_or(
            opt(INGEST_MAX_PAGES_PER_RUN),
            INGEST_MAX_PAGES_PER_RUN,
            DEFAULT_MAX_PAGES_PER_RUN,
        )?;
        if page_size == 0 {
            return Err(Error::invalid_value(INGEST_PAGE_SIZE, "must be at least 1"));
        }
        if max_pages == 0 {
            return Err(Error::invalid_value(INGEST_MAX_PAGES_PER_RUN, "must be at least 1"));
        }

        let timeout_secs = parse_or(
            opt(INGEST_HTTP_TIMEOUT_SECS),
            INGEST_HTTP_TIMEOUT_SECS,
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?;
        let rate_limit_rps = opt(INGEST_RATE_LIMIT_RPS)
            .map(|raw| parse_value::<u32>(&raw, INGEST_RATE_LIMIT_RPS))
            .transpose()?
            .filter(|rps| *rps > 0);

        Ok(Self {
            store_key: required(STORE_KEY)?,
            store_url,
            buildings_csv_url: opt(BUILDINGS_CSV_URL),
            listings_csv_url: opt(LISTINGS_CSV_URL),
            intel_csv_url: opt(INTEL_CSV_URL),
            pluto_url: opt(PLUTO_URL),
            dob_permits_url: opt(DOB_PERMITS_URL),
            socrata_app_token: opt(SOCRATA_APP_TOKEN),
            trigger_secret: opt(INGEST_TRIGGER_SECRET),
            pluto_where: opt(PLUTO_WHERE),
            dob_where: opt(DOB_WHERE),
            paging: PagingConfig::new()
                .with_page_size(page_size)
                .with_max_pages(max_pages),
            http_timeout: Duration::from_secs(timeout_secs),
            http_max_retries: parse_or(opt(INGEST_HTTP_MAX_RETRIES), INGEST_HTTP_MAX_RETRIES, 0)?,
            http_backoff: parse_or(opt(INGEST_HTTP_BACKOFF), INGEST_HTTP_BACKOFF, BackoffType::default())?,
            http_backoff_initial: Duration::from_millis(parse_or(
                opt(INGEST_HTTP_BACKOFF_MS),
                INGEST_HTTP_BACKOFF_MS,
                DEFAULT_HTTP_BACKOFF_MS,
            )?),
            rate_limit_rps,
        })
    }

    /// The source URLs `job` reads from, failing on the first one unset
    pub fn sources_for(&self, job: Job) -> Result<JobSources<'_>> {
        let mut sources = JobSources::default();

        if job.includes(Job::Csv) {
            sources.csv = Some(CsvUrls {
                buildings: required(&self.buildings_csv_url, BUILDINGS_CSV_URL)?,
                listings: required(&self.listings_csv_url, LISTINGS_CSV_URL)?,
                intel: required(&self.intel_csv_url, INTEL_CSV_URL)?,
            });
        }
        if job.includes(Job::Pluto) {
            sources.pluto = Some(required(&self.pluto_url, PLUTO_URL)?);
        }
        if job.includes(Job::Dob) {
            sources.dob = Some(required(&self.dob_permits_url, DOB_PERMITS_URL)?);
        }
        Ok(sources)
    }

    /// The trigger secret, required to serve
    pub fn require_trigger_secret(&self) -> Result<&str> {
        self.trigger_secret
            .as_deref()
            .ok_or_else(|| Error::missing_field(INGEST_TRIGGER_SECRET))
    }

    /// HTTP client settings derived from this config
    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig::builder()
            .timeout(self.http_timeout)
            .max_retries(self.http_max_retries)
            .backoff(
                self.http_backoff,
                self.http_backoff_initial,
                MAX_HTTP_BACKOFF.max(self.http_backoff_initial),
            )
            .rate_limit(self.rate_limit_rps.map(RateLimiterConfig::per_second))
            .build()
    }
}

/// Validated source URLs for one job; a field is set iff the job reads it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobSources<'a> {
    pub csv: Option<CsvUrls<'a>>,
    pub pluto: Option<&'a str>,
    pub dob: Option<&'a str>,
}

/// The three CSV feeds, always loaded together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvUrls<'a> {
    pub buildings: &'a str,
    pub listings: &'a str,
    pub intel: &'a str,
}

impl std::fmt::Debug for IngestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestConfig")
            .field("store_url", &self.store_url)
            .field("store_key", &"<redacted>")
            .field("pluto_url", &self.pluto_url)
            .field("dob_permits_url", &self.dob_permits_url)
            .field("paging", &self.paging)
            .field("http_timeout", &self.http_timeout)
            .field("http_max_retries", &self.http_max_retries)
            .finish_non_exhaustive()
    }
}

fn required<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str> {
    value.as_deref().ok_or_else(|| Error::missing_field(key))
}

fn parse_value<T: FromStr>(raw: &str, key: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| Error::invalid_value(key, format!("'{raw}': {e}")))
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.map_or(Ok(default), |raw| parse_value(&raw, key))
}
