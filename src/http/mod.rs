//! HTTP client module
//!
//! One reqwest-backed client is shared by the CSV reader, the paged JSON
//! reader and the REST store.
//!
//! # Features
//!
//! - **Status classification**: non-2xx responses become `Error::HttpStatus`,
//!   which callers attribute to a source URL or destination table
//! - **Opt-in retries**: configurable backoff for transport-level hiccups
//! - **Rate limiting**: optional token bucket using governor

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
