// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # parcel-ingest
//!
//! A scheduled ingestion job for NYC parcel data. Each invocation pulls CSV
//! files and paged Socrata datasets, coerces their fields, and upserts the
//! results into a PostgREST-style store.
//!
//! ## Features
//!
//! - **Resumable paging**: a persisted cursor per source, saved after every page
//! - **Bounded effort**: at most `max_pages_per_run` pages per source per run
//! - **Idempotent writes**: merge-on-conflict upserts, keyless rows dropped
//! - **Run log**: one heartbeat plus one row per task attempt
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use parcel_ingest::{config::IngestConfig, http::HttpClient, jobs::{run_job, Job}};
//! use parcel_ingest::sink::RestStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> parcel_ingest::Result<()> {
//!     let config = IngestConfig::from_env()?;
//!     let client = HttpClient::with_config(config.http_config())?;
//!     let store = RestStore::new(client.clone(), &config.store_url, config.store_key.clone())?;
//!
//!     let summary = run_job(&config, Job::Pluto, &client, Arc::new(store)).await?;
//!     println!("{}", serde_json::to_string_pretty(&summary)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │          Orchestrator (heartbeat, run log, short-circuit)   │
//! └─────────────────────────────────────────────────────────────┘
//!                │                             │
//!       ┌────────┴────────┐          ┌─────────┴─────────┐
//!       │  CsvIngestion   │          │  PagedIngestion   │
//!       └────────┬────────┘          └─────────┬─────────┘
//! ┌──────────┬───┴──────┬──────────┬───────────┴───┬─────────────┐
//! │  Source  │  Coerce  │ Records  │  CursorStore  │ UpsertSink  │
//! ├──────────┼──────────┼──────────┼───────────────┼─────────────┤
//! │ CSV      │ number   │ BBL keys │ ingest_state  │ RestStore   │
//! │ Paged    │ date     │ per table│ {offset}      │ MemoryStore │
//! └──────────┴──────────┴──────────┴───────────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Field value coercion
pub mod coerce;

/// HTTP client with retry and rate limiting
pub mod http;

/// CSV and paged JSON readers
pub mod source;

/// Destination record types
pub mod records;

/// Upsert store, sink and run log
pub mod sink;

/// Cursor persistence
pub mod state;

/// Paginated loop and orchestration
pub mod engine;

/// Job definitions
pub mod jobs;

/// Environment configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
