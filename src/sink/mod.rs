//! Destination writes
//!
//! # Overview
//!
//! - `UpsertStore` - backend seam with merge-on-conflict and insert
//! - `RestStore` - PostgREST-style HTTP backend
//! - `MemoryStore` - in-process backend for dry runs and tests
//! - `UpsertSink` - drops keyless rows, skips empty batches, then upserts
//! - `RunLog` - append-only `ingest_runs` writer

mod memory;
mod rest;
mod run_log;
mod types;
mod upsert;

pub use memory::MemoryStore;
pub use rest::RestStore;
pub use run_log::{RunLog, RunLogEntry, HEARTBEAT_SOURCE, RUNS_TABLE};
pub use types::UpsertStore;
pub use upsert::{collapse_duplicate_keys, has_conflict_key, UpsertSink, WriteOutcome};
