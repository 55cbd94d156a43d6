//! Execution engine module
//!
//! The paginated read loop, whole-file CSV loads, and the orchestrator that
//! sequences them.
//!
//! # Overview
//!
//! The engine module provides:
//! - [`PagedIngestion`] - bounded, resumable fetch loop over a [`PageSource`](crate::source::PageSource)
//! - [`CsvIngestion`] - one CSV file into one table
//! - [`Orchestrator`] - heartbeat, per-task run-log rows, short-circuit on failure

mod csv;
mod orchestrator;
mod paged;
mod types;

pub use csv::CsvIngestion;
pub use orchestrator::{IngestTask, Orchestrator};
pub use paged::PagedIngestion;
pub use types::{
    PageProgress, PagingConfig, RunSummary, TableProgress, TaskSummary, DEFAULT_MAX_PAGES_PER_RUN,
    DEFAULT_PAGE_SIZE,
};

#[cfg(test)]
mod tests;
