//! Engine types
//!
//! Paging configuration and the progress reports tasks hand back to the
//! orchestrator.

use crate::types::TaskCounts;
use serde::Serialize;
use serde_json::Value;

/// Default rows requested per page
pub const DEFAULT_PAGE_SIZE: u64 = 5000;

/// Default page budget per source per run
pub const DEFAULT_MAX_PAGES_PER_RUN: u32 = 5;

/// Configuration for the paginated loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingConfig {
    /// Rows requested per page; also the cursor step
    pub page_size: u64,
    /// Maximum non-empty pages fetched in one run
    pub max_pages_per_run: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages_per_run: DEFAULT_MAX_PAGES_PER_RUN,
        }
    }
}

impl PagingConfig {
    /// Create a new paging config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the page budget
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages_per_run = max_pages;
        self
    }
}

/// Progress of one paginated source over one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageProgress {
    /// Cursor name
    pub source: String,
    /// Offset the run started from
    pub start_offset: u64,
    /// Offset reached when the run stopped
    pub offset: u64,
    /// Non-empty pages processed
    pub pages: u32,
    /// Rows received from upstream
    pub fetched: usize,
    /// Records written
    pub written: usize,
    /// Rows dropped for a missing conflict key
    pub dropped: usize,
    /// Whether the source was exhausted and its cursor reset
    pub done: bool,
}

impl PageProgress {
    /// Fresh progress for a run starting at `start_offset`
    pub fn new(source: impl Into<String>, start_offset: u64) -> Self {
        Self {
            source: source.into(),
            start_offset,
            offset: start_offset,
            ..Self::default()
        }
    }

    /// Run-log counts for this progress
    pub fn to_counts(&self) -> TaskCounts {
        to_counts(self)
    }
}

/// Outcome of a whole-file CSV load into one table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableProgress {
    /// Destination table
    pub table: String,
    /// Rows parsed from the file
    pub fetched: usize,
    /// Records written
    pub written: usize,
    /// Rows dropped for a missing conflict key
    pub dropped: usize,
}

impl TableProgress {
    /// Run-log counts for this progress
    pub fn to_counts(&self) -> TaskCounts {
        to_counts(self)
    }
}

/// Counts reported by one task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSummary {
    /// Task name, also its run-log source
    pub name: String,
    /// Counts the task returned
    pub counts: TaskCounts,
}

/// Result of one orchestrated run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Job that was run
    pub job: String,
    /// Completed tasks in order
    pub tasks: Vec<TaskSummary>,
}

impl RunSummary {
    /// Create an empty summary for a job
    pub fn new(job: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            tasks: Vec::new(),
        }
    }
}

fn to_counts<T: Serialize>(value: &T) -> TaskCounts {
    match serde_json::to_value(value) {
        Ok(Value::Object(obj)) => obj,
        _ => TaskCounts::new(),
    }
}
