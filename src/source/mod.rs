//! Upstream source readers
//!
//! Supports: CSV over HTTP, Socrata-style paged JSON
//!
//! # Overview
//!
//! - `CsvSource` fetches a whole CSV document and parses it into rows
//! - `PagedJsonSource` fetches exactly one page per call; an empty page
//!   means the source is exhausted
//! - `PageSource` is the seam the ingestion loop reads through

mod csv;
mod paged;

pub use csv::{parse_csv, parse_csv_line, CsvSource};
pub use paged::{PageSource, PagedJsonSource, PagedJsonSourceConfig, DEFAULT_ORDER};
