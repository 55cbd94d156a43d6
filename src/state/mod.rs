//! Cursor state module
//!
//! Tracks how far each paginated source has been read so an interrupted or
//! budget-limited run picks up where the last one stopped.
//!
//! # Overview
//!
//! - [`Cursor`] - offset into one source, persisted as JSON
//! - [`CursorStore`] - one row per source in `ingest_state`

mod store;
mod types;

pub use store::{CursorStore, STATE_TABLE};
pub use types::Cursor;
