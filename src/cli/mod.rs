//! CLI module
//!
//! Command-line interface for the ingestion job.
//!
//! # Commands
//!
//! - `run` - Run one ingestion pass
//! - `serve` - Start the HTTP trigger server
//! - `cursor show` / `cursor reset` - Inspect or restart a paginated source

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands, CursorCommand};
pub use runner::Runner;
pub use server::{router, serve, TriggerState};
