//! CLI commands and argument parsing

use crate::jobs::Job;
use clap::{Parser, Subcommand};

/// Parcel data ingestion job
#[derive(Parser, Debug)]
#[command(name = "parcel-ingest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one ingestion pass and print the summary
    Run {
        /// Tasks to run
        #[arg(long, value_enum, default_value_t = Job::All)]
        job: Job,

        /// Write to an in-memory store instead of the configured one
        #[arg(long)]
        dry_run: bool,
    },

    /// Start the HTTP trigger server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Inspect or reset a paginated source's cursor
    Cursor {
        #[command(subcommand)]
        action: CursorCommand,
    },
}

/// Cursor subcommands
#[derive(Subcommand, Debug)]
pub enum CursorCommand {
    /// Print the persisted cursor
    Show {
        /// Source name (`pluto` or `dob_permits`)
        #[arg(long)]
        source: String,
    },

    /// Restart a source from the beginning on its next run
    Reset {
        /// Source name (`pluto` or `dob_permits`)
        #[arg(long)]
        source: String,
    },
}
