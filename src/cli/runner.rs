//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, CursorCommand};
use crate::config::IngestConfig;
use crate::engine::RunSummary;
use crate::error::{Result, ResultExt};
use crate::http::HttpClient;
use crate::jobs::{run_job, Job};
use crate::sink::{MemoryStore, RestStore, UpsertStore};
use crate::state::CursorStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command with configuration from the environment
    pub async fn run(&self) -> Result<()> {
        let config = IngestConfig::from_env()?;
        let output = self.execute(&config).await?;
        if let Some(output) = output {
            let rendered = serde_json::to_string_pretty(&output).context("Failed to render output")?;
            println!("{rendered}");
        }
        Ok(())
    }

    /// Run the CLI command, returning what should be printed
    pub async fn execute(&self, config: &IngestConfig) -> Result<Option<Value>> {
        match &self.cli.command {
            Commands::Run { job, dry_run } => {
                let summary = self.run_once(config, *job, *dry_run).await?;
                Ok(Some(serde_json::to_value(summary)?))
            }
            Commands::Serve { port } => {
                super::serve(config.clone(), *port).await?;
                Ok(None)
            }
            Commands::Cursor { action } => self.cursor(config, action).await.map(Some),
        }
    }

    async fn run_once(&self, config: &IngestConfig, job: Job, dry_run: bool) -> Result<RunSummary> {
        let client = HttpClient::with_config(config.http_config())?;
        let store: Arc<dyn UpsertStore> = if dry_run {
            info!(%job, "dry run, writing to memory");
            Arc::new(MemoryStore::new())
        } else {
            Arc::new(rest_store(config, &client)?)
        };
        run_job(config, job, &client, store).await
    }

    async fn cursor(&self, config: &IngestConfig, action: &CursorCommand) -> Result<Value> {
        let client = HttpClient::with_config(config.http_config())?;
        let cursors = CursorStore::new(Arc::new(rest_store(config, &client)?));

        match action {
            CursorCommand::Show { source } => {
                let cursor = cursors.load(source).await?;
                Ok(json!({ "source": source, "cursor": cursor.to_json() }))
            }
            CursorCommand::Reset { source } => {
                cursors.reset(source).await?;
                info!(source = %source, "cursor reset");
                Ok(json!({ "source": source, "cursor": {} }))
            }
        }
    }
}

fn rest_store(config: &IngestConfig, client: &HttpClient) -> Result<RestStore> {
    RestStore::new(client.clone(), &config.store_url, config.store_key.clone())
}
