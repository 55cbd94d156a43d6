//! Run orchestration
//!
//! Writes the heartbeat, then runs each task in order with one run-log row
//! per attempt. The first failure is logged and returned; later tasks do not
//! run.

use super::types::{RunSummary, TaskSummary};
use crate::error::Result;
use crate::sink::{RunLog, HEARTBEAT_SOURCE};
use crate::types::{RunStatus, TaskCounts};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::time::Instant;
use tracing::{error, info};

/// One named unit of ingestion work
#[async_trait]
pub trait IngestTask: Send + Sync {
    /// Name used as the run-log source
    fn name(&self) -> &str;

    /// Do the work and report counts
    async fn run(&self) -> Result<TaskCounts>;
}

/// Sequential task runner with run-log bookkeeping
#[derive(Debug, Clone)]
pub struct Orchestrator {
    log: RunLog,
}

impl Orchestrator {
    /// Create an orchestrator logging to `log`
    pub fn new(log: RunLog) -> Self {
        Self { log }
    }

    /// Run `tasks` for `job`
    ///
    /// A failed heartbeat write aborts before any task runs.
    pub async fn run(&self, job: &str, tasks: &[Box<dyn IngestTask>]) -> Result<RunSummary> {
        let mut heartbeat = TaskCounts::new();
        heartbeat.insert("job".to_string(), Value::from(job));
        heartbeat.insert(
            "tasks".to_string(),
            Value::from(tasks.iter().map(|t| t.name().to_string()).collect::<Vec<_>>()),
        );
        self.log
            .append(HEARTBEAT_SOURCE, RunStatus::Ok, None, heartbeat)
            .await?;

        info!(job, tasks = tasks.len(), "run started");
        let mut summary = RunSummary::new(job);

        for task in tasks {
            let name = task.name();
            let started_at = Utc::now();
            let clock = Instant::now();
            let result = task.run().await;
            let duration_ms = clock.elapsed().as_millis() as u64;

            let mut timing = TaskCounts::new();
            timing.insert("started_at".to_string(), Value::from(started_at.to_rfc3339()));
            timing.insert("duration_ms".to_string(), Value::from(duration_ms));

            match result {
                Ok(mut counts) => {
                    counts.extend(timing);
                    self.log
                        .append(name, RunStatus::Ok, None, counts.clone())
                        .await?;
                    info!(task = name, duration_ms, "task succeeded");
                    summary.tasks.push(TaskSummary {
                        name: name.to_string(),
                        counts,
                    });
                }
                Err(err) => {
                    error!(task = name, error = %err, retryable = err.is_retryable(), "task failed");
                    if let Err(log_err) = self
                        .log
                        .append(name, RunStatus::Error, Some(err.detail()), timing)
                        .await
                    {
                        error!(task = name, error = %log_err, "failed to record task failure");
                    }
                    return Err(err);
                }
            }
        }

        info!(job, "run finished");
        Ok(summary)
    }
}
