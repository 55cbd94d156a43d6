//! Ingestion jobs
//!
//! A job names a fixed list of tasks. `csv` loads the three CSV files,
//! `pluto` and `dob` each advance one paginated source, and `all` runs
//! everything in that order.

use crate::config::IngestConfig;
use crate::engine::{CsvIngestion, IngestTask, Orchestrator, PagedIngestion, RunSummary};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::records::{Building, DobPermit, IntelScore, Listing, PagedRecord, PlutoParcel};
use crate::sink::{RunLog, UpsertSink, UpsertStore};
use crate::source::{CsvSource, PagedJsonSource, PagedJsonSourceConfig};
use crate::state::CursorStore;
use std::str::FromStr;
use std::sync::Arc;

/// Which tasks an invocation runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Job {
    /// Buildings, listings and intel CSV files
    Csv,
    /// PLUTO parcels
    Pluto,
    /// DOB permits
    Dob,
    /// Everything
    #[default]
    All,
}

impl Job {
    /// Name used in the heartbeat and on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Pluto => "pluto",
            Self::Dob => "dob",
            Self::All => "all",
        }
    }

    /// Whether running `self` covers the tasks of `other`
    pub fn includes(self, other: Job) -> bool {
        self == other || self == Self::All
    }
}

impl FromStr for Job {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "pluto" => Ok(Self::Pluto),
            "dob" => Ok(Self::Dob),
            "" | "all" => Ok(Self::All),
            other => Err(Error::invalid_value("job", format!("unknown job '{other}'"))),
        }
    }
}

impl std::fmt::Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the tasks for `job`, failing before any I/O if a source is unset
pub fn build_tasks(
    config: &IngestConfig,
    job: Job,
    client: &HttpClient,
    store: Arc<dyn UpsertStore>,
) -> Result<Vec<Box<dyn IngestTask>>> {
    let sources = config.sources_for(job)?;

    let sink = UpsertSink::new(store.clone());
    let cursors = CursorStore::new(store);
    let mut tasks: Vec<Box<dyn IngestTask>> = Vec::new();

    if let Some(urls) = sources.csv {
        let reader = CsvSource::new(client.clone());
        tasks.push(Box::new(CsvIngestion::<Building>::new(
            "buildings_csv",
            urls.buildings,
            reader.clone(),
            sink.clone(),
        )));
        tasks.push(Box::new(CsvIngestion::<Listing>::new(
            "listings_csv",
            urls.listings,
            reader.clone(),
            sink.clone(),
        )));
        tasks.push(Box::new(CsvIngestion::<IntelScore>::new(
            "intel_csv",
            urls.intel,
            reader,
            sink.clone(),
        )));
    }

    if let Some(endpoint) = sources.pluto {
        tasks.push(paged_task::<PlutoParcel>(
            config,
            client,
            endpoint,
            config.pluto_where.clone(),
            &cursors,
            &sink,
        ));
    }

    if let Some(endpoint) = sources.dob {
        tasks.push(paged_task::<DobPermit>(
            config,
            client,
            endpoint,
            config.dob_where.clone(),
            &cursors,
            &sink,
        ));
    }

    Ok(tasks)
}

/// Build and run `job` against `store`
pub async fn run_job(
    config: &IngestConfig,
    job: Job,
    client: &HttpClient,
    store: Arc<dyn UpsertStore>,
) -> Result<RunSummary> {
    let tasks = build_tasks(config, job, client, store.clone())?;
    Orchestrator::new(RunLog::new(store))
        .run(job.as_str(), &tasks)
        .await
}

fn paged_task<R: PagedRecord + 'static>(
    config: &IngestConfig,
    client: &HttpClient,
    endpoint: &str,
    filter: Option<String>,
    cursors: &CursorStore,
    sink: &UpsertSink,
) -> Box<dyn IngestTask> {
    let source = PagedJsonSource::new(
        client.clone(),
        PagedJsonSourceConfig::new(endpoint)
            .with_select(R::SELECT)
            .with_filter(filter)
            .with_app_token(config.socrata_app_token.clone()),
    );
    Box::new(PagedIngestion::<R>::new(
        Arc::new(source),
        cursors.clone(),
        sink.clone(),
        config.paging,
    ))
}
