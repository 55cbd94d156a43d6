//! Tests for engine module

use super::*;
use crate::error::{Error, Result};
use crate::records::{Building, PlutoParcel};
use crate::sink::{MemoryStore, RunLog, UpsertSink, UpsertStore, HEARTBEAT_SOURCE, RUNS_TABLE};
use crate::source::{CsvSource, PageSource};
use crate::state::{Cursor, CursorStore, STATE_TABLE};
use crate::types::{JsonObject, TaskCounts};
use crate::http::HttpClient;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Fakes
// ============================================================================

/// Serves slices of a fixed dataset and records every request
struct FakePages {
    rows: Vec<JsonObject>,
    calls: Mutex<Vec<(u64, u64)>>,
}

impl FakePages {
    fn new(rows: Vec<JsonObject>) -> Arc<Self> {
        Arc::new(Self {
            rows,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(u64, u64)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for FakePages {
    async fn read_page(&self, offset: u64, limit: u64) -> Result<Vec<JsonObject>> {
        self.calls.lock().unwrap().push((offset, limit));
        let start = (offset as usize).min(self.rows.len());
        let end = (start + limit as usize).min(self.rows.len());
        Ok(self.rows[start..end].to_vec())
    }
}

struct FailingPages;

#[async_trait]
impl PageSource for FailingPages {
    async fn read_page(&self, _offset: u64, _limit: u64) -> Result<Vec<JsonObject>> {
        Err(Error::Fetch {
            url: "https://data.example/pluto.json".into(),
            status: 503,
            body: "unavailable".into(),
        })
    }
}

fn parcel_rows(count: usize) -> Vec<JsonObject> {
    (0..count)
        .map(|i| {
            let row = json!({"bbl": format!("{}", 1_000_000_001u64 + i as u64), "borough": "MN"});
            match row {
                serde_json::Value::Object(obj) => obj,
                _ => unreachable!(),
            }
        })
        .collect()
}

fn harness(
    source: Arc<dyn PageSource>,
    config: PagingConfig,
) -> (MemoryStore, PagedIngestion<PlutoParcel>) {
    let store = MemoryStore::new();
    let shared: Arc<dyn UpsertStore> = Arc::new(store.clone());
    let ingestion = PagedIngestion::new(
        source,
        CursorStore::new(shared.clone()),
        UpsertSink::new(shared),
        config,
    );
    (store, ingestion)
}

fn persisted_cursor(store: &MemoryStore, source: &str) -> serde_json::Value {
    store
        .rows(STATE_TABLE)
        .into_iter()
        .find(|row| row["source"] == source)
        .map(|row| row["cursor"].clone())
        .unwrap()
}

// ============================================================================
// PagingConfig Tests
// ============================================================================

#[test]
fn test_paging_config_default() {
    let config = PagingConfig::default();
    assert_eq!(config.page_size, 5000);
    assert_eq!(config.max_pages_per_run, 5);

    let config = PagingConfig::new().with_page_size(100).with_max_pages(2);
    assert_eq!(config.page_size, 100);
    assert_eq!(config.max_pages_per_run, 2);
}

#[test]
fn test_page_progress_counts() {
    let mut progress = PageProgress::new("pluto", 10);
    progress.written = 3;
    let counts = progress.to_counts();
    assert_eq!(counts["source"], "pluto");
    assert_eq!(counts["start_offset"], 10);
    assert_eq!(counts["offset"], 10);
    assert_eq!(counts["written"], 3);
    assert_eq!(counts["done"], false);
}

// ============================================================================
// PagedIngestion Tests
// ============================================================================

#[tokio::test]
async fn test_single_page_then_exhausted() {
    let pages = FakePages::new(parcel_rows(5000));
    let (store, ingestion) = harness(pages.clone(), PagingConfig::default());

    let progress = ingestion.ingest().await.unwrap();

    assert_eq!(pages.calls(), vec![(0, 5000), (5000, 5000)]);
    assert_eq!(progress.written, 5000);
    assert_eq!(progress.fetched, 5000);
    assert_eq!(progress.pages, 1);
    assert!(progress.done);
    assert_eq!(store.row_count("pluto_raw"), 5000);
    assert_eq!(persisted_cursor(&store, "pluto"), json!({}));
}

#[tokio::test]
async fn test_budget_bounds_fetches_and_persists_offset() {
    let pages = FakePages::new(parcel_rows(35));
    let config = PagingConfig::new().with_page_size(10).with_max_pages(2);
    let (store, ingestion) = harness(pages.clone(), config);

    let progress = ingestion.ingest().await.unwrap();

    assert_eq!(pages.calls().len(), 2);
    assert!(!progress.done);
    assert_eq!(progress.start_offset, 0);
    assert_eq!(progress.offset, 20);
    assert_eq!(persisted_cursor(&store, "pluto"), json!({"offset": 20}));
}

#[tokio::test]
async fn test_resumes_across_runs_until_exhausted() {
    let pages = FakePages::new(parcel_rows(35));
    let config = PagingConfig::new().with_page_size(10).with_max_pages(2);
    let (store, ingestion) = harness(pages.clone(), config);

    let first = ingestion.ingest().await.unwrap();
    let second = ingestion.ingest().await.unwrap();
    let third = ingestion.ingest().await.unwrap();

    assert_eq!(second.start_offset, first.offset);
    assert_eq!(second.offset, 40);
    // The page at 30 held 5 rows; the page at 40 is empty
    assert!(!second.done);
    assert!(third.done);
    assert_eq!(third.pages, 0);
    assert_eq!(
        pages.calls(),
        vec![(0, 10), (10, 10), (20, 10), (30, 10), (40, 10)]
    );
    assert_eq!(store.row_count("pluto_raw"), 35);
    assert_eq!(persisted_cursor(&store, "pluto"), json!({}));

    // A new cycle starts from the beginning
    let fourth = ingestion.ingest().await.unwrap();
    assert_eq!(fourth.start_offset, 0);
}

#[tokio::test]
async fn test_cursor_grows_by_page_size_each_page() {
    let pages = FakePages::new(parcel_rows(30));
    let config = PagingConfig::new().with_page_size(10).with_max_pages(3);
    let store = MemoryStore::new();
    let shared: Arc<dyn UpsertStore> = Arc::new(store.clone());
    let cursors = CursorStore::new(shared.clone());
    cursors.save("pluto", &Cursor::at(10), false).await.unwrap();

    let ingestion: PagedIngestion<PlutoParcel> =
        PagedIngestion::new(pages.clone(), cursors, UpsertSink::new(shared), config);
    let progress = ingestion.ingest().await.unwrap();

    assert_eq!(pages.calls(), vec![(10, 10), (20, 10), (30, 10)]);
    assert_eq!(progress.start_offset, 10);
    assert_eq!(progress.pages, 2);
    assert!(progress.done);
}

#[tokio::test]
async fn test_keyless_rows_are_dropped_not_fatal() {
    let mut rows = parcel_rows(8);
    let bad = json!({"bbl": "not-a-bbl", "block": "x"});
    let serde_json::Value::Object(bad) = bad else {
        unreachable!()
    };
    rows.push(bad.clone());
    rows.push(bad);

    let pages = FakePages::new(rows);
    let config = PagingConfig::new().with_page_size(10).with_max_pages(5);
    let (store, ingestion) = harness(pages, config);

    let progress = ingestion.ingest().await.unwrap();

    assert_eq!(progress.fetched, 10);
    assert_eq!(progress.written, 8);
    assert_eq!(progress.dropped, 2);
    assert!(progress.done);
    assert_eq!(store.row_count("pluto_raw"), 8);
}

#[tokio::test]
async fn test_fetch_failure_keeps_cursor() {
    let (store, ingestion) = harness(Arc::new(FailingPages), PagingConfig::default());

    let err = ingestion.ingest().await.unwrap_err();

    assert!(matches!(err, Error::Fetch { status: 503, .. }));
    assert_eq!(store.row_count(STATE_TABLE), 0);
}

#[tokio::test]
async fn test_paged_task_name_and_counts() {
    let pages = FakePages::new(parcel_rows(3));
    let (_, ingestion) = harness(pages, PagingConfig::default());
    let task: &dyn IngestTask = &ingestion;

    assert_eq!(task.name(), "pluto");
    let counts = task.run().await.unwrap();
    assert_eq!(counts["written"], 3);
    assert_eq!(counts["done"], true);
}

// ============================================================================
// CsvIngestion Tests
// ============================================================================

#[tokio::test]
async fn test_csv_ingestion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/buildings.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "bbl,address,lat,lng\n1000010010,1 Main St,40.7,-74.0\n,no key,1,2\n1000010020,2 Main St,,\n",
        ))
        .mount(&server)
        .await;

    let store = MemoryStore::new();
    let ingestion: CsvIngestion<Building> = CsvIngestion::new(
        "buildings_csv",
        format!("{}/buildings.csv", server.uri()),
        CsvSource::new(HttpClient::new().unwrap()),
        UpsertSink::new(Arc::new(store.clone())),
    );

    let progress = ingestion.ingest().await.unwrap();

    assert_eq!(
        progress,
        TableProgress {
            table: "buildings".into(),
            fetched: 3,
            written: 2,
            dropped: 1,
        }
    );
    assert_eq!(store.row_count("buildings"), 2);
    assert_eq!(IngestTask::name(&ingestion), "buildings_csv");
}

// ============================================================================
// Orchestrator Tests
// ============================================================================

struct ScriptedTask {
    name: &'static str,
    fail: bool,
    runs: Arc<AtomicUsize>,
}

impl ScriptedTask {
    fn boxed(name: &'static str, fail: bool, runs: &Arc<AtomicUsize>) -> Box<dyn IngestTask> {
        Box::new(Self {
            name,
            fail,
            runs: runs.clone(),
        })
    }
}

#[async_trait]
impl IngestTask for ScriptedTask {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self) -> Result<TaskCounts> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Other("x".repeat(3000)));
        }
        let mut counts = TaskCounts::new();
        counts.insert("written".into(), json!(7));
        Ok(counts)
    }
}

/// Store whose inserts into the run log fail after the first one
struct FlakyLog {
    inner: MemoryStore,
    inserts: AtomicUsize,
}

#[async_trait]
impl UpsertStore for FlakyLog {
    async fn upsert(&self, table: &str, rows: &[JsonObject], key: &[&str]) -> Result<()> {
        self.inner.upsert(table, rows, key).await
    }

    async fn insert(&self, table: &str, rows: &[JsonObject]) -> Result<()> {
        if self.inserts.fetch_add(1, Ordering::SeqCst) > 0 {
            return Err(Error::sink(table, 503, "down"));
        }
        self.inner.insert(table, rows).await
    }

    async fn fetch_one(&self, table: &str, column: &str, value: &str) -> Result<Option<JsonObject>> {
        self.inner.fetch_one(table, column, value).await
    }
}

#[tokio::test]
async fn test_orchestrator_logs_each_task() {
    let store = MemoryStore::new();
    let orchestrator = Orchestrator::new(RunLog::new(Arc::new(store.clone())));
    let runs = Arc::new(AtomicUsize::new(0));
    let tasks = vec![
        ScriptedTask::boxed("buildings_csv", false, &runs),
        ScriptedTask::boxed("pluto", false, &runs),
    ];

    let summary = orchestrator.run("all", &tasks).await.unwrap();

    assert_eq!(summary.job, "all");
    assert_eq!(summary.tasks.len(), 2);
    assert_eq!(summary.tasks[1].name, "pluto");
    assert_eq!(summary.tasks[1].counts["written"], 7);
    assert!(summary.tasks[1].counts.contains_key("duration_ms"));

    let rows = store.rows(RUNS_TABLE);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["source"], HEARTBEAT_SOURCE);
    assert_eq!(rows[0]["counts"], json!({"job": "all", "tasks": ["buildings_csv", "pluto"]}));
    assert_eq!(rows[1]["source"], "buildings_csv");
    assert_eq!(rows[1]["status"], "ok");
    assert!(rows[1]["counts"]["started_at"].is_string());
}

#[tokio::test]
async fn test_orchestrator_short_circuits_after_logging() {
    let store = MemoryStore::new();
    let orchestrator = Orchestrator::new(RunLog::new(Arc::new(store.clone())));
    let runs = Arc::new(AtomicUsize::new(0));
    let tasks = vec![
        ScriptedTask::boxed("buildings_csv", true, &runs),
        ScriptedTask::boxed("pluto", false, &runs),
    ];

    let err = orchestrator.run("all", &tasks).await.unwrap_err();

    assert!(matches!(err, Error::Other(_)));
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    let rows = store.rows(RUNS_TABLE);
    assert_eq!(rows.len(), 2);
    let heartbeats = rows.iter().filter(|r| r["source"] == HEARTBEAT_SOURCE).count();
    assert_eq!(heartbeats, 1);
    assert_eq!(rows[1]["status"], "error");
    assert_eq!(rows[1]["detail"].as_str().unwrap().chars().count(), 2000);
    assert!(rows[1]["counts"]["started_at"].is_string());
    assert!(rows[1]["counts"]["duration_ms"].is_u64());
}

#[tokio::test]
async fn test_orchestrator_returns_task_error_when_log_write_fails() {
    let store = FlakyLog {
        inner: MemoryStore::new(),
        inserts: AtomicUsize::new(0),
    };
    let inner = store.inner.clone();
    let orchestrator = Orchestrator::new(RunLog::new(Arc::new(store)));
    let runs = Arc::new(AtomicUsize::new(0));
    let tasks = vec![ScriptedTask::boxed("pluto", true, &runs)];

    let err = orchestrator.run("pluto", &tasks).await.unwrap_err();

    assert!(matches!(err, Error::Other(_)));
    assert_eq!(inner.row_count(RUNS_TABLE), 1);
}

#[tokio::test]
async fn test_orchestrator_heartbeat_failure_runs_nothing() {
    let store = FlakyLog {
        inner: MemoryStore::new(),
        inserts: AtomicUsize::new(1),
    };
    let orchestrator = Orchestrator::new(RunLog::new(Arc::new(store)));
    let runs = Arc::new(AtomicUsize::new(0));
    let tasks = vec![ScriptedTask::boxed("pluto", false, &runs)];

    let err = orchestrator.run("pluto", &tasks).await.unwrap_err();

    assert!(matches!(err, Error::Sink { .. }));
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_orchestrator_empty_task_list_still_beats() {
    let store = MemoryStore::new();
    let orchestrator = Orchestrator::new(RunLog::new(Arc::new(store.clone())));

    let summary = orchestrator.run("csv", &[]).await.unwrap();

    assert!(summary.tasks.is_empty());
    assert_eq!(store.row_count(RUNS_TABLE), 1);
}
