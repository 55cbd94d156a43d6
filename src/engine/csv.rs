//! Whole-file CSV ingestion

use super::orchestrator::IngestTask;
use super::types::TableProgress;
use crate::error::Result;
use crate::records::CsvRecord;
use crate::sink::UpsertSink;
use crate::source::CsvSource;
use crate::types::TaskCounts;
use async_trait::async_trait;
use chrono::Utc;
use std::marker::PhantomData;
use tracing::info;

/// Reads one CSV file and upserts it as records of type `R`
pub struct CsvIngestion<R> {
    name: String,
    url: String,
    reader: CsvSource,
    sink: UpsertSink,
    _record: PhantomData<fn() -> R>,
}

impl<R: CsvRecord> CsvIngestion<R> {
    /// Create a task named `name` reading `url`
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        reader: CsvSource,
        sink: UpsertSink,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            reader,
            sink,
            _record: PhantomData,
        }
    }

    /// Fetch, transform and write the file
    pub async fn ingest(&self) -> Result<TableProgress> {
        let rows = self.reader.read(&self.url).await?;
        let now = Utc::now();
        let records: Vec<R> = rows.iter().filter_map(|row| R::from_csv(row, now)).collect();
        let rejected = rows.len() - records.len();
        let outcome = self.sink.upsert_records(&records).await?;

        let progress = TableProgress {
            table: R::TABLE.to_string(),
            fetched: rows.len(),
            written: outcome.written,
            dropped: rejected + outcome.dropped,
        };
        info!(
            task = %self.name,
            table = R::TABLE,
            written = progress.written,
            dropped = progress.dropped,
            "csv ingestion finished"
        );
        Ok(progress)
    }
}

#[async_trait]
impl<R: CsvRecord + 'static> IngestTask for CsvIngestion<R> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<TaskCounts> {
        Ok(self.ingest().await?.to_counts())
    }
}

impl<R> std::fmt::Debug for CsvIngestion<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvIngestion")
            .field("name", &self.name)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}
