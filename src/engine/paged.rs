//! Resumable paginated ingestion

use super::orchestrator::IngestTask;
use super::types::{PageProgress, PagingConfig};
use crate::error::Result;
use crate::records::PagedRecord;
use crate::sink::UpsertSink;
use crate::source::PageSource;
use crate::state::CursorStore;
use crate::types::TaskCounts;
use async_trait::async_trait;
use chrono::Utc;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

/// Bounded fetch loop for one paginated source feeding records of type `R`
///
/// Each run resumes from the persisted cursor, processes at most
/// `max_pages_per_run` pages and saves the cursor after every page. An empty
/// page resets the cursor so the next cycle re-scans from the start.
pub struct PagedIngestion<R> {
    source: Arc<dyn PageSource>,
    cursors: CursorStore,
    sink: UpsertSink,
    config: PagingConfig,
    _record: PhantomData<fn() -> R>,
}

impl<R: PagedRecord> PagedIngestion<R> {
    /// Create a loop over `source`
    pub fn new(
        source: Arc<dyn PageSource>,
        cursors: CursorStore,
        sink: UpsertSink,
        config: PagingConfig,
    ) -> Self {
        Self {
            source,
            cursors,
            sink,
            config,
            _record: PhantomData,
        }
    }

    /// Paging configuration in use
    pub fn config(&self) -> PagingConfig {
        self.config
    }

    /// Run one bounded pass
    pub async fn ingest(&self) -> Result<PageProgress> {
        let page_size = self.config.page_size;
        let mut cursor = self.cursors.load(R::SOURCE).await?;
        let mut progress = PageProgress::new(R::SOURCE, cursor.offset);

        info!(
            source = R::SOURCE,
            offset = cursor.offset,
            page_size,
            max_pages = self.config.max_pages_per_run,
            "starting paginated ingestion"
        );

        for _ in 0..self.config.max_pages_per_run {
            let rows = self.source.read_page(cursor.offset, page_size).await?;

            if rows.is_empty() {
                self.cursors.save(R::SOURCE, &cursor, true).await?;
                progress.done = true;
                break;
            }

            let now = Utc::now();
            let records: Vec<R> = rows.iter().filter_map(|row| R::from_json(row, now)).collect();
            let rejected = rows.len() - records.len();
            let outcome = self.sink.upsert_records(&records).await?;

            cursor = cursor.advance(page_size);
            self.cursors.save(R::SOURCE, &cursor, false).await?;

            progress.offset = cursor.offset;
            progress.pages += 1;
            progress.fetched += rows.len();
            progress.written += outcome.written;
            progress.dropped += rejected + outcome.dropped;

            debug!(
                source = R::SOURCE,
                offset = cursor.offset,
                rows = rows.len(),
                written = outcome.written,
                "page done"
            );
        }

        info!(
            source = R::SOURCE,
            pages = progress.pages,
            written = progress.written,
            dropped = progress.dropped,
            done = progress.done,
            "paginated ingestion finished"
        );
        Ok(progress)
    }
}

#[async_trait]
impl<R: PagedRecord + 'static> IngestTask for PagedIngestion<R> {
    fn name(&self) -> &str {
        R::SOURCE
    }

    async fn run(&self) -> Result<TaskCounts> {
        Ok(self.ingest().await?.to_counts())
    }
}

impl<R> std::fmt::Debug for PagedIngestion<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedIngestion")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
