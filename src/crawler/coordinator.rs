//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator drains the frontier one task at a time. Root pages are
//! parsed for category links, which are queued for product extraction;
//! listing pages yield product records for the buffer and pagination links
//! queued back into product extraction. When the frontier is empty the
//! buffer is flushed one last time.

use crate::buffer::{BatchSink, RecordBuffer};
use crate::config::CrawlerConfig;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::{CrawlTask, Frontier};
use crate::crawler::parser::CatalogParser;
use crate::output::CrawlStats;
use crate::state::CrawlStage;
use crate::ScraperError;
use std::future::Future;
use std::time::{Duration, Instant};
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator<F, S> {
    fetcher: F,
    parser: CatalogParser,
    frontier: Frontier,
    buffer: RecordBuffer<S>,
    max_pages: Option<u32>,
    stage: CrawlStage,
    stats: CrawlStats,
}

impl<F: Fetcher, S: BatchSink> Coordinator<F, S> {
    /// Creates a coordinator from its parts
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Source of page bodies
    /// * `parser` - Catalog markup parser
    /// * `frontier` - Worklist, usually empty
    /// * `buffer` - Buffer receiving extracted records
    pub fn new(
        fetcher: F,
        parser: CatalogParser,
        frontier: Frontier,
        buffer: RecordBuffer<S>,
    ) -> Self {
        Self {
            fetcher,
            parser,
            frontier,
            buffer,
            max_pages: None,
            stage: CrawlStage::Start,
            stats: CrawlStats::default(),
        }
    }

    /// Creates a coordinator writing batches into `sink`, set up from `config`
    pub fn from_config(fetcher: F, sink: S, config: &CrawlerConfig) -> Result<Self, ScraperError> {
        let parser = CatalogParser::new(config.in_stock_label.as_str())?;
        let frontier = Frontier::new(Duration::from_millis(config.request_delay_ms));
        let buffer = RecordBuffer::new(sink, config.batch_size);

        let mut coordinator = Self::new(fetcher, parser, frontier, buffer);
        coordinator.max_pages = config.max_pages;
        Ok(coordinator)
    }

    /// Stops the crawl after `max_pages` fetches
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Queues the catalog root page for category discovery
    pub fn seed_root(&mut self, url: Url) {
        self.frontier
            .push(CrawlTask::new(url, CrawlStage::CategoryDiscovery));
    }

    /// Queues category listing pages directly, skipping discovery
    pub fn seed_categories(&mut self, urls: impl IntoIterator<Item = Url>) {
        for url in urls {
            self.frontier
                .push(CrawlTask::new(url, CrawlStage::ProductExtraction));
        }
    }

    pub fn stage(&self) -> CrawlStage {
        self.stage
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    pub fn buffer(&self) -> &RecordBuffer<S> {
        &self.buffer
    }

    /// Consumes the coordinator and returns the batch sink
    pub fn into_sink(self) -> S {
        self.buffer.into_sink()
    }

    /// Runs the crawl until the frontier is exhausted
    pub async fn run(&mut self) -> Result<CrawlStats, ScraperError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the crawl until the frontier is exhausted or `shutdown` completes
    ///
    /// On shutdown the buffered records are reported and left unwritten, and
    /// [`ScraperError::Aborted`] is returned. A failed write stops the crawl
    /// with the records of that batch still buffered.
    pub async fn run_until<Fut>(&mut self, shutdown: Fut) -> Result<CrawlStats, ScraperError>
    where
        Fut: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        if self.stage.is_terminal() {
            tracing::warn!("Crawl already finished, nothing to run");
            return Ok(self.stats.clone());
        }

        let start_time = Instant::now();
        tracing::info!("Starting crawl with {} queued pages", self.frontier.len());

        while !self.frontier.is_empty() {
            if let Some(max_pages) = self.max_pages {
                if self.stats.pages_visited() >= u64::from(max_pages) {
                    tracing::info!(
                        "Page limit of {} reached, {} pages left unvisited",
                        max_pages,
                        self.frontier.len()
                    );
                    break;
                }
            }

            let Some(task) = self.frontier.next_task() else {
                break;
            };

            let outcome = tokio::select! {
                biased;
                _ = &mut shutdown => None,
                result = self.process_task(task) => Some(result),
            };

            match outcome {
                Some(Ok(())) => {}
                Some(Err(e)) => {
                    tracing::error!(
                        "Crawl halted: {} ({} records still buffered)",
                        e,
                        self.buffer.pending()
                    );
                    return Err(e);
                }
                None => return Err(self.abort()),
            }
        }

        let stats = self.finish()?;
        tracing::info!(
            "Crawl completed: {} pages, {} records written in {:?}",
            stats.pages_visited(),
            stats.records_flushed,
            start_time.elapsed()
        );
        Ok(stats)
    }

    /// Fetches one page and hands it to the handler of its stage
    async fn process_task(&mut self, task: CrawlTask) -> Result<(), ScraperError> {
        if !task.stage.handles_pages() {
            tracing::warn!("Ignoring {} queued for stage {}", task.url, task.stage);
            return Ok(());
        }

        self.enter(task.stage);
        self.frontier.wait_turn().await;

        let html = match self.fetcher.fetch(&task.url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Skipping page: {}", e);
                self.stats.pages_failed += 1;
                return Ok(());
            }
        };

        match task.stage {
            CrawlStage::CategoryDiscovery => self.discover_categories(&html, &task.url),
            CrawlStage::ProductExtraction => self.extract_products(&html, &task.url)?,
            CrawlStage::Start | CrawlStage::Done => {}
        }

        Ok(())
    }

    fn discover_categories(&mut self, html: &str, page_url: &Url) {
        self.stats.pages_parsed += 1;

        for url in self.parser.parse_categories(html, page_url) {
            tracing::info!("Found category: {}", url);
            if self
                .frontier
                .push(CrawlTask::new(url, CrawlStage::ProductExtraction))
            {
                self.stats.categories_discovered += 1;
            }
        }
    }

    fn extract_products(&mut self, html: &str, page_url: &Url) -> Result<(), ScraperError> {
        let page = self.parser.parse_listing(html, page_url);
        self.stats.pages_parsed += 1;
        tracing::info!(
            "Parsed category page {}: {} products, {} pagination links",
            page_url,
            page.products.len(),
            page.next_pages.len()
        );

        for product in page.products {
            match product {
                Ok(record) => {
                    tracing::debug!(
                        "Extracted product {} '{}' at {} {}",
                        record.pid(),
                        record.name(),
                        record.current_price(),
                        record.currency()
                    );
                    self.stats.records_extracted += 1;
                    self.buffer.append(record)?;
                }
                Err(e) => {
                    tracing::warn!("Dropping product on {}: {}", page_url, e);
                    self.stats.records_dropped += 1;
                }
            }
        }

        for url in page.next_pages {
            if self
                .frontier
                .push(CrawlTask::new(url.clone(), CrawlStage::ProductExtraction))
            {
                tracing::debug!("Found pagination: {}", url);
            }
        }

        Ok(())
    }

    /// Writes the remaining partial batch and marks the crawl done
    fn finish(&mut self) -> Result<CrawlStats, ScraperError> {
        let written = self.buffer.flush()?;
        if written > 0 {
            tracing::info!("Final flush wrote {} records", written);
        }
        tracing::debug!("{} distinct URLs were queued", self.frontier.seen_count());

        self.enter(CrawlStage::Done);
        self.sync_buffer_stats();
        Ok(self.stats.clone())
    }

    fn abort(&mut self) -> ScraperError {
        let pending = self.buffer.pending();
        tracing::warn!(
            "Crawl aborted: {} buffered records not written, {} pages left in the frontier",
            pending,
            self.frontier.len()
        );

        self.enter(CrawlStage::Done);
        self.sync_buffer_stats();
        ScraperError::Aborted { pending }
    }

    fn sync_buffer_stats(&mut self) {
        let buffer_stats = self.buffer.stats();
        self.stats.batches_flushed = buffer_stats.flushes;
        self.stats.records_flushed = buffer_stats.records_flushed;
    }

    fn enter(&mut self, next: CrawlStage) {
        if next == self.stage {
            return;
        }

        if !self.stage.can_transition_to(next) {
            tracing::warn!("Unexpected stage transition: {} -> {}", self.stage, next);
        }
        tracing::debug!("Crawl stage: {} -> {}", self.stage, next);
        self.stage = next;
    }
}
