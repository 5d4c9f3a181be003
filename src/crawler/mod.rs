//! Crawler module for catalog fetching and product extraction
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `Fetcher` trait
//! - Catalog HTML parsing (categories, products, pagination)
//! - The frontier worklist of (URL, stage) tasks
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, fetch_url, FetchError, Fetcher, HttpFetcher};
pub use frontier::{CrawlTask, Frontier};
pub use parser::{CatalogParser, ListingPage};

use crate::config::Config;
use crate::output::CrawlStats;
use crate::pipeline::WritePipeline;
use crate::storage::{ProductStore, SqliteStore};
use crate::ScraperError;
use url::Url;

/// Runs a complete crawl against the configured database
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the store and check that both tables exist
/// 2. Build the HTTP fetcher
/// 3. Seed the frontier with the catalog root, or with `categories` if any are given
/// 4. Run the coordinator until the frontier is empty or Ctrl-C is pressed
///
/// # Arguments
///
/// * `config` - The scraper configuration
/// * `categories` - Category listing URLs to crawl instead of discovering them
///
/// # Returns
///
/// * `Ok(CrawlStats)` - Crawl completed and every record was written
/// * `Err(ScraperError)` - Startup failed, a write failed, or the crawl was interrupted
pub async fn crawl(config: &Config, categories: Vec<Url>) -> Result<CrawlStats, ScraperError> {
    let store = SqliteStore::open(
        &config.database.connection,
        &config.database.product_table,
        &config.database.price_table,
    )?;
    store.verify_tables()?;

    let fetcher = HttpFetcher::from_config(&config.user_agent)?;
    let mut coordinator =
        Coordinator::from_config(fetcher, WritePipeline::new(store), &config.crawler)?;

    if categories.is_empty() {
        coordinator.seed_root(Url::parse(&config.crawler.start_url)?);
    } else {
        tracing::info!(
            "Crawling {} given categories, skipping discovery",
            categories.len()
        );
        coordinator.seed_categories(categories);
    }

    coordinator.run_until(shutdown_signal()).await
}

/// Completes when the process receives Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
