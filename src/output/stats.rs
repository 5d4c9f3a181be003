//! Statistics for crawl runs and the product store
//!
//! This module provides the counters collected during a crawl and the
//! row counts read back from the store, with functions to display both.

use crate::storage::ProductStore;
use crate::ScraperError;
use chrono::NaiveDate;

/// Counters collected by one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Distinct category links queued from the root page
    pub categories_discovered: u64,

    /// Pages fetched and parsed
    pub pages_parsed: u64,

    /// Pages that could not be fetched
    pub pages_failed: u64,

    /// Product blocks turned into records
    pub records_extracted: u64,

    /// Product blocks rejected as malformed
    pub records_dropped: u64,

    /// Batches handed to the write pipeline
    pub batches_flushed: u64,

    /// Records handed to the write pipeline
    pub records_flushed: u64,
}

impl CrawlStats {
    /// Pages fetched, successfully or not
    pub fn pages_visited(&self) -> u64 {
        self.pages_parsed + self.pages_failed
    }
}

/// Prints crawl statistics to stdout
pub fn print_crawl_stats(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Pages:");
    println!("  Categories discovered: {}", stats.categories_discovered);
    println!("  Pages parsed: {}", stats.pages_parsed);
    println!("  Pages failed: {}", stats.pages_failed);
    println!();

    println!("Products:");
    println!("  Records extracted: {}", stats.records_extracted);
    println!("  Records dropped: {}", stats.records_dropped);
    println!(
        "  Records written: {} in {} batches",
        stats.records_flushed, stats.batches_flushed
    );
}

/// Row counts read from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatistics {
    pub product_table: String,
    pub price_table: String,
    pub products: u64,
    pub price_snapshots: u64,
    pub latest_scrape: Option<NaiveDate>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The storage backend to query
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(ScraperError)` - Failed to query statistics
pub fn load_store_statistics(store: &dyn ProductStore) -> Result<StoreStatistics, ScraperError> {
    Ok(StoreStatistics {
        product_table: store.product_table().to_string(),
        price_table: store.price_table().to_string(),
        products: store.count_products()?,
        price_snapshots: store.count_price_snapshots()?,
        latest_scrape: store.latest_scrape_date()?,
    })
}

/// Prints store statistics to stdout
pub fn print_store_statistics(stats: &StoreStatistics) {
    println!("=== Store Statistics ===\n");
    println!("  Products ({}): {}", stats.product_table, stats.products);
    println!(
        "  Price snapshots ({}): {}",
        stats.price_table, stats.price_snapshots
    );
    match stats.latest_scrape {
        Some(date) => println!("  Latest scrape: {}", date),
        None => println!("  Latest scrape: never"),
    }
}
