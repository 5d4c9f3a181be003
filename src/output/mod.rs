//! Output module for reporting crawl results
//!
//! This module handles:
//! - Counters collected during a crawl run
//! - Row counts read back from the store

pub mod stats;

pub use stats::{
    load_store_statistics, print_crawl_stats, print_store_statistics, CrawlStats, StoreStatistics,
};
