//! State module for tracking crawl progress
//!
//! - `CrawlStage`: where the crawl is, and which handler a queued page is fetched for

mod crawl_stage;

pub use crawl_stage::CrawlStage;
