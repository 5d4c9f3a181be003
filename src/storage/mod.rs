//! Storage module for persisting scraped products
//!
//! This module handles all database operations for the scraper, including:
//! - Checking that the product and price tables exist before a crawl
//! - Insert-or-ignore bulk writes of product and price snapshot rows
//! - Row counts for reporting

mod schema;
mod sqlite;
mod traits;

pub use schema::{create_tables, is_valid_identifier};
pub use sqlite::SqliteStore;
pub use traits::{ProductStore, StorageError, StorageResult};

use crate::record::ProductRecord;
use chrono::NaiveDate;

/// Format of the `scrapedAt` column
pub const SCRAPED_AT_FORMAT: &str = "%Y-%m-%d";

/// Product metadata row, keyed by `(shop, pid)`
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub shop: String,
    pub pid: String,
    pub name: String,
    pub url: String,
    pub img: Option<String>,
}

impl From<&ProductRecord> for ProductRow {
    fn from(record: &ProductRecord) -> Self {
        Self {
            shop: record.shop().to_string(),
            pid: record.pid().to_string(),
            name: record.name().to_string(),
            url: record.url().to_string(),
            img: record.image_url().map(str::to_string),
        }
    }
}

/// Price observation row, keyed by `(shop, pid, scrapedAt)`
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSnapshotRow {
    pub shop: String,
    pub pid: String,
    pub scraped_at: NaiveDate,
    pub current_price: f64,
    pub original_price: Option<f64>,
    pub in_stock: bool,
}

impl PriceSnapshotRow {
    /// Builds the snapshot of `record` observed on `scraped_at`
    pub fn from_record(record: &ProductRecord, scraped_at: NaiveDate) -> Self {
        Self {
            shop: record.shop().to_string(),
            pid: record.pid().to_string(),
            scraped_at,
            current_price: record.current_price(),
            original_price: record.original_price(),
            in_stock: record.in_stock(),
        }
    }
}
