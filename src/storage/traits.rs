//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{PriceSnapshotRow, ProductRow};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Table {0} does not exist")]
    MissingTable(String),

    #[error("Invalid table name: '{0}'")]
    InvalidIdentifier(String),

    #[error("Invalid stored value: {0}")]
    InvalidValue(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Writes are insert-only: a row whose key already exists is skipped
/// silently and never updated. Each insert call is one committed unit.
pub trait ProductStore {
    /// Name of the product metadata table
    fn product_table(&self) -> &str;

    /// Name of the price snapshot table
    fn price_table(&self) -> &str;

    /// Fails with [`StorageError::MissingTable`] unless both tables exist
    fn verify_tables(&self) -> StorageResult<()>;

    /// Inserts product rows, ignoring keys already present
    ///
    /// # Returns
    ///
    /// The number of rows actually inserted
    fn insert_products(&mut self, rows: &[ProductRow]) -> StorageResult<usize>;

    /// Inserts price snapshot rows, ignoring keys already present
    ///
    /// # Returns
    ///
    /// The number of rows actually inserted
    fn insert_price_snapshots(&mut self, rows: &[PriceSnapshotRow]) -> StorageResult<usize>;

    // ===== Statistics =====

    /// Counts product rows
    fn count_products(&self) -> StorageResult<u64>;

    /// Counts price snapshot rows
    fn count_price_snapshots(&self) -> StorageResult<u64>;

    /// Gets the most recent `scrapedAt` date, if any snapshot exists
    fn latest_scrape_date(&self) -> StorageResult<Option<NaiveDate>>;
}
