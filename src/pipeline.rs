//! Write pipeline from buffered records to the two tables
//!
//! Each flushed batch becomes one insert into the product table followed by
//! one insert into the price table. Both skip keys that already exist, so
//! writing an overlapping batch again adds nothing.

use crate::buffer::BatchSink;
use crate::record::ProductRecord;
use crate::storage::{PriceSnapshotRow, ProductRow, ProductStore};
use crate::ScraperError;
use chrono::{Local, NaiveDate};

/// Counts of rows actually inserted by one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    pub products_inserted: usize,
    pub snapshots_inserted: usize,
}

/// Batch sink writing records through a [`ProductStore`]
pub struct WritePipeline<S> {
    store: S,
    scrape_date: Option<NaiveDate>,
}

impl<S: ProductStore> WritePipeline<S> {
    /// Creates a pipeline stamping snapshots with the local date at write time
    pub fn new(store: S) -> Self {
        Self {
            store,
            scrape_date: None,
        }
    }

    /// Creates a pipeline stamping every snapshot with `date`
    pub fn with_scrape_date(store: S, date: NaiveDate) -> Self {
        Self {
            store,
            scrape_date: Some(date),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Writes `records` and reports how many rows were new
    ///
    /// The product insert is committed before the price insert starts; a
    /// failure in either is returned as [`ScraperError::Write`] naming the table.
    pub fn write(&mut self, records: &[ProductRecord]) -> Result<WriteOutcome, ScraperError> {
        let scraped_at = self
            .scrape_date
            .unwrap_or_else(|| Local::now().date_naive());

        let products: Vec<ProductRow> = records.iter().map(ProductRow::from).collect();
        let snapshots: Vec<PriceSnapshotRow> = records
            .iter()
            .map(|record| PriceSnapshotRow::from_record(record, scraped_at))
            .collect();

        let products_inserted =
            self.store
                .insert_products(&products)
                .map_err(|source| ScraperError::Write {
                    table: self.store.product_table().to_string(),
                    source,
                })?;

        let snapshots_inserted = self
            .store
            .insert_price_snapshots(&snapshots)
            .map_err(|source| ScraperError::Write {
                table: self.store.price_table().to_string(),
                source,
            })?;

        Ok(WriteOutcome {
            products_inserted,
            snapshots_inserted,
        })
    }
}

impl<S: ProductStore> BatchSink for WritePipeline<S> {
    fn write_batch(&mut self, records: &[ProductRecord]) -> Result<(), ScraperError> {
        let outcome = self.write(records)?;
        tracing::info!(
            "Wrote batch of {}: {} new products, {} new price snapshots",
            records.len(),
            outcome.products_inserted,
            outcome.snapshots_inserted
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawProduct;
    use crate::storage::SqliteStore;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn record(pid: &str, price: &str) -> ProductRecord {
        ProductRecord::from_raw(RawProduct {
            pid: Some(pid.to_string()),
            name: Some(format!("Product {}", pid)),
            url: Some(format!("https://www.bikero.cz/p/{}", pid)),
            image_url: Some(format!("https://www.bikero.cz/img/{}.jpg", pid)),
            current_price: Some(price.to_string()),
            original_price: None,
            in_stock: false,
        })
        .unwrap()
    }

    fn pipeline() -> WritePipeline<SqliteStore> {
        let store = SqliteStore::open_in_memory("products", "prices").unwrap();
        WritePipeline::with_scrape_date(store, date())
    }

    #[test]
    fn test_write_projects_both_tables() {
        let mut pipeline = pipeline();
        let outcome = pipeline
            .write(&[record("1", "1 000 Kč"), record("2", "2 000 Kč")])
            .unwrap();

        assert_eq!(
            outcome,
            WriteOutcome {
                products_inserted: 2,
                snapshots_inserted: 2
            }
        );
        assert_eq!(pipeline.store().count_products().unwrap(), 2);
        assert_eq!(pipeline.store().count_price_snapshots().unwrap(), 2);
        assert_eq!(pipeline.store().latest_scrape_date().unwrap(), Some(date()));
    }

    #[test]
    fn test_rewriting_same_batch_is_noop() {
        let mut pipeline = pipeline();
        let batch = [record("1", "1 000 Kč"), record("2", "2 000 Kč")];

        pipeline.write(&batch).unwrap();
        let second = pipeline.write(&batch).unwrap();

        assert_eq!(second, WriteOutcome::default());
        assert_eq!(pipeline.store().count_products().unwrap(), 2);
        assert_eq!(pipeline.store().count_price_snapshots().unwrap(), 2);
    }

    #[test]
    fn test_write_error_names_table() {
        let store = SqliteStore::open(":memory:", "products", "prices").unwrap();
        let mut pipeline = WritePipeline::with_scrape_date(store, date());

        let err = pipeline.write(&[record("1", "10 Kč")]).unwrap_err();
        assert!(matches!(err, ScraperError::Write { table, .. } if table == "products"));
    }
}
