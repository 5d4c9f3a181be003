//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ProductStore trait.

use crate::storage::schema::{create_tables, is_valid_identifier};
use crate::storage::traits::{ProductStore, StorageError, StorageResult};
use crate::storage::{PriceSnapshotRow, ProductRow, SCRAPED_AT_FORMAT};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

/// Rows per INSERT statement, keeping well under SQLite's bound parameter limit
const MAX_ROWS_PER_STATEMENT: usize = 500;

const PRODUCT_COLUMNS: &[&str] = &["shop", "pid", "name", "url", "img"];

const PRICE_COLUMNS: &[&str] = &[
    "shop",
    "pid",
    "scrapedAt",
    "currentPrice",
    "originalPrice",
    "inStock",
];

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
    product_table: String,
    price_table: String,
}

impl SqliteStore {
    /// Opens a SQLite database holding the two tables
    ///
    /// # Arguments
    ///
    /// * `connection` - Path to the SQLite database file, or `:memory:`
    /// * `product_table` - Name of the product metadata table
    /// * `price_table` - Name of the price snapshot table
    ///
    /// The tables are not created; call [`SqliteStore::init_schema`] or
    /// provision them separately, then check with [`ProductStore::verify_tables`].
    pub fn open(connection: &str, product_table: &str, price_table: &str) -> StorageResult<Self> {
        for name in [product_table, price_table] {
            if !is_valid_identifier(name) {
                return Err(StorageError::InvalidIdentifier(name.to_string()));
            }
        }

        let conn = Connection::open(connection)?;

        // Configure SQLite for better performance
        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!("SQLite journal mode: {}", journal_mode);
        conn.execute_batch(
            "
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        Ok(Self {
            conn,
            product_table: product_table.to_string(),
            price_table: price_table.to_string(),
        })
    }

    /// Opens an in-memory database with both tables created
    pub fn open_in_memory(product_table: &str, price_table: &str) -> StorageResult<Self> {
        let store = Self::open(":memory:", product_table, price_table)?;
        store.init_schema()?;
        Ok(store)
    }

    /// Creates both tables if they are missing
    pub fn init_schema(&self) -> StorageResult<()> {
        create_tables(&self.conn, &self.product_table, &self.price_table)
    }

    fn table_exists(&self, table: &str) -> StorageResult<bool> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn count_rows(&self, table: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", table),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Inserts `rows` into `table` inside one transaction
    ///
    /// Conflicting keys are skipped by `ON CONFLICT DO NOTHING`, so the
    /// returned count only includes new rows.
    fn insert_ignoring_conflicts(
        &mut self,
        table: &str,
        columns: &[&str],
        rows: Vec<Vec<Value>>,
    ) -> StorageResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let column_list = columns
            .iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = format!("({})", vec!["?"; columns.len()].join(", "));

        let tx = self.conn.transaction()?;
        let mut inserted = 0;

        for chunk in rows.chunks(MAX_ROWS_PER_STATEMENT) {
            let sql = format!(
                "INSERT INTO \"{}\" ({}) VALUES {} ON CONFLICT DO NOTHING",
                table,
                column_list,
                vec![placeholders.as_str(); chunk.len()].join(", ")
            );
            inserted += tx.execute(&sql, params_from_iter(chunk.iter().flatten()))?;
        }

        tx.commit()?;
        Ok(inserted)
    }
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

impl ProductStore for SqliteStore {
    fn product_table(&self) -> &str {
        &self.product_table
    }

    fn price_table(&self) -> &str {
        &self.price_table
    }

    fn verify_tables(&self) -> StorageResult<()> {
        for table in [&self.product_table, &self.price_table] {
            if !self.table_exists(table)? {
                return Err(StorageError::MissingTable(table.clone()));
            }
        }
        Ok(())
    }

    fn insert_products(&mut self, rows: &[ProductRow]) -> StorageResult<usize> {
        let values = rows
            .iter()
            .map(|row| {
                vec![
                    text(&row.shop),
                    text(&row.pid),
                    text(&row.name),
                    text(&row.url),
                    row.img.as_deref().map_or(Value::Null, text),
                ]
            })
            .collect();

        let table = self.product_table.clone();
        self.insert_ignoring_conflicts(&table, PRODUCT_COLUMNS, values)
    }

    fn insert_price_snapshots(&mut self, rows: &[PriceSnapshotRow]) -> StorageResult<usize> {
        let values = rows
            .iter()
            .map(|row| {
                vec![
                    text(&row.shop),
                    text(&row.pid),
                    Value::Text(row.scraped_at.format(SCRAPED_AT_FORMAT).to_string()),
                    Value::Real(row.current_price),
                    row.original_price.map_or(Value::Null, Value::Real),
                    Value::Integer(i64::from(row.in_stock)),
                ]
            })
            .collect();

        let table = self.price_table.clone();
        self.insert_ignoring_conflicts(&table, PRICE_COLUMNS, values)
    }

    // ===== Statistics =====

    fn count_products(&self) -> StorageResult<u64> {
        self.count_rows(&self.product_table)
    }

    fn count_price_snapshots(&self) -> StorageResult<u64> {
        self.count_rows(&self.price_table)
    }

    fn latest_scrape_date(&self) -> StorageResult<Option<NaiveDate>> {
        let latest: Option<String> = self.conn.query_row(
            &format!("SELECT MAX(\"scrapedAt\") FROM \"{}\"", self.price_table),
            [],
            |row| row.get(0),
        )?;

        latest
            .map(|s| {
                NaiveDate::parse_from_str(&s, SCRAPED_AT_FORMAT)
                    .map_err(|e| StorageError::InvalidValue(format!("scrapedAt '{}': {}", s, e)))
            })
            .transpose()
    }
}
