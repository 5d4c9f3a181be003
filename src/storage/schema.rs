//! Table definitions for the product and price snapshot tables
//!
//! Production databases are provisioned outside this crate; these
//! definitions back `--init-schema` and the tests.

use crate::storage::StorageError;

/// Checks that `name` is a plain SQL identifier
///
/// Table names end up inside SQL text, so only `[A-Za-z_][A-Za-z0-9_]*` is accepted.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Builds the schema SQL for the given table names
fn schema_sql(product_table: &str, price_table: &str) -> String {
    format!(
        r#"
-- Product metadata, one row per shop product
CREATE TABLE IF NOT EXISTS "{product_table}" (
    "shop" TEXT NOT NULL,
    "pid" TEXT NOT NULL,
    "name" TEXT NOT NULL,
    "url" TEXT NOT NULL,
    "img" TEXT,
    PRIMARY KEY ("shop", "pid")
);

-- Price history, one row per product per day
CREATE TABLE IF NOT EXISTS "{price_table}" (
    "shop" TEXT NOT NULL,
    "pid" TEXT NOT NULL,
    "scrapedAt" TEXT NOT NULL,
    "currentPrice" REAL NOT NULL,
    "originalPrice" REAL,
    "inStock" INTEGER NOT NULL,
    PRIMARY KEY ("shop", "pid", "scrapedAt")
);

CREATE INDEX IF NOT EXISTS "idx_{price_table}_scraped_at" ON "{price_table}"("scrapedAt");
"#
    )
}

/// Creates both tables if they do not exist yet
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `product_table` - Name of the product metadata table
/// * `price_table` - Name of the price snapshot table
pub fn create_tables(
    conn: &rusqlite::Connection,
    product_table: &str,
    price_table: &str,
) -> Result<(), StorageError> {
    for name in [product_table, price_table] {
        if !is_valid_identifier(name) {
            return Err(StorageError::InvalidIdentifier(name.to_string()));
        }
    }

    conn.execute_batch(&schema_sql(product_table, price_table))?;
    Ok(())
}
