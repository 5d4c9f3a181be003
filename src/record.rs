//! Product observations extracted from listing pages

use crate::price::{parse_price, PriceError};
use thiserror::Error;

/// Identifier of the shop every record belongs to
pub const SHOP: &str = "bikero-cz";

/// Currency all bikero.cz prices are listed in
pub const CURRENCY: &str = "CZK";

/// A product block that could not be turned into a record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("product block is missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("invalid {field} for product {pid}: {source}")]
    InvalidPrice {
        field: &'static str,
        pid: String,
        source: PriceError,
    },
}

/// Raw text pulled out of a single product block
///
/// Every field is optional because the markup may lack any of them;
/// [`ProductRecord::from_raw`] decides which ones are required.
#[derive(Debug, Clone, Default)]
pub struct RawProduct {
    pub pid: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub current_price: Option<String>,
    pub original_price: Option<String>,
    pub in_stock: bool,
}

/// One observation of a product in the catalog
///
/// Records are validated when built and never change afterwards. The
/// observation date is not part of the record; it is assigned when the
/// record is written.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    shop: String,
    pid: String,
    name: String,
    url: String,
    image_url: Option<String>,
    current_price: f64,
    original_price: Option<f64>,
    in_stock: bool,
    currency: String,
}

impl ProductRecord {
    /// Builds a record from the raw text of a product block
    ///
    /// `pid`, `name`, `url` and a readable `current_price` are required. An
    /// empty original price means the product is not discounted.
    pub fn from_raw(raw: RawProduct) -> Result<Self, ExtractionError> {
        let pid = required(raw.pid, "pid")?;
        let name = required(raw.name, "name")?;
        let url = required(raw.url, "url")?;
        let current_text = required(raw.current_price, "current_price")?;

        let current_price = parse_price(&current_text)
            .map_err(|source| ExtractionError::InvalidPrice {
                field: "current_price",
                pid: pid.clone(),
                source,
            })?
            .ok_or(ExtractionError::MissingField {
                field: "current_price",
            })?;

        let original_price = match raw.original_price {
            Some(text) => {
                parse_price(&text).map_err(|source| ExtractionError::InvalidPrice {
                    field: "original_price",
                    pid: pid.clone(),
                    source,
                })?
            }
            None => None,
        };

        Ok(Self {
            shop: SHOP.to_string(),
            pid,
            name,
            url,
            image_url: raw.image_url.filter(|s| !s.trim().is_empty()),
            current_price,
            original_price,
            in_stock: raw.in_stock,
            currency: CURRENCY.to_string(),
        })
    }

    pub fn shop(&self) -> &str {
        &self.shop
    }

    pub fn pid(&self) -> &str {
        &self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    pub fn original_price(&self) -> Option<f64> {
        self.original_price
    }

    pub fn in_stock(&self) -> bool {
        self.in_stock
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ExtractionError> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ExtractionError::MissingField { field })
}
