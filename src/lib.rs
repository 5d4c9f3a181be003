//! Bikero scraper: a price tracker for the bikero.cz catalog
//!
//! This crate crawls the shop's category listings, extracts product
//! observations and writes them into a product table and a price history
//! table, batching writes and ignoring rows whose keys already exist.

pub mod buffer;
pub mod config;
pub mod crawler;
pub mod output;
pub mod pipeline;
pub mod price;
pub mod record;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for scraper operations
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Write to table '{table}' failed: {source}")]
    Write {
        table: String,
        source: storage::StorageError,
    },

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Crawl aborted with {pending} buffered records not written")]
    Aborted { pending: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    #[error("Required environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for scraper operations
pub type Result<T> = std::result::Result<T, ScraperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use buffer::{BatchSink, RecordBuffer};
pub use config::Config;
pub use pipeline::WritePipeline;
pub use price::parse_price;
pub use record::ProductRecord;
pub use state::CrawlStage;
