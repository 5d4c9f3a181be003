use crate::buffer::DEFAULT_BATCH_SIZE;
use serde::Deserialize;

/// Catalog page listing every manufacturer category
pub const DEFAULT_START_URL: &str = "https://www.bikero.cz/vyrobci-c56882/";

/// Availability label shown for products in stock
pub const DEFAULT_IN_STOCK_LABEL: &str = "Skladem";

/// Main configuration structure for the scraper
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub crawler: CrawlerConfig,
    pub user_agent: UserAgentConfig,
}

/// Database connection settings, read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub connection: String,

    /// Table holding product metadata
    pub product_table: String,

    /// Table holding price snapshots
    pub price_table: String,
}

/// Optional settings file layout
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Catalog page the category discovery starts from
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Records buffered before a write is triggered
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Minimum time between two page fetches (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Stop after this many pages have been fetched
    #[serde(rename = "max-pages")]
    pub max_pages: Option<u32>,

    /// Availability text that marks a product as in stock
    #[serde(rename = "in-stock-label")]
    pub in_stock_label: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            request_delay_ms: 250,
            max_pages: None,
            in_stock_label: DEFAULT_IN_STOCK_LABEL.to_string(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "bikero-scraper".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}
