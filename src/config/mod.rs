//! Configuration module for the scraper
//!
//! Database settings come from the environment (optionally via a `.env`
//! file); crawler and user agent settings come from an optional TOML file.
//!
//! # Example
//!
//! ```no_run
//! use bikero_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Some(Path::new("scraper.toml"))).unwrap();
//! println!("Starting at {}", config.crawler.start_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DatabaseConfig, SettingsFile, UserAgentConfig, DEFAULT_IN_STOCK_LABEL,
    DEFAULT_START_URL,
};

// Re-export parser functions
pub use parser::{
    load_config, load_database_config, load_settings_file, ENV_CONNECTION, ENV_PRICE_TABLE,
    ENV_PRODUCT_TABLE,
};
pub use validation::validate;
