use crate::config::types::{Config, DatabaseConfig, SettingsFile};
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Environment variable holding the SQLite database path
pub const ENV_CONNECTION: &str = "BIKERO_DB_CONNECTION";

/// Environment variable naming the product metadata table
pub const ENV_PRODUCT_TABLE: &str = "BIKERO_PRODUCT_TABLE";

/// Environment variable naming the price snapshot table
pub const ENV_PRICE_TABLE: &str = "BIKERO_PRICE_TABLE";

/// Loads the configuration from the environment and an optional settings file
///
/// A `.env` file in the working directory (or a parent) is loaded first if
/// present. Database settings must come from the environment; crawler and
/// user agent settings default when no file is given.
///
/// # Arguments
///
/// * `settings_path` - Optional path to a TOML settings file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - A variable is missing, or the file failed to load or validate
///
/// # Example
///
/// ```no_run
/// use bikero_scraper::config::load_config;
///
/// let config = load_config(None).unwrap();
/// println!("Writing products to {}", config.database.product_table);
/// ```
pub fn load_config(settings_path: Option<&Path>) -> Result<Config, ConfigError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    let database = load_database_config(|key| std::env::var(key).ok())?;
    let settings = match settings_path {
        Some(path) => load_settings_file(path)?,
        None => SettingsFile::default(),
    };

    let config = Config {
        database,
        crawler: settings.crawler,
        user_agent: settings.user_agent,
    };
    validate(&config)?;

    Ok(config)
}

/// Reads the database settings through `lookup`
///
/// Empty values count as missing.
pub fn load_database_config<F>(lookup: F) -> Result<DatabaseConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let require = |key: &'static str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingEnv(key))
    };

    Ok(DatabaseConfig {
        connection: require(ENV_CONNECTION)?,
        product_table: require(ENV_PRODUCT_TABLE)?,
        price_table: require(ENV_PRICE_TABLE)?,
    })
}

/// Loads and parses a TOML settings file
pub fn load_settings_file(path: &Path) -> Result<SettingsFile, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let settings: SettingsFile = toml::from_str(&content)?;
    Ok(settings)
}
