//! Bikero scraper main entry point
//!
//! This is the command-line interface for the bikero.cz price tracker.

use anyhow::Context;
use bikero_scraper::config::{load_config, Config};
use bikero_scraper::crawler::crawl;
use bikero_scraper::output::{
    load_store_statistics, print_crawl_stats, print_store_statistics,
};
use bikero_scraper::storage::{ProductStore, SqliteStore};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Bikero scraper: a price tracker for the bikero.cz catalog
///
/// Crawls every manufacturer category of the shop, extracts product prices
/// and availability, and appends them to a product table and a daily price
/// history table. Database settings come from the environment (or a .env
/// file): BIKERO_DB_CONNECTION, BIKERO_PRODUCT_TABLE, BIKERO_PRICE_TABLE.
#[derive(Parser, Debug)]
#[command(name = "bikero-scraper")]
#[command(version = "1.0.0")]
#[command(about = "A price tracker for the bikero.cz catalog", long_about = None)]
struct Cli {
    /// Path to an optional TOML settings file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate configuration and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["stats", "init_schema"])]
    dry_run: bool,

    /// Show row counts from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "init_schema"])]
    stats: bool,

    /// Create the product and price tables if missing and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    init_schema: bool,

    /// Crawl only this category listing (repeatable), skipping discovery
    #[arg(long, value_name = "URL")]
    category: Vec<Url>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    if let Some(path) = &cli.config {
        tracing::info!("Loading settings from: {}", path.display());
    }
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    tracing::info!(
        "Configuration loaded (database: {}, tables: {} / {})",
        config.database.connection,
        config.database.product_table,
        config.database.price_table
    );

    if cli.dry_run {
        handle_dry_run(&config, &cli.category);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.init_schema {
        handle_init_schema(&config)?;
    } else {
        handle_crawl(&config, cli.category).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bikero_scraper=info,warn"),
            1 => EnvFilter::new("bikero_scraper=debug,info"),
            2 => EnvFilter::new("bikero_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, categories: &[Url]) {
    println!("=== Bikero Scraper Dry Run ===\n");

    println!("Database:");
    println!("  Connection: {}", config.database.connection);
    println!("  Product table: {}", config.database.product_table);
    println!("  Price table: {}", config.database.price_table);

    println!("\nCrawler Configuration:");
    println!("  Start URL: {}", config.crawler.start_url);
    println!("  Batch size: {}", config.crawler.batch_size);
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    match config.crawler.max_pages {
        Some(max) => println!("  Max pages: {}", max),
        None => println!("  Max pages: unlimited"),
    }
    println!("  In-stock label: {}", config.crawler.in_stock_label);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\n✓ Configuration is valid");
    if categories.is_empty() {
        println!("✓ Would discover categories from {}", config.crawler.start_url);
    } else {
        println!("✓ Would crawl {} given categories:", categories.len());
        for url in categories {
            println!("  * {}", url);
        }
    }
}

/// Handles the --stats mode: shows row counts from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.database.connection);

    let store = open_store(config)?;
    store.verify_tables()?;
    let stats = load_store_statistics(&store)?;
    print_store_statistics(&stats);

    Ok(())
}

/// Handles the --init-schema mode: creates both tables
fn handle_init_schema(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    store
        .init_schema()
        .context("Failed to create the product tables")?;

    println!(
        "✓ Tables '{}' and '{}' are ready in {}",
        config.database.product_table, config.database.price_table, config.database.connection
    );
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, categories: Vec<Url>) -> anyhow::Result<()> {
    match crawl(config, categories).await {
        Ok(stats) => {
            tracing::info!("Crawl completed successfully");
            print_crawl_stats(&stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

fn open_store(config: &Config) -> anyhow::Result<SqliteStore> {
    SqliteStore::open(
        &config.database.connection,
        &config.database.product_table,
        &config.database.price_table,
    )
    .with_context(|| format!("Failed to open database {}", config.database.connection))
}
