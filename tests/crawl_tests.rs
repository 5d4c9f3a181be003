//! Integration tests for the crawl state machine
//!
//! Pages are served from memory so the tests cover discovery, pagination,
//! buffering and the write pipeline without any network access.

use bikero_scraper::buffer::RecordBuffer;
use bikero_scraper::crawler::{CatalogParser, Coordinator, FetchError, Fetcher, Frontier};
use bikero_scraper::pipeline::WritePipeline;
use bikero_scraper::state::CrawlStage;
use bikero_scraper::storage::{ProductStore, SqliteStore};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

const ROOT: &str = "https://www.bikero.cz/vyrobci-c56882/";

/// Serves canned pages and records every requested URL
#[derive(Default)]
struct StaticSite {
    pages: HashMap<String, String>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StaticSite {
    fn page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), html);
        self
    }

    /// Handle to the request log that outlives the site
    fn request_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.requests)
    }
}

impl Fetcher for StaticSite {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

fn scrape_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn root_page(categories: &[&str]) -> String {
    let items: String = categories
        .iter()
        .map(|href| format!(r#"<li class="leaf"><a class="name" href="{}">Cat</a></li>"#, href))
        .collect();
    format!(
        r#"<html><body><div id="ProductsMaster"><ul>{}</ul></div></body></html>"#,
        items
    )
}

fn product(pid: &str, price: &str) -> String {
    format!(
        r#"<div class="ProductView" data-clipboard="{pid}">
            <div class="image"><img data-src="/img/{pid}.jpg"></div>
            <h2><a href="/produkt-{pid}/">Product {pid}</a></h2>
            <div class="price vat primary user"><span class="value">{price}</span></div>
            <div class="price vat primary retail"><span class="value">1 999 Kč</span></div>
            <div class="AvailabilityView"><span class="label">Skladem</span></div>
        </div>"#
    )
}

/// URL of the 1-based page `n` of a category listing
fn page_url(base: &str, n: usize) -> String {
    if n == 1 {
        base.to_string()
    } else {
        format!("{}?page={}", base, n)
    }
}

/// Listing page with pagination; `active` is the 1-based current page
fn listing_page(products: &[String], base: &str, pages: usize, active: usize) -> String {
    let paging: String = (1..=pages)
        .map(|n| {
            let class = if n == active { "page active" } else { "page" };
            format!(r#"<a class="{}" href="{}">{}</a>"#, class, page_url(base, n), n)
        })
        .collect();
    format!(
        r#"<html><body>
            <div id="ProductListDefault">{}</div>
            <div id="CompoundPagingBottom">{}</div>
        </body></html>"#,
        products.concat(),
        paging
    )
}

fn coordinator(site: StaticSite, db_path: &str) -> Coordinator<StaticSite, WritePipeline<SqliteStore>> {
    let store = SqliteStore::open(db_path, "products", "prices").unwrap();
    store.init_schema().unwrap();

    Coordinator::new(
        site,
        CatalogParser::new("Skladem").unwrap(),
        Frontier::new(Duration::ZERO),
        RecordBuffer::new(WritePipeline::with_scrape_date(store, scrape_date()), 10),
    )
}

fn two_category_site() -> StaticSite {
    let cat_a = "https://www.bikero.cz/shimano-c1/";
    let cat_b = "https://www.bikero.cz/sram-c2/";

    StaticSite::default()
        .page(ROOT, root_page(&["/shimano-c1/", "/sram-c2/"]))
        .page(
            cat_a,
            listing_page(
                &[product("a1", "1 299 Kč"), product("a2", "899 Kč"), product("a3", "2 450,50 Kč")],
                cat_a,
                2,
                1,
            ),
        )
        .page(
            &format!("{}?page=2", cat_a),
            listing_page(&[product("a4", "15 990 Kč")], cat_a, 2, 2),
        )
        .page(
            cat_b,
            listing_page(
                &[product("b1", "499 Kč"), product("b2", "1.250,00 Kč"), product("b3", "75 Kč")],
                cat_b,
                1,
                1,
            ),
        )
}

#[tokio::test]
async fn test_full_crawl_writes_every_product_once() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("bikero.db");
    let db_path = db_path.to_str().unwrap();

    let mut coordinator = coordinator(two_category_site(), db_path);
    coordinator.seed_root(Url::parse(ROOT).unwrap());

    let stats = coordinator.run().await.unwrap();
    assert_eq!(coordinator.stage(), CrawlStage::Done);
    assert_eq!(stats.categories_discovered, 2);
    assert_eq!(stats.pages_parsed, 4);
    assert_eq!(stats.records_extracted, 7);
    assert_eq!(stats.records_dropped, 0);
    assert_eq!(stats.records_flushed, 7);
    // Seven records never reach the threshold, so only the final flush writes
    assert_eq!(stats.batches_flushed, 1);

    let store = coordinator.into_sink().into_store();
    assert_eq!(store.count_products().unwrap(), 7);
    assert_eq!(store.count_price_snapshots().unwrap(), 7);
    assert_eq!(store.latest_scrape_date().unwrap(), Some(scrape_date()));
    drop(store);

    let conn = Connection::open(db_path).unwrap();
    let distinct: i64 = conn
        .query_row("SELECT COUNT(DISTINCT pid) FROM prices", [], |row| row.get(0))
        .unwrap();
    assert_eq!(distinct, 7);

    let dates: Vec<String> = conn
        .prepare("SELECT DISTINCT scrapedAt FROM prices")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(dates, vec!["2026-10-16".to_string()]);

    let (price, original, in_stock): (f64, Option<f64>, bool) = conn
        .query_row(
            "SELECT currentPrice, originalPrice, inStock FROM prices WHERE pid = 'a3'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(price, 2450.5);
    assert_eq!(original, Some(1999.0));
    assert!(in_stock);

    let (url, img): (String, Option<String>) = conn
        .query_row(
            "SELECT url, img FROM products WHERE shop = 'bikero-cz' AND pid = 'b2'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(url, "https://www.bikero.cz/produkt-b2/");
    assert_eq!(img.as_deref(), Some("https://www.bikero.cz/img/b2.jpg"));
}

/// Both categories end in a second page
fn two_paginated_categories_site() -> StaticSite {
    let cat_b = "https://www.bikero.cz/sram-c2/";

    two_category_site()
        .page(
            cat_b,
            listing_page(
                &[product("b1", "499 Kč"), product("b2", "1.250,00 Kč"), product("b3", "75 Kč")],
                cat_b,
                2,
                1,
            ),
        )
        .page(
            &format!("{}?page=2", cat_b),
            listing_page(&[product("b4", "3 100 Kč")], cat_b, 2, 2),
        )
}

#[tokio::test]
async fn test_full_crawl_with_every_category_paginated() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("bikero.db");
    let db_path = db_path.to_str().unwrap();

    let site = two_paginated_categories_site();
    let log = site.request_log();
    let mut coordinator = coordinator(site, db_path);
    coordinator.seed_root(Url::parse(ROOT).unwrap());

    let stats = coordinator.run().await.unwrap();
    assert_eq!(stats.categories_discovered, 2);
    assert_eq!(stats.pages_parsed, 5);
    assert_eq!(stats.pages_failed, 0);
    assert_eq!(stats.records_extracted, 8);
    assert_eq!(stats.records_flushed, 8);
    assert_eq!(stats.batches_flushed, 1);

    // Second pages link back to the first, which is not fetched again
    let requested = log.lock().unwrap().clone();
    assert_eq!(
        requested,
        vec![
            ROOT.to_string(),
            "https://www.bikero.cz/shimano-c1/".to_string(),
            "https://www.bikero.cz/sram-c2/".to_string(),
            "https://www.bikero.cz/shimano-c1/?page=2".to_string(),
            "https://www.bikero.cz/sram-c2/?page=2".to_string(),
        ]
    );

    let store = coordinator.into_sink().into_store();
    assert_eq!(store.count_products().unwrap(), 8);
    assert_eq!(store.count_price_snapshots().unwrap(), 8);
    drop(store);

    let conn = Connection::open(db_path).unwrap();
    let (distinct_pids, distinct_dates): (i64, i64) = conn
        .query_row(
            "SELECT COUNT(DISTINCT pid), COUNT(DISTINCT scrapedAt) FROM prices",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(distinct_pids, 8);
    assert_eq!(distinct_dates, 1);
}

#[tokio::test]
async fn test_pagination_chain_visits_each_page_once() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("bikero.db");
    let base = "https://www.bikero.cz/shimano-c1/";
    let pages = 6;

    // Every page links to every other page, including back to earlier ones
    let mut site = StaticSite::default();
    for n in 1..=pages {
        site = site.page(
            &page_url(base, n),
            listing_page(&[product(&format!("p{}", n), "100 Kč")], base, pages, n),
        );
    }
    let log = site.request_log();

    let mut coordinator = coordinator(site, db_path.to_str().unwrap());
    coordinator.seed_categories([Url::parse(base).unwrap()]);

    let stats = coordinator.run().await.unwrap();
    assert_eq!(stats.pages_parsed, pages as u64);
    assert_eq!(stats.pages_failed, 0);
    assert_eq!(stats.records_flushed, pages as u64);

    let mut requested = log.lock().unwrap().clone();
    assert_eq!(requested.len(), pages);
    requested.sort();
    requested.dedup();
    assert_eq!(requested.len(), pages);

    let pipeline = coordinator.into_sink();
    assert_eq!(pipeline.store().count_products().unwrap(), pages as u64);
}

#[tokio::test]
async fn test_malformed_price_is_dropped() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("bikero.db");
    let base = "https://www.bikero.cz/shimano-c1/";

    let site = StaticSite::default().page(
        base,
        listing_page(
            &[
                product("ok1", "1 299 Kč"),
                product("bad", "Cena na dotaz"),
                product("ok2", "899 Kč"),
            ],
            base,
            1,
            1,
        ),
    );

    let mut coordinator = coordinator(site, db_path.to_str().unwrap());
    coordinator.seed_categories([Url::parse(base).unwrap()]);

    let stats = coordinator.run().await.unwrap();
    assert_eq!(stats.records_extracted, 2);
    assert_eq!(stats.records_dropped, 1);

    let store = coordinator.into_sink().into_store();
    assert_eq!(store.count_products().unwrap(), 2);
    assert_eq!(store.count_price_snapshots().unwrap(), 2);
}

#[tokio::test]
async fn test_threshold_flushes_during_crawl() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("bikero.db");
    let base = "https://www.bikero.cz/shimano-c1/";

    let products: Vec<String> = (1..=25)
        .map(|n| product(&format!("p{}", n), "100 Kč"))
        .collect();
    let site = StaticSite::default().page(base, listing_page(&products, base, 1, 1));

    let mut coordinator = coordinator(site, db_path.to_str().unwrap());
    coordinator.seed_categories([Url::parse(base).unwrap()]);

    let stats = coordinator.run().await.unwrap();
    // Two full batches of ten, then the final flush of five
    assert_eq!(stats.batches_flushed, 3);
    assert_eq!(stats.records_flushed, 25);
    assert_eq!(coordinator.buffer().pending(), 0);

    let store = coordinator.into_sink().into_store();
    assert_eq!(store.count_products().unwrap(), 25);
}

#[tokio::test]
async fn test_second_crawl_same_day_adds_nothing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("bikero.db");
    let db_path = db_path.to_str().unwrap();

    for run in 0..2 {
        let mut coordinator = coordinator(two_category_site(), db_path);
        coordinator.seed_root(Url::parse(ROOT).unwrap());
        let stats = coordinator.run().await.unwrap();
        assert_eq!(stats.records_flushed, 7, "run {}", run);
    }

    let store = SqliteStore::open(db_path, "products", "prices").unwrap();
    assert_eq!(store.count_products().unwrap(), 7);
    assert_eq!(store.count_price_snapshots().unwrap(), 7);
}

#[tokio::test]
async fn test_failed_category_does_not_stop_crawl() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("bikero.db");
    let base = "https://www.bikero.cz/sram-c2/";

    let site = StaticSite::default()
        .page(ROOT, root_page(&["/missing-c9/", "/sram-c2/"]))
        .page(base, listing_page(&[product("b1", "499 Kč")], base, 1, 1));

    let mut coordinator = coordinator(site, db_path.to_str().unwrap());
    coordinator.seed_root(Url::parse(ROOT).unwrap());

    let stats = coordinator.run().await.unwrap();
    assert_eq!(stats.pages_failed, 1);
    assert_eq!(stats.records_flushed, 1);
}
