//! HTML parser for the bikero.cz catalog pages
//!
//! This module extracts:
//! - Category links from the catalog root page
//! - Product blocks from category listing pages
//! - Pagination links from category listing pages

use crate::record::{ExtractionError, ProductRecord, RawProduct};
use crate::ScraperError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

const CATEGORY_LINK: &str = "#ProductsMaster li.leaf a.name";
const PRODUCT_BLOCK: &str = "#ProductListDefault .ProductView";
const PRODUCT_NAME: &str = "h2";
const PRODUCT_LINK: &str = "h2 a";
const PRODUCT_IMAGE: &str = ".image img";
const CURRENT_PRICE: &str = ".price.vat.primary.user .value";
const ORIGINAL_PRICE: &str = ".price.vat.primary.retail .value";
const AVAILABILITY: &str = ".AvailabilityView .label";
const PAGINATION_LINK: &str = "#CompoundPagingBottom a.page:not(.active)";

/// Attribute on the product block carrying the shop's product id
const PID_ATTR: &str = "data-clipboard";

/// Lazily loaded images keep their URL here instead of `src`
const IMAGE_ATTR: &str = "data-src";

/// What a category listing page yields
#[derive(Debug)]
pub struct ListingPage {
    /// One entry per product block, in page order
    pub products: Vec<Result<ProductRecord, ExtractionError>>,

    /// Pagination links other than the current page (absolute URLs)
    pub next_pages: Vec<Url>,
}

/// Parser holding the compiled selectors for the catalog markup
#[derive(Debug)]
pub struct CatalogParser {
    category_link: Selector,
    product_block: Selector,
    product_name: Selector,
    product_link: Selector,
    product_image: Selector,
    current_price: Selector,
    original_price: Selector,
    availability: Selector,
    pagination_link: Selector,
    in_stock_label: String,
}

fn compile(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::Selector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}

impl CatalogParser {
    /// Creates a parser treating `in_stock_label` as the in-stock availability text
    pub fn new(in_stock_label: impl Into<String>) -> Result<Self, ScraperError> {
        Ok(Self {
            category_link: compile(CATEGORY_LINK)?,
            product_block: compile(PRODUCT_BLOCK)?,
            product_name: compile(PRODUCT_NAME)?,
            product_link: compile(PRODUCT_LINK)?,
            product_image: compile(PRODUCT_IMAGE)?,
            current_price: compile(CURRENT_PRICE)?,
            original_price: compile(ORIGINAL_PRICE)?,
            availability: compile(AVAILABILITY)?,
            pagination_link: compile(PAGINATION_LINK)?,
            in_stock_label: in_stock_label.into(),
        })
    }

    /// Extracts category links from the catalog root page
    ///
    /// # Arguments
    ///
    /// * `html` - The root page HTML
    /// * `base_url` - The page URL, for resolving relative links
    pub fn parse_categories(&self, html: &str, base_url: &Url) -> Vec<Url> {
        let document = Html::parse_document(html);

        document
            .select(&self.category_link)
            .filter_map(|el| el.value().attr("href"))
            .filter_map(|href| resolve_link(href, base_url))
            .collect()
    }

    /// Extracts product records and pagination links from a listing page
    ///
    /// Blocks that cannot become a record are returned as errors in place,
    /// so the caller can report them without losing the rest of the page.
    pub fn parse_listing(&self, html: &str, base_url: &Url) -> ListingPage {
        let document = Html::parse_document(html);

        let products = document
            .select(&self.product_block)
            .map(|block| self.extract_product(block, base_url))
            .collect();

        let next_pages = document
            .select(&self.pagination_link)
            .filter_map(|el| el.value().attr("href"))
            .filter_map(|href| resolve_link(href, base_url))
            .collect();

        ListingPage {
            products,
            next_pages,
        }
    }

    fn extract_product(
        &self,
        block: ElementRef<'_>,
        base_url: &Url,
    ) -> Result<ProductRecord, ExtractionError> {
        let url = block
            .select(&self.product_link)
            .next()
            .and_then(|el| el.value().attr("href"))
            .and_then(|href| resolve_link(href, base_url));

        let image_url = block
            .select(&self.product_image)
            .next()
            .and_then(|el| el.value().attr(IMAGE_ATTR))
            .and_then(|src| resolve_link(src, base_url));

        let in_stock = first_text(block, &self.availability)
            .is_some_and(|label| label == self.in_stock_label);

        ProductRecord::from_raw(RawProduct {
            pid: block.value().attr(PID_ATTR).map(str::to_string),
            name: first_text(block, &self.product_name),
            url: url.map(String::from),
            image_url: image_url.map(String::from),
            current_price: first_text(block, &self.current_price),
            original_price: first_text(block, &self.original_price),
            in_stock,
        })
    }
}

/// Text of the first element matching `selector`, whitespace collapsed
///
/// Returns None when nothing matches or the text is blank.
fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty())
}

/// Resolves a link href to an absolute HTTP(S) URL
///
/// Returns None for empty, fragment-only and `javascript:` links, and for
/// anything that does not resolve to HTTP or HTTPS.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }

    base_url
        .join(href)
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}
