//! Crawl stage definitions
//!
//! The crawl walks `Start -> CategoryDiscovery -> ProductExtraction -> Done`,
//! with `ProductExtraction` looping on itself through pagination links.

use std::fmt;

/// Stage of the crawl, and the handler a queued page is fetched for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlStage {
    /// Nothing has been fetched yet
    Start,

    /// The catalog root page, parsed for category links
    CategoryDiscovery,

    /// A category listing page, parsed for products and pagination links
    ProductExtraction,

    /// No outstanding pages remain
    Done,
}

impl CrawlStage {
    /// Returns true if this is the terminal stage
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if pages can be queued for this stage
    pub fn handles_pages(&self) -> bool {
        matches!(self, Self::CategoryDiscovery | Self::ProductExtraction)
    }

    /// Checks whether the crawl may move from `self` to `next`
    pub fn can_transition_to(&self, next: CrawlStage) -> bool {
        use CrawlStage::*;
        matches!(
            (self, next),
            (Start, CategoryDiscovery)
                | (Start, ProductExtraction)
                | (Start, Done)
                | (CategoryDiscovery, CategoryDiscovery)
                | (CategoryDiscovery, ProductExtraction)
                | (CategoryDiscovery, Done)
                | (ProductExtraction, ProductExtraction)
                | (ProductExtraction, Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::CategoryDiscovery => "category_discovery",
            Self::ProductExtraction => "product_extraction",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
