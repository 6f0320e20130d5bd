//! Record types produced by the crawl pipeline
//!
//! A crawl run emits a list of [`PageRecord`] values, one per stored page,
//! discriminated by a `type` tag in the serialized output. Product pages
//! reached through category listings end up as [`ProductRecord`] entries
//! inside their category's product list rather than as standalone records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A page record stored by the crawler, tagged by page type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PageRecord {
    /// A single product page
    Product(ProductRecord),

    /// A category listing, aggregated across its pagination pages
    Category(CategoryRecord),

    /// A frequently-asked-questions page
    Faq(FaqRecord),

    /// Any other informational page
    General(GeneralRecord),
}

impl PageRecord {
    /// URL of the underlying page
    pub fn url(&self) -> &str {
        match self {
            PageRecord::Product(r) => &r.url,
            PageRecord::Category(r) => &r.url,
            PageRecord::Faq(r) => &r.url,
            PageRecord::General(r) => &r.url,
        }
    }

    /// Stable name of the record type, matching the serialized tag
    pub fn kind_name(&self) -> &'static str {
        match self {
            PageRecord::Product(_) => "product",
            PageRecord::Category(_) => "category",
            PageRecord::Faq(_) => "faq",
            PageRecord::General(_) => "general",
        }
    }
}

/// A fully extracted product
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Canonical URL of the product page
    pub url: String,

    /// When the page was scraped
    pub scraped_at: DateTime<Utc>,

    /// Depth at which the page was reached
    pub depth: u32,

    /// Product name
    pub name: String,

    /// Price as displayed on the page
    pub price: String,

    /// Availability / stock status
    pub availability: String,

    /// Product description
    pub description: String,

    /// Specifications, keyed by labeled section then attribute name
    pub specifications: BTreeMap<String, BTreeMap<String, String>>,

    /// Color variants, each optionally carrying per-size availability
    pub colors: Vec<ColorVariant>,

    /// Product image URLs
    pub images: Vec<String>,

    /// Stock-keeping unit / product code
    pub sku: String,

    /// Category type the product belongs to
    pub category_type: String,
}

/// A color variant of a product
///
/// When the source exposes the color → size relationship the `sizes` list
/// carries one entry per size with its availability; otherwise it stays
/// empty and the variant degrades to a bare color name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColorVariant {
    /// Human-readable color name
    pub name: String,

    /// Sizes offered in this color, with availability
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<SizeOption>,
}

/// A single size offered for a color variant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SizeOption {
    /// Size label as shown on the page
    pub size: String,

    /// Whether this size is currently purchasable
    pub available: bool,
}

/// Minimal product data visible in a category listing snippet
///
/// Used as the fallback when the product-detail fetch fails, so the product
/// is kept with partial data instead of being dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductSummary {
    /// Product name from the listing
    pub name: String,

    /// Approximate price from the listing, may be empty
    pub price: String,

    /// Canonical URL of the product page
    pub url: String,
}

impl ProductSummary {
    /// Build a minimal [`ProductRecord`] from the listing snippet
    pub fn into_record(self, category_type: &str, depth: u32) -> ProductRecord {
        ProductRecord {
            url: self.url,
            scraped_at: Utc::now(),
            depth,
            name: self.name,
            price: self.price,
            category_type: category_type.to_string(),
            ..ProductRecord::default()
        }
    }
}

/// An aggregated category listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRecord {
    /// Canonical base URL, trailing-slash normalized
    pub url: String,

    /// When the first category page was scraped
    pub scraped_at: DateTime<Utc>,

    /// Depth at which the category was reached
    pub depth: u32,

    /// Category name
    pub name: String,

    /// Category description
    pub description: String,

    /// Category type derived from the URL
    pub category_type: String,

    /// Products in the category, unique by URL
    pub products: Vec<ProductRecord>,

    /// True once pagination has been fully resolved
    pub aggregated: bool,
}

/// A FAQ page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqRecord {
    /// Canonical URL of the page
    pub url: String,

    /// When the page was scraped
    pub scraped_at: DateTime<Utc>,

    /// Depth at which the page was reached
    pub depth: u32,

    /// Page title
    pub title: String,

    /// Question/answer pairs found on the page
    pub questions: Vec<FaqEntry>,
}

/// A single question/answer pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// A general informational page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralRecord {
    /// Canonical URL of the page
    pub url: String,

    /// When the page was scraped
    pub scraped_at: DateTime<Utc>,

    /// Depth at which the page was reached
    pub depth: u32,

    /// Page title
    pub title: String,

    /// Main textual content
    pub content: String,

    /// Headings found on the page, in document order
    pub headings: Vec<Heading>,

    /// Informational kind of the page (contact, about, terms, ...)
    pub page_kind: String,
}

/// A heading with its level
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Heading {
    /// Heading level, 1 through 6
    pub level: u8,

    /// Heading text
    pub text: String,
}

/// Run statistics persisted alongside the records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlStats {
    /// Number of records stored
    pub total_pages: usize,

    /// Stored record counts per page type
    pub page_types: BTreeMap<String, usize>,

    /// Number of pages fetched successfully
    pub pages_fetched: usize,

    /// Number of pages that failed to fetch after retries
    pub fetch_failures: usize,

    /// Unique product URLs discovered during the run
    pub discovered_product_urls: usize,

    /// Unique category URLs discovered during the run
    pub discovered_category_urls: usize,

    /// URLs marked visited during the run
    pub visited_urls: usize,

    /// Products resolved through category aggregation
    pub products_aggregated: usize,

    /// Orphaned products merged into a category
    pub orphans_merged: usize,

    /// Orphaned products dropped for lack of a parent category
    pub orphans_dropped: usize,

    /// When the run finished
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tag_roundtrip() {
        let record = PageRecord::Faq(FaqRecord {
            url: "https://example.com/faq/".to_string(),
            scraped_at: Utc::now(),
            depth: 1,
            title: "FAQ".to_string(),
            questions: vec![FaqEntry {
                question: "Q?".to_string(),
                answer: "A.".to_string(),
            }],
        });

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "faq");

        let back: PageRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind_name(), "faq");
        assert_eq!(back.url(), "https://example.com/faq/");
    }

    #[test]
    fn test_summary_into_record_keeps_listing_fields() {
        let summary = ProductSummary {
            name: "Trail 29".to_string(),
            price: "3999 zł".to_string(),
            url: "https://example.com/produkt/trail-29/".to_string(),
        };

        let record = summary.into_record("mtb", 2);
        assert_eq!(record.name, "Trail 29");
        assert_eq!(record.price, "3999 zł");
        assert_eq!(record.category_type, "mtb");
        assert_eq!(record.depth, 2);
        assert!(record.description.is_empty());
        assert!(record.colors.is_empty());
    }
}
