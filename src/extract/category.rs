//! Category-listing extraction
//!
//! Pulls the immediate product links (with their listing-snippet name and
//! approximate price), the category metadata, and the pagination bound off a
//! category page. Resolving the links into full product records is the
//! aggregator's job.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::crawler::CrawlerConfig;
use crate::crawler::records::{CategoryRecord, ProductSummary};
use crate::crawler::url_filter::{self, canonical_base};
use crate::extract::cascade::{self, SelectorCascade};

/// Pagination index anywhere in an href
static PAGE_NUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/page/(\d+)").expect("valid pagination regex"));

/// Listing-snippet price, e.g. "3 999 zł"
static SNIPPET_PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{3,}[\d\s.,]*zł").expect("valid price regex"));

/// The outcome of extracting one (non-paginated) category page
#[derive(Debug)]
pub struct CategoryExtraction {
    /// Category record with an empty product list
    pub record: CategoryRecord,

    /// Product links found on this page, unique by URL
    pub product_links: Vec<ProductSummary>,

    /// Highest pagination index referenced on the page (1 when unpaginated)
    pub max_page: u32,
}

/// Extract a category page into its record skeleton plus product links
pub fn extract_category(
    html: &str,
    url: &str,
    depth: u32,
    config: &CrawlerConfig,
) -> CategoryExtraction {
    let document = Html::parse_document(html);
    let base_url = canonical_base(url);

    let name = SelectorCascade::new(&[
        "h1.page-title, h1.woocommerce-products-header__title",
        ".category-title, .archive-title, .product-category-title",
        ".woocommerce-products-header h1",
        "h1",
    ])
    .first_text(&document)
    .unwrap_or_default();

    let description = SelectorCascade::new(&[
        ".woocommerce-products-header .term-description",
        ".category-description, .archive-description",
        ".taxonomy-description, .term-description",
    ])
    .first_text(&document)
    .unwrap_or_default();

    let product_links = match Url::parse(url) {
        Ok(page) => product_links(&document, &page, config),
        Err(_) => Vec::new(),
    };

    CategoryExtraction {
        record: CategoryRecord {
            url: base_url,
            scraped_at: Utc::now(),
            depth,
            name,
            description,
            category_type: category_type_from_url(url, config),
            products: Vec::new(),
            aggregated: false,
        },
        product_links,
        max_page: max_pagination_page(&document),
    }
}

/// Product links on a listing page with their snippet name and price
pub fn product_links(
    document: &Html,
    page_url: &Url,
    config: &CrawlerConfig,
) -> Vec<ProductSummary> {
    let marker_selector = format!(r#"a[href*="{}"]"#, config.product_path_marker);
    let selectors = [
        ".woocommerce-LoopProduct-link",
        marker_selector.as_str(),
        ".products .product a",
        ".product-list a, .product-grid a, .product-item a",
    ];
    let cascade = SelectorCascade::new(&selectors);

    let mut summaries: Vec<ProductSummary> = Vec::new();
    for link in cascade.select_all(document) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(url) = url_filter::normalize(href, page_url) else {
            continue;
        };
        if !url.contains(config.product_path_marker.as_str()) {
            continue;
        }
        if summaries.iter().any(|summary| summary.url == url) {
            continue;
        }

        let name = link
            .value()
            .attr("title")
            .map(|title| title.trim().to_string())
            .and_then(cascade::non_empty)
            .or_else(|| cascade::non_empty(cascade::element_text(link)))
            .unwrap_or_default();
        if name.is_empty() {
            continue;
        }

        let price = cascade::container_text(&link)
            .and_then(|text| SNIPPET_PRICE_RE.find(&text).map(|m| m.as_str().to_string()))
            .map(|price| price.split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();

        summaries.push(ProductSummary { name, price, url });
    }
    summaries
}

/// Highest `/page/N/` index linked from the page
///
/// Pagination bounds come only from links visible here; "load more"-style
/// pagination beyond static links stays undiscovered.
pub fn max_pagination_page(document: &Html) -> u32 {
    let Ok(anchor_sel) = Selector::parse("a[href]") else {
        return 1;
    };

    document
        .select(&anchor_sel)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| {
            PAGE_NUM_RE
                .captures(href)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok())
        })
        .max()
        .unwrap_or(1)
        .max(1)
}

/// Category type derived from the URL path
///
/// The segment after a category marker names the type (`/rowery/mtb/` →
/// "mtb"); a bare marker falls back to its own name, anything else to the
/// generic "other" bucket.
pub fn category_type_from_url(url: &str, config: &CrawlerConfig) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return "other".to_string();
    };
    let path = parsed.path();

    for marker in &config.category_path_markers {
        if let Some(rest) = path.split(marker.as_str()).nth(1) {
            let segment = rest
                .split('/')
                .find(|segment| !segment.is_empty() && *segment != "page");
            return match segment {
                Some(segment) => segment.to_string(),
                None => marker.trim_matches('/').to_string(),
            };
        }
    }

    "other".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CrawlerConfig {
        CrawlerConfig::builder()
            .base_url("https://www.tabou.pl")
            .build()
    }

    const CATEGORY_PAGE: &str = r#"<html><body>
        <h1 class="page-title">Rowery MTB</h1>
        <div class="term-description">Rowery górskie na każdy teren.</div>
        <div class="products">
            <div class="product">
                <a class="woocommerce-LoopProduct-link" href="/produkt/trail-29/">Trail 29</a>
                <span class="price">3 999 zł</span>
            </div>
            <div class="product">
                <a class="woocommerce-LoopProduct-link" href="/produkt/rock-27/"
                   title="Rock 27">zdjęcie</a>
                <span class="price">2 499 zł</span>
            </div>
            <div class="product">
                <a class="woocommerce-LoopProduct-link" href="/produkt/trail-29/">Trail 29 duplikat</a>
            </div>
        </div>
        <nav class="woocommerce-pagination">
            <a href="/rowery/mtb/page/2/">2</a>
            <a href="/rowery/mtb/page/3/">3</a>
            <a href="/rowery/mtb/page/2/">→</a>
        </nav>
    </body></html>"#;

    #[test]
    fn test_category_metadata() {
        let extraction = extract_category(
            CATEGORY_PAGE,
            "https://www.tabou.pl/rowery/mtb",
            1,
            &config(),
        );
        assert_eq!(extraction.record.url, "https://www.tabou.pl/rowery/mtb/");
        assert_eq!(extraction.record.name, "Rowery MTB");
        assert_eq!(
            extraction.record.description,
            "Rowery górskie na każdy teren."
        );
        assert_eq!(extraction.record.category_type, "mtb");
        assert!(!extraction.record.aggregated);
    }

    #[test]
    fn test_product_links_unique_with_snippet_data() {
        let extraction = extract_category(
            CATEGORY_PAGE,
            "https://www.tabou.pl/rowery/mtb/",
            1,
            &config(),
        );

        assert_eq!(extraction.product_links.len(), 2);
        let trail = &extraction.product_links[0];
        assert_eq!(trail.url, "https://www.tabou.pl/produkt/trail-29/");
        assert_eq!(trail.name, "Trail 29");
        assert_eq!(trail.price, "3 999 zł");

        let rock = &extraction.product_links[1];
        assert_eq!(rock.name, "Rock 27");
        assert_eq!(rock.price, "2 499 zł");
    }

    #[test]
    fn test_max_page_from_pagination_links() {
        let extraction = extract_category(
            CATEGORY_PAGE,
            "https://www.tabou.pl/rowery/mtb/",
            1,
            &config(),
        );
        assert_eq!(extraction.max_page, 3);
    }

    #[test]
    fn test_unpaginated_category_has_max_page_one() {
        let extraction = extract_category(
            "<html><body><h1>Gravel</h1></body></html>",
            "https://www.tabou.pl/rowery/gravel/",
            1,
            &config(),
        );
        assert_eq!(extraction.max_page, 1);
        assert!(extraction.product_links.is_empty());
    }

    #[test]
    fn test_category_type_from_url() {
        let config = config();
        assert_eq!(
            category_type_from_url("https://www.tabou.pl/rowery/mtb/", &config),
            "mtb"
        );
        assert_eq!(
            category_type_from_url("https://www.tabou.pl/rowery/mtb/page/2/", &config),
            "mtb"
        );
        assert_eq!(
            category_type_from_url("https://www.tabou.pl/rowery/", &config),
            "rowery"
        );
        assert_eq!(
            category_type_from_url("https://www.tabou.pl/produkt/trail-29/", &config),
            "other"
        );
    }
}
