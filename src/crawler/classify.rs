//! Page classification
//!
//! Maps a URL plus its fetched content to a [`PageKind`]. URL path patterns
//! are the primary signal; content heuristics (product-link density, price
//! markers) only kick in when the path is ambiguous. The site root is always
//! forced to a general "home" page so the pipeline treats it consistently.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::crawler::config::CrawlerConfig;

/// Pagination marker in a URL path, e.g. `/rowery/mtb/page/3/`
static PAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/page/(\d+)/?$").expect("valid pagination regex"));

/// A money amount as displayed in listings, e.g. "3 999 zł"
static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d\s]*zł").expect("valid amount regex"));

static PRICE_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcena\b").expect("valid price-word regex"));

/// Informational slug fragments and the page kind they map to
const INFO_SLUGS: &[(&str, &str)] = &[
    ("kontakt", "contact"),
    ("o-nas", "about"),
    ("zwroty", "returns"),
    ("reklamacje", "returns"),
    ("regulamin", "terms"),
    ("polityka-prywatnosci", "privacy"),
    ("gwarancja", "warranty"),
    ("formy-platnosci", "payment"),
    ("zakupy-na-raty", "payment"),
    ("jak-kupowac", "howto"),
    ("pliki-do-pobrania", "downloads"),
];

/// Classified kind of a fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKind {
    /// A single product page
    Product,

    /// A category listing (first, non-paginated page)
    Category,

    /// A pagination page of a category listing
    CategoryPage {
        /// 1-based page index from the URL
        page: u32,
    },

    /// A FAQ page
    Faq,

    /// Any other page, with its informational kind
    General(String),
}

/// Extract the pagination index from a URL, if present
pub fn page_number(url: &str) -> Option<u32> {
    PAGE_RE
        .captures(Url::parse(url).ok()?.path())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Strip a trailing `/page/N/` marker, yielding the canonical category base
pub fn strip_page_suffix(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => {
            let stripped = PAGE_RE.replace(parsed.path(), "/");
            let mut base = parsed.clone();
            base.set_path(&stripped);
            base.to_string()
        }
        Err(_) => url.to_string(),
    }
}

/// Classify a fetched page
pub fn classify(url: &str, html: &str, config: &CrawlerConfig) -> PageKind {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_default();

    // the home page is forced to one fixed type for pipeline consistency
    if path == "/" || path.is_empty() {
        return PageKind::General("home".to_string());
    }

    if path.contains(config.product_path_marker.as_str()) {
        return PageKind::Product;
    }

    if config
        .category_path_markers
        .iter()
        .any(|marker| path.contains(marker.as_str()))
    {
        return match page_number(url) {
            Some(page) => PageKind::CategoryPage { page },
            None => PageKind::Category,
        };
    }

    if path.contains("faq") || path.contains("czeste-pytania") {
        return PageKind::Faq;
    }

    for (slug, kind) in INFO_SLUGS {
        if path.contains(slug) {
            return PageKind::General((*kind).to_string());
        }
    }

    // URL gave nothing away; fall back to content heuristics
    let document = Html::parse_document(html);
    if product_link_count(&document, config) > 2 {
        return PageKind::Category;
    }
    let text: String = document.root_element().text().collect();
    if PRICE_WORD_RE.is_match(&text) && AMOUNT_RE.is_match(&text) {
        return PageKind::Product;
    }

    PageKind::General("general".to_string())
}

fn product_link_count(document: &Html, config: &CrawlerConfig) -> usize {
    let selector = format!(r#"a[href*="{}"]"#, config.product_path_marker);
    match Selector::parse(&selector) {
        Ok(selector) => document.select(&selector).count(),
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CrawlerConfig {
        CrawlerConfig::builder()
            .base_url("https://www.tabou.pl")
            .build()
    }

    #[test]
    fn test_url_markers_win_over_content() {
        let config = config();
        assert_eq!(
            classify("https://www.tabou.pl/produkt/trail-29/", "", &config),
            PageKind::Product
        );
        assert_eq!(
            classify("https://www.tabou.pl/rowery/mtb/", "", &config),
            PageKind::Category
        );
        assert_eq!(
            classify("https://www.tabou.pl/rowery/mtb/page/3/", "", &config),
            PageKind::CategoryPage { page: 3 }
        );
        assert_eq!(
            classify("https://www.tabou.pl/czeste-pytania-faq/", "", &config),
            PageKind::Faq
        );
        assert_eq!(
            classify("https://www.tabou.pl/kontakt/", "", &config),
            PageKind::General("contact".to_string())
        );
    }

    #[test]
    fn test_home_page_is_forced_general() {
        let html = r#"<a href="/produkt/a/"></a><a href="/produkt/b/"></a>
            <a href="/produkt/c/"></a><a href="/produkt/d/"></a>"#;
        assert_eq!(
            classify("https://www.tabou.pl/", html, &config()),
            PageKind::General("home".to_string())
        );
    }

    #[test]
    fn test_content_fallback_detects_listing_density() {
        let html = r#"<div class="products">
            <a href="/produkt/a/">A</a>
            <a href="/produkt/b/">B</a>
            <a href="/produkt/c/">C</a>
        </div>"#;
        assert_eq!(
            classify("https://www.tabou.pl/promocje/", html, &config()),
            PageKind::Category
        );
    }

    #[test]
    fn test_content_fallback_detects_price_marker() {
        let html = "<body><h1>Trail 29</h1><p>Cena 3999 zł</p></body>";
        assert_eq!(
            classify("https://www.tabou.pl/promocja-tygodnia/", html, &config()),
            PageKind::Product
        );
    }

    #[test]
    fn test_unremarkable_page_is_general() {
        let html = "<body><p>Just some text.</p></body>";
        assert_eq!(
            classify("https://www.tabou.pl/aktualnosci/", html, &config()),
            PageKind::General("general".to_string())
        );
    }

    #[test]
    fn test_page_suffix_helpers() {
        assert_eq!(
            page_number("https://www.tabou.pl/rowery/mtb/page/7/"),
            Some(7)
        );
        assert_eq!(page_number("https://www.tabou.pl/rowery/mtb/"), None);
        assert_eq!(
            strip_page_suffix("https://www.tabou.pl/rowery/mtb/page/7/"),
            "https://www.tabou.pl/rowery/mtb/"
        );
    }
}
