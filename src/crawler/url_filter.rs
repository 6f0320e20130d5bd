//! URL normalization and crawl-scope filtering
//!
//! Three pure predicates keep the frontier inside the catalog: `normalize`
//! canonicalizes raw links against their page, `is_allowed` fails closed on
//! anything outside the configured site scope, and `is_relevant` drops known
//! noise plus URLs whose kind has already been discovered. Only the
//! discovered-sets are consulted here, never mutated.

use std::collections::HashSet;

use url::Url;

use crate::crawler::config::CrawlerConfig;

/// Paths that never carry catalog content
const NOISE_PATHS: &[&str] = &[
    "/wp-admin/",
    "/wp-login",
    "/wp-content/uploads/",
    "/wp-json/",
    "/xmlrpc.php",
    "/feed/",
    "/rss/",
    "/sitemap",
    "/robots.txt",
    "/tag/",
    "/autor/",
    "/attachment/",
    "/search/",
    "/szukaj/",
    "/wyszukiwanie/",
    "/?s=",
];

/// Query keys that only carry tracking state
const TRACKING_KEYS: &[&str] = &[
    "utm_", "gclid", "fbclid", "_ga", "_gid", "ref", "source", "medium", "campaign", "term",
    "content", "hl", "gl",
];

/// Per-kind sets of already-discovered URLs
///
/// These exist purely to stop the frontier from re-growing through links the
/// crawl has already seen; fetch dedup is the visited set's job.
#[derive(Debug, Default)]
pub struct DiscoveredSets {
    products: HashSet<String>,
    categories: HashSet<String>,
}

impl DiscoveredSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a discovered product URL
    pub fn record_product(&mut self, url: &str) {
        self.products.insert(url.to_string());
    }

    /// Record a discovered category URL
    pub fn record_category(&mut self, url: &str) {
        self.categories.insert(url.to_string());
    }

    pub fn has_product(&self, url: &str) -> bool {
        self.products.contains(url)
    }

    pub fn has_category(&self, url: &str) -> bool {
        self.categories.contains(url)
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }
}

/// Resolve a raw link against its page and canonicalize it
///
/// Strips fragments and rejects non-HTTP schemes. Returns None on malformed
/// input; the caller skips the link.
pub fn normalize(raw: &str, base: &Url) -> Option<String> {
    let mut url = base.join(raw).ok()?;
    url.set_fragment(None);
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    Some(url.to_string())
}

/// Canonical base form of a category URL: trailing-slash normalized
pub fn canonical_base(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

/// Whether a URL is inside the configured crawl scope
///
/// Fails closed: cross-host URLs, excluded path/query fragments, and (when
/// an allow-list is configured) paths matching no allow-pattern are all
/// rejected. The site root always passes the allow-list.
pub fn is_allowed(url: &str, config: &CrawlerConfig) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Ok(base) = Url::parse(&config.base_url) else {
        return false;
    };

    if parsed.host_str() != base.host_str() {
        return false;
    }

    let full_path = match parsed.query() {
        Some(q) => format!("{}?{}", parsed.path(), q),
        None => parsed.path().to_string(),
    };
    if config
        .excluded_paths
        .iter()
        .any(|frag| full_path.contains(frag.as_str()))
    {
        return false;
    }

    if !config.allowed_paths.is_empty() {
        return parsed.path() == "/"
            || config
                .allowed_paths
                .iter()
                .any(|frag| parsed.path().contains(frag.as_str()));
    }

    true
}

/// Whether a URL is worth enqueueing at all
///
/// Filters tracking parameters, known-noise paths, the redundant first
/// pagination page, and product/category URLs the crawl has already
/// discovered through other pages.
pub fn is_relevant(url: &str, config: &CrawlerConfig, discovered: &DiscoveredSets) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    for (key, _) in parsed.query_pairs() {
        if TRACKING_KEYS.iter().any(|prefix| key.starts_with(prefix)) {
            return false;
        }
    }

    let path = parsed.path();
    if NOISE_PATHS.iter().any(|frag| path.contains(frag)) {
        return false;
    }

    // /page/1/ is the same document as the category base
    if path.ends_with("/page/1/") || path.ends_with("/page/1") {
        return false;
    }

    if path.contains(config.product_path_marker.as_str()) && discovered.has_product(url) {
        return false;
    }

    if config
        .category_path_markers
        .iter()
        .any(|marker| path.contains(marker.as_str()))
        && discovered.has_category(url)
    {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CrawlerConfig {
        CrawlerConfig::builder()
            .base_url("https://www.tabou.pl")
            .allowed_paths(vec!["/produkt/".to_string(), "/rowery/".to_string()])
            .build()
    }

    #[test]
    fn test_normalize_resolves_relative_links() {
        let base = Url::parse("https://www.tabou.pl/rowery/mtb/").unwrap();
        assert_eq!(
            normalize("../gravel/", &base).as_deref(),
            Some("https://www.tabou.pl/rowery/gravel/")
        );
        assert_eq!(
            normalize("/produkt/trail-29/", &base).as_deref(),
            Some("https://www.tabou.pl/produkt/trail-29/")
        );
    }

    #[test]
    fn test_normalize_strips_fragments_and_rejects_garbage() {
        let base = Url::parse("https://www.tabou.pl/").unwrap();
        assert_eq!(
            normalize("/rowery/mtb/#grid", &base).as_deref(),
            Some("https://www.tabou.pl/rowery/mtb/")
        );
        assert_eq!(normalize("mailto:shop@tabou.pl", &base), None);
        assert_eq!(normalize("javascript:void(0)", &base), None);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let base = Url::parse("https://www.tabou.pl/rowery/").unwrap();
        for raw in ["mtb/", "/produkt/x/?a=1", "https://www.tabou.pl/kontakt/"] {
            let once = normalize(raw, &base).unwrap();
            let twice = normalize(&once, &base).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_is_allowed_fails_closed_on_foreign_hosts() {
        let config = config();
        assert!(!is_allowed("https://evil.example.com/produkt/x/", &config));
        assert!(!is_allowed("not a url", &config));
    }

    #[test]
    fn test_is_allowed_respects_deny_and_allow_lists() {
        let config = config();
        assert!(is_allowed("https://www.tabou.pl/rowery/mtb/", &config));
        assert!(is_allowed("https://www.tabou.pl/", &config));
        assert!(!is_allowed("https://www.tabou.pl/koszyk/", &config));
        assert!(!is_allowed("https://www.tabou.pl/rowery/mtb/?lang=en", &config));
        assert!(!is_allowed("https://www.tabou.pl/blog/nowosci/", &config));
    }

    #[test]
    fn test_is_relevant_filters_noise_and_tracking() {
        let config = config();
        let discovered = DiscoveredSets::new();
        assert!(!is_relevant(
            "https://www.tabou.pl/rowery/mtb/?utm_source=mail",
            &config,
            &discovered
        ));
        assert!(!is_relevant(
            "https://www.tabou.pl/rowery/mtb/page/1/",
            &config,
            &discovered
        ));
        assert!(!is_relevant("https://www.tabou.pl/feed/", &config, &discovered));
        assert!(is_relevant(
            "https://www.tabou.pl/rowery/mtb/page/2/",
            &config,
            &discovered
        ));
    }

    #[test]
    fn test_is_relevant_short_circuits_discovered_urls() {
        let config = config();
        let mut discovered = DiscoveredSets::new();
        let product = "https://www.tabou.pl/produkt/trail-29/";
        assert!(is_relevant(product, &config, &discovered));

        discovered.record_product(product);
        assert!(!is_relevant(product, &config, &discovered));

        let category = "https://www.tabou.pl/rowery/mtb/";
        discovered.record_category(category);
        assert!(!is_relevant(category, &config, &discovered));
    }

    #[test]
    fn test_canonical_base_adds_trailing_slash() {
        assert_eq!(
            canonical_base("https://www.tabou.pl/rowery/mtb"),
            "https://www.tabou.pl/rowery/mtb/"
        );
        assert_eq!(
            canonical_base("https://www.tabou.pl/rowery/mtb/"),
            "https://www.tabou.pl/rowery/mtb/"
        );
    }
}
