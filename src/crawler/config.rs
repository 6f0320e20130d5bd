//! # Crawler Configuration Module
//!
//! This module provides configuration options for the crawler, including
//! crawl budgets, politeness controls, timeout tiers and the URL patterns
//! used to keep the crawl inside the catalog. It uses a builder pattern for
//! flexible configuration.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: The main configuration struct with crawler parameters
//! - `CrawlerConfigBuilder`: Builder pattern implementation for easier configuration
//!
//! ## Features
//!
//! - Default configurations suitable for polite crawling
//! - Fine-grained control over crawl behavior (depth, pages, rate limits)
//! - Allow/deny path lists and denied query keys for URL filtering
//! - Per-category product cap bounding aggregation
//! - User-agent customization

use std::time::Duration;

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Site root; also the default seed when no seed list is given
    pub base_url: String,

    /// Seed URLs enqueued at depth 0
    pub seed_urls: Vec<String>,

    /// Sitemap URL used to pre-seed the frontier, if any
    pub sitemap_url: Option<String>,

    /// Maximum depth to crawl
    pub max_depth: u32,

    /// Maximum number of records to store
    pub max_pages: usize,

    /// Batch size for concurrent product-detail fetches
    pub concurrency: usize,

    /// Retry count for retriable fetch failures
    pub retries: u32,

    /// Timeout in milliseconds for listing/category fetches
    pub timeout_ms: u64,

    /// Politeness delay in milliseconds between requests
    pub delay_ms: u64,

    /// Upper bound of the random jitter added to the politeness delay
    pub jitter_ms: u64,

    /// Hard cap on products collected per category
    pub category_product_cap: usize,

    /// Path fragments a URL must match to be crawled (site root always passes)
    pub allowed_paths: Vec<String>,

    /// Path or query fragments that exclude a URL from the crawl
    pub excluded_paths: Vec<String>,

    /// Path fragment identifying product pages
    pub product_path_marker: String,

    /// Path fragments identifying category pages
    pub category_path_markers: Vec<String>,

    /// User agent to use for requests
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            seed_urls: Vec::new(),
            sitemap_url: None,
            max_depth: 4,
            max_pages: 200,
            concurrency: 4,
            retries: 2,
            timeout_ms: 20_000,
            delay_ms: 500,
            jitter_ms: 300,
            category_product_cap: 100,
            allowed_paths: Vec::new(),
            excluded_paths: vec![
                "/konto/".to_string(),
                "/my-account/".to_string(),
                "/zamowienie/".to_string(),
                "/checkout/".to_string(),
                "/koszyk/".to_string(),
                "/cart/".to_string(),
                "/admin/".to_string(),
                "/wp-admin/".to_string(),
                "/wp-content/uploads/".to_string(),
                "/wp-json/".to_string(),
                "?lang=".to_string(),
                "?filtruj=".to_string(),
                "?archive=".to_string(),
                "?action=".to_string(),
            ],
            product_path_marker: "/produkt/".to_string(),
            category_path_markers: vec!["/rowery/".to_string(), "/kategoria/".to_string()],
            user_agent: format!("storecrawl/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Politeness delay as a Duration
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Politeness jitter upper bound as a Duration
    pub fn jitter(&self) -> Duration {
        Duration::from_millis(self.jitter_ms)
    }

    /// Timeout for listing/category fetches
    pub fn listing_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Timeout for product-detail fetches
    ///
    /// Product pages carry heavier payloads (galleries, variant data) than
    /// listings, so they get a quarter more headroom.
    pub fn product_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms + self.timeout_ms / 4)
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the site root URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Set the seed URLs
    pub fn seed_urls(mut self, seed_urls: Vec<String>) -> Self {
        self.config.seed_urls = seed_urls;
        self
    }

    /// Set the sitemap URL used for pre-seeding
    pub fn sitemap_url(mut self, sitemap_url: impl Into<String>) -> Self {
        self.config.sitemap_url = Some(sitemap_url.into());
        self
    }

    /// Set the maximum depth to crawl
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Set the maximum number of records to store
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    /// Set the product-detail fetch batch size
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency.max(1);
        self
    }

    /// Set the retry count for retriable fetch failures
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Set the listing fetch timeout in milliseconds
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.timeout_ms = timeout_ms;
        self
    }

    /// Set the politeness delay in milliseconds
    pub fn delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.delay_ms = delay_ms;
        self
    }

    /// Set the politeness jitter upper bound in milliseconds
    pub fn jitter_ms(mut self, jitter_ms: u64) -> Self {
        self.config.jitter_ms = jitter_ms;
        self
    }

    /// Set the per-category product cap
    pub fn category_product_cap(mut self, cap: usize) -> Self {
        self.config.category_product_cap = cap;
        self
    }

    /// Set the allowed path fragments
    pub fn allowed_paths(mut self, allowed_paths: Vec<String>) -> Self {
        self.config.allowed_paths = allowed_paths;
        self
    }

    /// Set the excluded path fragments
    pub fn excluded_paths(mut self, excluded_paths: Vec<String>) -> Self {
        self.config.excluded_paths = excluded_paths;
        self
    }

    /// Set the product path marker
    pub fn product_path_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.product_path_marker = marker.into();
        self
    }

    /// Set the category path markers
    pub fn category_path_markers(mut self, markers: Vec<String>) -> Self {
        self.config.category_path_markers = markers;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}
