//! Sitemap-based frontier seeding
//!
//! Parses a standard `<urlset>` sitemap and returns the contained page URLs
//! after running them through the crawl-scope filter. Nested sitemap indexes
//! are not followed; point the crawler at a concrete page sitemap.

use serde::Deserialize;
use url::Url;

use crate::crawler::config::CrawlerConfig;
use crate::crawler::error::CrawlError;
use crate::crawler::fetcher::{FetchTier, Fetcher};
use crate::crawler::url_filter;

#[derive(Debug, Deserialize)]
struct UrlSet {
    #[serde(rename = "url", default)]
    entries: Vec<UrlEntry>,
}

#[derive(Debug, Deserialize)]
struct UrlEntry {
    loc: String,
}

/// Fetch a sitemap and turn it into seed URLs
///
/// The fetch itself goes through the normal retry policy; a failure here is
/// fatal to the run and surfaces as `SeedUnreachable` from the engine.
pub async fn fetch_seeds(
    fetcher: &Fetcher,
    sitemap_url: &str,
    config: &CrawlerConfig,
) -> Result<Vec<String>, CrawlError> {
    let body = fetcher.get(sitemap_url, FetchTier::Listing).await?;
    parse_seeds(&body, config)
}

/// Parse sitemap XML into filtered, deduplicated seed URLs
pub fn parse_seeds(xml: &str, config: &CrawlerConfig) -> Result<Vec<String>, CrawlError> {
    let url_set: UrlSet =
        quick_xml::de::from_str(xml).map_err(|e| CrawlError::Sitemap(e.to_string()))?;

    let base = Url::parse(&config.base_url)?;
    let mut seen = std::collections::HashSet::new();
    let mut seeds = Vec::new();
    for entry in url_set.entries {
        let Some(url) = url_filter::normalize(entry.loc.trim(), &base) else {
            continue;
        };
        if url_filter::is_allowed(&url, config) && seen.insert(url.clone()) {
            seeds.push(url);
        }
    }
    Ok(seeds)
}
