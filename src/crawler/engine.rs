//! The crawl orchestrator
//!
//! A single cooperative loop drives the whole run: dequeue one URL, fetch
//! it, classify, extract, aggregate when it is a category, store the record
//! and enqueue the page's links before the next dequeue. BFS order is
//! deterministic because nothing else touches the frontier; the only
//! concurrency is the aggregator's awaited product-detail batches.

use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::crawler::aggregator;
use crate::crawler::classify::{self, PageKind};
use crate::crawler::config::CrawlerConfig;
use crate::crawler::error::CrawlError;
use crate::crawler::fetcher::{FetchTier, Fetcher};
use crate::crawler::frontier::UrlTask;
use crate::crawler::records::{CrawlStats, PageRecord};
use crate::crawler::sitemap;
use crate::crawler::state::CrawlState;
use crate::crawler::url_filter::{self, canonical_base};
use crate::extract;

/// Result of a finished crawl run
#[derive(Debug)]
pub struct CrawlOutcome {
    /// Stored records, in storage order
    pub records: Vec<PageRecord>,

    /// Run statistics
    pub stats: CrawlStats,
}

/// Crawl a site into records and statistics
///
/// Terminates when the frontier empties or the stored-page budget is spent.
/// The only fatal error is an unreachable seed/sitemap: every per-page
/// failure is logged and skipped instead.
#[instrument(skip(config), fields(base_url = %config.base_url))]
pub async fn crawl_site(config: CrawlerConfig) -> Result<CrawlOutcome, CrawlError> {
    let base = Url::parse(&config.base_url)?;
    let fetcher = Fetcher::new(&config);
    let mut state = CrawlState::new(&config);

    let seeds = collect_seeds(&fetcher, &base, &config).await?;
    info!("starting crawl of {} with {} seeds", config.base_url, seeds.len());
    for seed in seeds {
        state.enqueue(UrlTask::new(seed, 0));
    }

    while let Some(task) = state.next_task() {
        if !url_filter::is_allowed(&task.url, &config) {
            debug!("skipping disallowed URL {}", task.url);
            continue;
        }

        // pagination pages of an aggregated base are idempotent no-ops,
        // skipped before they cost a fetch
        if classify::page_number(&task.url).is_some() {
            let base_url = canonical_base(&classify::strip_page_suffix(&task.url));
            if state.is_aggregated(&base_url) {
                debug!("{} belongs to aggregated {}, no-op", task.url, base_url);
                continue;
            }
        }

        let tier = if task.url.contains(config.product_path_marker.as_str()) {
            FetchTier::Product
        } else {
            FetchTier::Listing
        };
        let body = match fetcher.get(&task.url, tier).await {
            Ok(body) => {
                state.stats.pages_fetched += 1;
                body
            }
            Err(err) => {
                warn!("skipping {} after fetch failure: {}", task.url, err);
                state.stats.fetch_failures += 1;
                continue;
            }
        };

        let kind = classify::classify(&task.url, &body, &config);
        debug!("{} classified as {:?} at depth {}", task.url, kind, task.depth);

        match kind {
            PageKind::Product => {
                state.discovered.record_product(&task.url);
                let product = extract::extract_product(&body, &task.url, task.depth, &config);
                let parent = aggregator::infer_parent_category(&body, &task.url, &config);
                aggregator::attach_orphan(
                    &mut state,
                    product,
                    parent,
                    config.category_product_cap,
                );
            }
            PageKind::Category => {
                let base_url = canonical_base(&task.url);
                if state.is_aggregated(&base_url) {
                    debug!("category {} already aggregated, skipping", base_url);
                } else {
                    state.discovered.record_category(&task.url);
                    let extraction =
                        extract::extract_category(&body, &task.url, task.depth, &config);
                    let record =
                        aggregator::aggregate_category(&fetcher, &mut state, extraction, &config)
                            .await;
                    state.store_record(PageRecord::Category(record));
                }
            }
            PageKind::CategoryPage { page } => {
                // reached before its base was aggregated (the aggregated case
                // never gets this far); aggregation always starts from the
                // canonical base
                let base_url = canonical_base(&classify::strip_page_suffix(&task.url));
                debug!("pagination page {} reached before its base {}", page, base_url);
                state.enqueue(UrlTask::new(base_url, task.depth));
            }
            PageKind::Faq => {
                let record = extract::extract_faq(&body, &task.url, task.depth);
                state.store_record(PageRecord::Faq(record));
            }
            PageKind::General(page_kind) => {
                let record =
                    extract::extract_general(&body, &task.url, task.depth, &page_kind);
                state.store_record(PageRecord::General(record));
            }
        }

        for url in discover_links(&body, &task.url, &config, &mut state) {
            state.enqueue(UrlTask::new(url, task.depth + 1));
        }
    }

    if state.stats.pages_fetched == 0 {
        return Err(CrawlError::SeedUnreachable(config.base_url.clone()));
    }

    let (records, stats) = state.finish();
    info!(
        "crawl finished: {} records, {} fetched, {} failures",
        records.len(),
        stats.pages_fetched,
        stats.fetch_failures
    );
    Ok(CrawlOutcome { records, stats })
}

/// Assemble the seed list from the sitemap and/or configured seeds
///
/// An unreachable sitemap is fatal here; the fetch inside already went
/// through the normal retry policy.
async fn collect_seeds(
    fetcher: &Fetcher,
    base: &Url,
    config: &CrawlerConfig,
) -> Result<Vec<String>, CrawlError> {
    let mut seeds = Vec::new();

    if let Some(sitemap_url) = &config.sitemap_url {
        let from_sitemap = sitemap::fetch_seeds(fetcher, sitemap_url, config)
            .await
            .map_err(|err| {
                CrawlError::SeedUnreachable(format!("sitemap {}: {}", sitemap_url, err))
            })?;
        seeds.extend(from_sitemap);
    }

    for raw in &config.seed_urls {
        if let Some(url) = url_filter::normalize(raw, base) {
            if url_filter::is_allowed(&url, config) && !seeds.contains(&url) {
                seeds.push(url);
            }
        }
    }

    if seeds.is_empty() {
        seeds.push(base.to_string());
    }
    Ok(seeds)
}

/// Discover follow-up links on a fetched page
///
/// Normalizes every anchor, applies the allow/relevance filters, records
/// product/category discoveries, and returns the per-page-unique survivors.
fn discover_links(
    html: &str,
    page_url: &str,
    config: &CrawlerConfig,
    state: &mut CrawlState,
) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };
    let Ok(anchor_sel) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut links = Vec::new();
    for anchor in document.select(&anchor_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(url) = url_filter::normalize(href, &base) else {
            continue;
        };
        if links.contains(&url)
            || state.frontier.is_visited(&url)
            || !url_filter::is_allowed(&url, config)
            || !url_filter::is_relevant(&url, config, &state.discovered)
        {
            continue;
        }

        if url.contains(config.product_path_marker.as_str()) {
            state.discovered.record_product(&url);
        } else if config
            .category_path_markers
            .iter()
            .any(|marker| url.contains(marker.as_str()))
        {
            state.discovered.record_category(&url);
        }

        links.push(url);
    }

    if links.is_empty() {
        debug!("no new links on {}", page_url);
    } else {
        debug!("{} new links on {}", links.len(), page_url);
    }
    links
}
