//! Category aggregation and orphan reattachment
//!
//! A logical category reaches the store as exactly one record even though
//! the site serves it as N paginated documents and occasionally leaks
//! product pages outside any category context. Per category URL the flow is
//! DISCOVERED → FETCHING → EXTRACTED → (PAGINATION? → AGGREGATING → MERGED)
//! → STORED, and STORED is reached exactly once: the aggregated-set check
//! makes any later visit to the base or its `/page/N/` documents a no-op.

use std::time::Duration;

use futures::future;
use rand::Rng;
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::crawler::classify;
use crate::crawler::config::CrawlerConfig;
use crate::crawler::error::CrawlError;
use crate::crawler::fetcher::{FetchTier, Fetcher};
use crate::crawler::records::{CategoryRecord, ProductRecord};
use crate::crawler::state::CrawlState;
use crate::crawler::url_filter::{self, canonical_base};
use crate::extract::{self, CategoryExtraction};

/// Pause bounds between product-detail batches, milliseconds
const BATCH_PAUSE_MIN_MS: u64 = 60;
const BATCH_PAUSE_MAX_MS: u64 = 140;

/// What happened to a product reached outside category context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrphanOutcome {
    /// Merged into an existing category record
    Merged {
        /// Canonical base URL of the receiving category
        category_url: String,
    },

    /// No parent category and no fallback bucket: dropped with a logged skip
    Dropped,
}

/// Resolve a freshly extracted category into its final aggregated record
///
/// Fetches pagination pages 2..=max_page off the canonical base, dedups
/// product links across pages, resolves each link into a full product record
/// in bounded concurrent batches, and marks the base aggregated. A failed
/// pagination page is logged and skipped; the category still ends up
/// aggregated so the frontier never retries it.
#[instrument(skip(fetcher, state, extraction, config), fields(url = %extraction.record.url))]
pub async fn aggregate_category(
    fetcher: &Fetcher,
    state: &mut CrawlState,
    extraction: CategoryExtraction,
    config: &CrawlerConfig,
) -> CategoryRecord {
    let CategoryExtraction {
        mut record,
        mut product_links,
        max_page,
    } = extraction;
    let cap = config.category_product_cap;
    product_links.truncate(cap);

    if max_page > 1 {
        debug!("category {} spans {} pages", record.url, max_page);
    }
    for page in 2..=max_page {
        if product_links.len() >= cap {
            break;
        }
        let page_url = format!("{}page/{}/", record.url, page);
        match fetcher.get(&page_url, FetchTier::Listing).await {
            Ok(body) => {
                let more = {
                    let document = Html::parse_document(&body);
                    match Url::parse(&page_url) {
                        Ok(parsed) => extract::product_links(&document, &parsed, config),
                        Err(_) => Vec::new(),
                    }
                };
                for summary in more {
                    if product_links.len() >= cap {
                        break;
                    }
                    if !product_links.iter().any(|known| known.url == summary.url) {
                        product_links.push(summary);
                    }
                }
                state.frontier.mark_visited(&page_url);
            }
            Err(err) => {
                let err = CrawlError::Aggregation(format!("{}: {}", page_url, err));
                warn!("{}, continuing with whichever pages succeeded", err);
            }
        }
    }

    for summary in &product_links {
        state.discovered.record_product(&summary.url);
        state.frontier.mark_visited(&summary.url);
    }

    for batch in product_links.chunks(config.concurrency) {
        if record.products.len() >= cap {
            break;
        }

        let handles: Vec<_> = batch
            .iter()
            .cloned()
            .map(|summary| {
                let fetcher = fetcher.clone();
                let config = config.clone();
                let category_type = record.category_type.clone();
                let depth = record.depth + 1;
                tokio::spawn(async move {
                    let resolved = fetcher.get_unpaced(&summary.url, FetchTier::Product).await.map(
                        |body| {
                            let mut product =
                                extract::extract_product(&body, &summary.url, depth, &config);
                            product.category_type = category_type;
                            if product.name.is_empty() {
                                product.name = summary.name.clone();
                            }
                            if product.price.is_empty() {
                                product.price = summary.price.clone();
                            }
                            product
                        },
                    );
                    (summary, resolved)
                })
            })
            .collect();

        for joined in future::join_all(handles).await {
            let (summary, resolved) = match joined {
                Ok(result) => result,
                Err(err) => {
                    warn!("product-detail task failed to join: {}", err);
                    continue;
                }
            };
            let product = match resolved {
                Ok(product) => product,
                Err(err) => {
                    // keep the product with the listing-snippet fields rather
                    // than dropping it
                    warn!(
                        "product fetch {} failed ({}), keeping listing snippet",
                        summary.url, err
                    );
                    summary.into_record(&record.category_type, record.depth + 1)
                }
            };
            merge_product(&mut record, product, cap);
        }

        let pause =
            rand::thread_rng().gen_range(BATCH_PAUSE_MIN_MS..=BATCH_PAUSE_MAX_MS);
        tokio::time::sleep(Duration::from_millis(pause)).await;
    }

    record.aggregated = true;
    state.mark_aggregated(&record.url);
    state.stats.products_aggregated += record.products.len();
    record
}

/// Merge a product into a category, deduplicating by URL
///
/// An existing entry with the same URL only gains fields it is missing; a
/// new entry is appended while the per-category cap allows. Returns false
/// when the product was dropped by the cap.
pub fn merge_product(category: &mut CategoryRecord, product: ProductRecord, cap: usize) -> bool {
    if let Some(existing) = category
        .products
        .iter_mut()
        .find(|known| known.url == product.url)
    {
        fill_missing(existing, product);
        return true;
    }
    if category.products.len() >= cap {
        return false;
    }
    category.products.push(product);
    true
}

fn fill_missing(existing: &mut ProductRecord, incoming: ProductRecord) {
    if existing.name.is_empty() {
        existing.name = incoming.name;
    }
    if existing.price.is_empty() {
        existing.price = incoming.price;
    }
    if existing.availability.is_empty() || existing.availability == "unknown" {
        existing.availability = incoming.availability;
    }
    if existing.description.is_empty() {
        existing.description = incoming.description;
    }
    if existing.specifications.is_empty() {
        existing.specifications = incoming.specifications;
    }
    if existing.colors.is_empty() {
        existing.colors = incoming.colors;
    }
    if existing.images.is_empty() {
        existing.images = incoming.images;
    }
    if existing.sku.is_empty() {
        existing.sku = incoming.sku;
    }
}

/// Infer the parent category of a directly-reached product page
///
/// The first category-shaped link on the page (breadcrumb or navigation)
/// names the parent; pagination links do not count.
pub fn infer_parent_category(html: &str, page_url: &str, config: &CrawlerConfig) -> Option<String> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok()?;
    let anchor_sel = Selector::parse("a[href]").ok()?;

    for link in document.select(&anchor_sel) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(url) = url_filter::normalize(href, &base) else {
            continue;
        };
        let Ok(parsed) = Url::parse(&url) else {
            continue;
        };
        let path = parsed.path();
        let is_category = config
            .category_path_markers
            .iter()
            .any(|marker| path.contains(marker.as_str()));
        if is_category && classify::page_number(&url).is_none() {
            return Some(canonical_base(&url));
        }
    }
    None
}

/// Attach an orphaned product to its inferred parent, the fallback bucket,
/// or drop it
///
/// Deterministic rule: merge into the inferred parent when its record
/// exists, else into the generic bucket when one exists, else drop with a
/// logged skip.
pub fn attach_orphan(
    state: &mut CrawlState,
    product: ProductRecord,
    parent: Option<String>,
    cap: usize,
) -> OrphanOutcome {
    let target = parent
        .filter(|url| state.find_category_mut(url).is_some())
        .or_else(|| {
            state
                .find_fallback_bucket_mut()
                .map(|bucket| bucket.url.clone())
        });

    let Some(category_url) = target else {
        warn!(
            "no parent category inferable for orphaned product {}, dropping",
            product.url
        );
        state.stats.orphans_dropped += 1;
        return OrphanOutcome::Dropped;
    };

    let product_url = product.url.clone();
    let merged = match state.find_category_mut(&category_url) {
        Some(category) => merge_product(category, product, cap),
        None => false,
    };

    if merged {
        state.stats.orphans_merged += 1;
        OrphanOutcome::Merged { category_url }
    } else {
        warn!(
            "category {} is at its product cap, dropping orphaned product {}",
            category_url, product_url
        );
        state.stats.orphans_dropped += 1;
        OrphanOutcome::Dropped
    }
}
