//! Shared crawl-run state
//!
//! All mutable sets of a run live in one [`CrawlState`] owned by the engine,
//! so several independent crawls can coexist in a process without
//! cross-talk. Only the orchestrating loop (or an awaited aggregation batch)
//! ever touches this.

use std::collections::HashSet;

use crate::crawler::config::CrawlerConfig;
use crate::crawler::frontier::{Frontier, UrlTask};
use crate::crawler::records::{CategoryRecord, CrawlStats, PageRecord};
use crate::crawler::url_filter::DiscoveredSets;

/// Category type of the generic bucket that collects unattributable orphans
pub const FALLBACK_CATEGORY_TYPE: &str = "other";

/// Mutable state of a single crawl run
#[derive(Debug)]
pub struct CrawlState {
    /// BFS queue plus visited set
    pub frontier: Frontier,

    /// Per-kind discovery sets consulted by the relevance filter
    pub discovered: DiscoveredSets,

    /// Run statistics, finalized by the engine
    pub stats: CrawlStats,

    aggregated: HashSet<String>,
    records: Vec<PageRecord>,
    max_pages: usize,
    max_depth: u32,
}

impl CrawlState {
    pub fn new(config: &CrawlerConfig) -> Self {
        Self {
            frontier: Frontier::new(),
            discovered: DiscoveredSets::new(),
            stats: CrawlStats::default(),
            aggregated: HashSet::new(),
            records: Vec::new(),
            max_pages: config.max_pages,
            max_depth: config.max_depth,
        }
    }

    /// Whether the stored-page budget is exhausted
    pub fn at_capacity(&self) -> bool {
        self.records.len() >= self.max_pages
    }

    /// Enqueue a task, applying the depth and stored-page budgets
    pub fn enqueue(&mut self, task: UrlTask) -> bool {
        if self.at_capacity() {
            return false;
        }
        self.frontier.enqueue(task, self.max_depth)
    }

    /// Pop the next task, or None when the queue is empty or the budget is spent
    ///
    /// Budget counters are checked here, at loop entry; remaining frontier
    /// entries are simply discarded at run end.
    pub fn next_task(&mut self) -> Option<UrlTask> {
        if self.at_capacity() {
            return None;
        }
        self.frontier.dequeue()
    }

    /// Store a record, honoring the stored-page budget
    pub fn store_record(&mut self, record: PageRecord) -> bool {
        if self.at_capacity() {
            return false;
        }
        *self
            .stats
            .page_types
            .entry(record.kind_name().to_string())
            .or_insert(0) += 1;
        self.records.push(record);
        true
    }

    /// Whether a category base URL has been fully paginated already
    pub fn is_aggregated(&self, base_url: &str) -> bool {
        self.aggregated.contains(base_url)
    }

    /// Mark a category base URL as fully paginated
    pub fn mark_aggregated(&mut self, base_url: &str) {
        self.aggregated.insert(base_url.to_string());
    }

    /// Find a stored category record by canonical base URL
    pub fn find_category_mut(&mut self, base_url: &str) -> Option<&mut CategoryRecord> {
        self.records.iter_mut().find_map(|record| match record {
            PageRecord::Category(category) if category.url == base_url => Some(category),
            _ => None,
        })
    }

    /// Find the generic bucket category, if one was stored during the run
    pub fn find_fallback_bucket_mut(&mut self) -> Option<&mut CategoryRecord> {
        self.records.iter_mut().find_map(|record| match record {
            PageRecord::Category(category)
                if category.category_type == FALLBACK_CATEGORY_TYPE =>
            {
                Some(category)
            }
            _ => None,
        })
    }

    pub fn records(&self) -> &[PageRecord] {
        &self.records
    }

    /// Finalize statistics and hand over the record list
    pub fn finish(mut self) -> (Vec<PageRecord>, CrawlStats) {
        self.stats.total_pages = self.records.len();
        self.stats.discovered_product_urls = self.discovered.product_count();
        self.stats.discovered_category_urls = self.discovered.category_count();
        self.stats.visited_urls = self.frontier.visited_count();
        self.stats.finished_at = Some(chrono::Utc::now());
        (self.records, self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::records::GeneralRecord;
    use chrono::Utc;

    fn general(url: &str) -> PageRecord {
        PageRecord::General(GeneralRecord {
            url: url.to_string(),
            scraped_at: Utc::now(),
            depth: 0,
            title: String::new(),
            content: String::new(),
            headings: Vec::new(),
            page_kind: "general".to_string(),
        })
    }

    #[test]
    fn test_stored_page_budget_is_hard() {
        let config = CrawlerConfig::builder().max_pages(2).build();
        let mut state = CrawlState::new(&config);

        assert!(state.store_record(general("https://a.example/1")));
        assert!(state.store_record(general("https://a.example/2")));
        assert!(!state.store_record(general("https://a.example/3")));
        assert_eq!(state.records().len(), 2);

        // a full budget also stops the frontier
        state.frontier.enqueue(UrlTask::new("https://a.example/4", 0), 4);
        assert!(state.next_task().is_none());
    }

    #[test]
    fn test_budget_blocks_enqueue_at_capacity() {
        let config = CrawlerConfig::builder().max_pages(1).build();
        let mut state = CrawlState::new(&config);
        state.store_record(general("https://a.example/1"));
        assert!(!state.enqueue(UrlTask::new("https://a.example/2", 0)));
    }

    #[test]
    fn test_aggregated_set_round_trip() {
        let config = CrawlerConfig::default();
        let mut state = CrawlState::new(&config);
        let base = "https://a.example/rowery/mtb/";

        assert!(!state.is_aggregated(base));
        state.mark_aggregated(base);
        assert!(state.is_aggregated(base));
    }

    #[test]
    fn test_finish_fills_stats() {
        let config = CrawlerConfig::default();
        let mut state = CrawlState::new(&config);
        state.store_record(general("https://a.example/about/"));
        state.discovered.record_product("https://a.example/produkt/x/");

        let (records, stats) = state.finish();
        assert_eq!(records.len(), 1);
        assert_eq!(stats.total_pages, 1);
        assert_eq!(stats.page_types.get("general"), Some(&1));
        assert_eq!(stats.discovered_product_urls, 1);
        assert!(stats.finished_at.is_some());
    }
}
