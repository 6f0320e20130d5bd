//! # storecrawl - Catalog Crawler & Dataset Builder for Rust
//!
//! This crate crawls a target e-commerce/catalog website, extracts
//! structured records (products, categories, informational pages), and
//! assembles a deduplicated, budget-bounded dataset for downstream
//! indexing.
//!
//! ## Features
//!
//! - Deterministic breadth-first crawl with depth and page budgets
//! - Politeness-bounded fetching with retry, backoff and timeout tiers
//! - URL normalization and fail-closed scope filtering
//! - Selector-cascade extraction: JSON-LD > DOM selectors > text regex
//! - Category aggregation across pagination pages, with orphaned product
//!   reattachment
//! - Structure-aware text chunking for an external embedding service
//! - Async API with Tokio, structured tracing throughout
//!
//! ## Example
//!
//! ```rust,no_run
//! use storecrawl::crawler::{self, CrawlerConfig};
//! use storecrawl::processor::{self, ChunkOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CrawlerConfig::builder()
//!         .base_url("https://www.tabou.pl")
//!         .max_depth(3)
//!         .max_pages(100)
//!         .build();
//!
//!     let outcome = crawler::crawl_site(config).await?;
//!     let chunks = processor::process_records(&outcome.records, &ChunkOptions::default())?;
//!     println!("{} records, {} chunks", outcome.records.len(), chunks.len());
//!     Ok(())
//! }
//! ```

mod error;

pub mod crawler;
pub mod extract;
pub mod processor;

pub use error::Error;

/// Re-export of common types for public use
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::error::Result;
}
