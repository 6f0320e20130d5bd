//! # storecrawl CLI
//!
//! Command-line interface for the crawl/aggregation pipeline:
//!
//! - `crawl`: run a budget-bounded crawl of a catalog site and persist the
//!   record and statistics artifacts
//! - `chunk`: turn a previously persisted records file into chunk records
//!   for the external embedding service
//!
//! Every budget option (`--depth`, `--max-pages`, `--concurrency`,
//! `--timeout`, `--category-cap`) bounds the corresponding crawl invariant;
//! the seed may be a URL or a page sitemap.

mod telemetry;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use storecrawl::crawler::{self, CrawlerConfig};
use storecrawl::processor::{self, ChunkOptions};
use telemetry::OtelGuard;
use tracing::instrument;

#[derive(Parser)]
#[command(author, version, about = "A crawler and aggregation pipeline for e-commerce catalog sites", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl a catalog site and save the extracted records
    Crawl(CrawlArgs),

    /// Chunk a saved records file for embedding
    Chunk(ChunkArgs),
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Site root URL to crawl
    #[arg(required = true)]
    url: String,

    /// Page sitemap URL used to pre-seed the frontier
    #[arg(long)]
    sitemap: Option<String>,

    /// Additional seed URLs (comma-separated)
    #[arg(long)]
    seeds: Option<String>,

    /// Crawl depth
    #[arg(short, long, default_value = "4")]
    depth: u32,

    /// Maximum number of records to store
    #[arg(short = 'p', long, default_value = "200")]
    max_pages: usize,

    /// Concurrent product-detail fetches per batch
    #[arg(short, long, default_value = "4")]
    concurrency: usize,

    /// Listing fetch timeout in milliseconds
    #[arg(short, long, default_value = "20000")]
    timeout: u64,

    /// Retries for retriable fetch failures
    #[arg(short, long, default_value = "2")]
    retries: u32,

    /// Politeness delay between requests in milliseconds
    #[arg(long, default_value = "500")]
    delay: u64,

    /// Hard cap on products collected per category
    #[arg(long, default_value = "100")]
    category_cap: usize,

    /// Output path for the records JSON array
    #[arg(short, long, default_value = "data/records.json")]
    output: PathBuf,

    /// Output path for the run statistics
    #[arg(long, default_value = "data/crawl_stats.json")]
    stats: PathBuf,
}

#[derive(Args, Debug)]
struct ChunkArgs {
    /// Records file produced by the crawl command
    #[arg(required = true)]
    records: PathBuf,

    /// Maximum chunk length in characters
    #[arg(short = 's', long, default_value = "1000")]
    chunk_size: usize,

    /// Overlap between adjacent chunks in characters
    #[arg(long, default_value = "100")]
    overlap: usize,

    /// Output path for the chunk records
    #[arg(short, long, default_value = "data/chunks.json")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _otel: Option<OtelGuard> = Some(telemetry::init_tracing_subscriber());

    match cli.command {
        Some(Commands::Crawl(args)) => {
            crawl_command(args).await?;
        }
        Some(Commands::Chunk(args)) => {
            chunk_command(args).await?;
        }
        None => {
            let _ = Cli::parse_from(["--help"]);
        }
    }

    Ok(())
}

#[instrument]
async fn crawl_command(args: CrawlArgs) -> anyhow::Result<()> {
    println!("Crawling {}...", args.url);

    let seed_urls = args
        .seeds
        .map(|seeds| seeds.split(',').map(str::trim).map(String::from).collect())
        .unwrap_or_default();

    let mut builder = CrawlerConfig::builder()
        .base_url(args.url)
        .seed_urls(seed_urls)
        .max_depth(args.depth)
        .max_pages(args.max_pages)
        .concurrency(args.concurrency)
        .timeout_ms(args.timeout)
        .retries(args.retries)
        .delay_ms(args.delay)
        .category_product_cap(args.category_cap);
    if let Some(sitemap) = args.sitemap {
        builder = builder.sitemap_url(sitemap);
    }
    let config = builder.build();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg} [{elapsed_precise}]")
            .expect("valid spinner template"),
    );
    spinner.set_message("crawling...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));

    let outcome = crawler::crawl_site(config).await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    println!("Crawled {} pages into {} records", outcome.stats.pages_fetched, outcome.records.len());
    for (kind, count) in &outcome.stats.page_types {
        println!("  {}: {}", kind, count);
    }
    if outcome.stats.fetch_failures > 0 {
        println!("  fetch failures: {}", outcome.stats.fetch_failures);
    }

    crawler::storage::write_records(&args.output, &outcome.records).await?;
    println!("Saved records to {}", args.output.display());
    crawler::storage::write_stats(&args.stats, &outcome.stats).await?;
    println!("Saved statistics to {}", args.stats.display());

    Ok(())
}

#[instrument]
async fn chunk_command(args: ChunkArgs) -> anyhow::Result<()> {
    println!("Loading records from {}...", args.records.display());
    let records = crawler::storage::load_records(&args.records).await?;
    println!("Loaded {} records", records.len());

    let options = ChunkOptions::new(args.chunk_size, args.overlap);
    let chunks = processor::process_records(&records, &options)?;
    println!("Prepared {} chunks", chunks.len());

    let json = serde_json::to_string_pretty(&chunks)?;
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(&args.output, json).await?;
    println!("Saved chunks to {}", args.output.display());

    Ok(())
}
