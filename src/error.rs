//! Error types for the storecrawl crate

use thiserror::Error;

/// Result type for storecrawl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for storecrawl operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Web crawling error
    #[error("Crawl error: {0}")]
    Crawl(String),

    /// Content extraction error
    #[error("Extract error: {0}")]
    Extract(String),

    /// Content processing error
    #[error("Process error: {0}")]
    Process(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration or request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
