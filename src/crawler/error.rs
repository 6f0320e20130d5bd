//! Error types for the crawler module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Transport-level HTTP failure (timeout, reset, DNS)
    #[error("network error: {0}")]
    Network(reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP status {status} for {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// URL that produced the status
        url: String,
    },

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A pagination page failed during category aggregation
    #[error("aggregation error: {0}")]
    Aggregation(String),

    /// Sitemap could not be parsed
    #[error("sitemap error: {0}")]
    Sitemap(String),

    /// No seed or sitemap URL could be reached at startup
    #[error("seed unreachable: {0}")]
    SeedUnreachable(String),
}

impl CrawlError {
    /// Whether the failure class warrants a retry
    ///
    /// Transport errors (timeouts, connection resets, DNS failures) and 5xx
    /// statuses are retriable; 4xx statuses and everything else fail fast.
    pub fn is_retriable(&self) -> bool {
        match self {
            CrawlError::Network(_) => true,
            CrawlError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<CrawlError> for CrateError {
    fn from(err: CrawlError) -> Self {
        match err {
            CrawlError::Network(e) => CrateError::Http(e),
            CrawlError::UrlParse(e) => CrateError::Other(format!("URL parse error: {}", e)),
            _ => CrateError::Crawl(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_retriability_splits_on_500() {
        let server_side = CrawlError::Status {
            status: 503,
            url: "https://example.com/".to_string(),
        };
        let client_side = CrawlError::Status {
            status: 404,
            url: "https://example.com/missing".to_string(),
        };

        assert!(server_side.is_retriable());
        assert!(!client_side.is_retriable());
    }

    #[test]
    fn test_non_fetch_errors_are_not_retriable() {
        assert!(!CrawlError::Aggregation("page 2 failed".to_string()).is_retriable());
        assert!(!CrawlError::Sitemap("bad xml".to_string()).is_retriable());
    }
}
