use std::io;
use std::path::Path;

use tokio::fs;

use crate::crawler::records::{CrawlStats, PageRecord};

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StorageError> for crate::error::Error {
    fn from(err: StorageError) -> Self {
        crate::error::Error::Storage(err.to_string())
    }
}

type Result<T> = std::result::Result<T, StorageError>;

/// Write the record list as a pretty-printed JSON array
pub async fn write_records(path: impl AsRef<Path>, records: &[PageRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    ensure_parent(path.as_ref()).await?;
    fs::write(path, json).await?;
    Ok(())
}

/// Write the companion run-statistics object
pub async fn write_stats(path: impl AsRef<Path>, stats: &CrawlStats) -> Result<()> {
    let json = serde_json::to_string_pretty(stats)?;
    ensure_parent(path.as_ref()).await?;
    fs::write(path, json).await?;
    Ok(())
}

/// Load a records file back, e.g. for chunking a previous crawl
pub async fn load_records(path: impl AsRef<Path>) -> Result<Vec<PageRecord>> {
    let content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

async fn ensure_parent(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::records::GeneralRecord;
    use chrono::Utc;

    fn sample_records() -> Vec<PageRecord> {
        vec![PageRecord::General(GeneralRecord {
            url: "https://example.com/o-nas/".to_string(),
            scraped_at: Utc::now(),
            depth: 1,
            title: "O nas".to_string(),
            content: "Treść strony.".to_string(),
            headings: Vec::new(),
            page_kind: "about".to_string(),
        })]
    }

    #[tokio::test]
    async fn test_records_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("records.json");

        write_records(&path, &sample_records()).await.unwrap();
        let loaded = load_records(&path).await.unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].url(), "https://example.com/o-nas/");
        assert_eq!(loaded[0].kind_name(), "general");
    }

    #[tokio::test]
    async fn test_stats_written_as_json_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");

        let mut stats = CrawlStats::default();
        stats.total_pages = 7;
        write_stats(&path, &stats).await.unwrap();

        let raw = fs::read_to_string(&path).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["total_pages"], 7);
    }

    #[tokio::test]
    async fn test_load_missing_file_errors() {
        let result = load_records("/nonexistent/records.json").await;
        assert!(matches!(result, Err(StorageError::Io(_))));
    }
}
