//! Record-to-chunk processing
//!
//! This module renders each stored [`PageRecord`] into one normalized text,
//! deduplicates identical texts by content hash, and splits them into
//! overlapping chunks. The resulting [`ChunkRecord`]s are the crate's output
//! contract towards the external embedding collaborator; nothing here calls
//! that service.

mod chunking;
mod config;
mod error;

pub use chunking::{TextChunk, chunk_text};
pub use config::ChunkOptions;
pub use error::ProcessError;

use std::collections::HashSet;
use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::crawler::records::PageRecord;

/// A chunk ready for the embedding collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Stable chunk id: `<source_id>#<chunk_index>`
    pub id: String,

    /// Identifier of the source record (its canonical URL)
    pub source_id: String,

    /// 0-based position of the chunk within its source
    pub chunk_index: usize,

    /// Number of chunks the source was split into
    pub total_chunks: usize,

    /// The chunk text
    pub text: String,

    /// Metadata describing the source record
    pub metadata: ChunkMetadata,
}

/// Metadata carried by every chunk of a record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// URL of the source page
    pub url: String,

    /// Record type tag (product, category, faq, general)
    pub record_type: String,

    /// Title or name of the source record
    pub title: String,

    /// Crawl depth of the source page
    pub depth: u32,

    /// Price, for product records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    /// Availability, for product records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
}

/// Process records into deduplicated, chunked output
#[instrument(skip(records, options))]
pub fn process_records(
    records: &[PageRecord],
    options: &ChunkOptions,
) -> Result<Vec<ChunkRecord>, ProcessError> {
    let mut seen = HashSet::new();
    let mut output = Vec::new();

    for record in records {
        let text = compose_text(record);
        if text.trim().is_empty() {
            continue;
        }

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        if !seen.insert(hasher.finish()) {
            debug!("skipping duplicate content from {}", record.url());
            continue;
        }

        let chunks = chunk_text(&text, options)?;
        let total_chunks = chunks.len();
        let metadata = metadata_for(record);
        for chunk in chunks {
            output.push(ChunkRecord {
                id: format!("{}#{}", record.url(), chunk.index),
                source_id: record.url().to_string(),
                chunk_index: chunk.index,
                total_chunks,
                text: chunk.text,
                metadata: metadata.clone(),
            });
        }
    }

    Ok(output)
}

/// Render a record into one normalized text for chunking and embedding
pub fn compose_text(record: &PageRecord) -> String {
    match record {
        PageRecord::Product(product) => {
            let mut lines = vec![
                format!("Product: {}", product.name),
                format!("Price: {}", product.price),
                format!("Availability: {}", product.availability),
            ];
            if !product.description.is_empty() {
                lines.push(format!("Description: {}", product.description));
            }
            for (section, entries) in &product.specifications {
                let rendered = entries
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value))
                    .collect::<Vec<_>>()
                    .join("; ");
                lines.push(format!("{}: {}", section, rendered));
            }
            if !product.colors.is_empty() {
                let rendered = product
                    .colors
                    .iter()
                    .map(|color| {
                        if color.sizes.is_empty() {
                            color.name.clone()
                        } else {
                            let sizes = color
                                .sizes
                                .iter()
                                .map(|size| {
                                    let state = if size.available {
                                        "available"
                                    } else {
                                        "unavailable"
                                    };
                                    format!("{} - {}", size.size, state)
                                })
                                .collect::<Vec<_>>()
                                .join(", ");
                            format!("{} [{}]", color.name, sizes)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                lines.push(format!("Colors: {}", rendered));
            }
            if !product.sku.is_empty() {
                lines.push(format!("SKU: {}", product.sku));
            }
            lines.push(format!("Category: {}", product.category_type));
            lines.join("\n")
        }
        PageRecord::Category(category) => {
            let mut lines = vec![format!("Category: {}", category.name)];
            if !category.description.is_empty() {
                lines.push(format!("Description: {}", category.description));
            }
            let products = category
                .products
                .iter()
                .map(|product| {
                    if product.price.is_empty() {
                        product.name.clone()
                    } else {
                        format!("{} - {}", product.name, product.price)
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("Products: {}", products));
            lines.join("\n")
        }
        PageRecord::Faq(faq) => faq
            .questions
            .iter()
            .map(|entry| format!("Q: {}\nA: {}", entry.question, entry.answer))
            .collect::<Vec<_>>()
            .join("\n\n"),
        PageRecord::General(page) => {
            let mut text = format!("{}\n\n{}", page.title, page.content);
            if !page.headings.is_empty() {
                let headings = page
                    .headings
                    .iter()
                    .map(|heading| format!("## {}", heading.text))
                    .collect::<Vec<_>>()
                    .join("\n");
                text.push_str("\n\n");
                text.push_str(&headings);
            }
            text
        }
    }
}

fn metadata_for(record: &PageRecord) -> ChunkMetadata {
    match record {
        PageRecord::Product(product) => ChunkMetadata {
            url: product.url.clone(),
            record_type: "product".to_string(),
            title: product.name.clone(),
            depth: product.depth,
            price: Some(product.price.clone()),
            availability: Some(product.availability.clone()),
        },
        PageRecord::Category(category) => ChunkMetadata {
            url: category.url.clone(),
            record_type: "category".to_string(),
            title: category.name.clone(),
            depth: category.depth,
            price: None,
            availability: None,
        },
        PageRecord::Faq(faq) => ChunkMetadata {
            url: faq.url.clone(),
            record_type: "faq".to_string(),
            title: faq.title.clone(),
            depth: faq.depth,
            price: None,
            availability: None,
        },
        PageRecord::General(page) => ChunkMetadata {
            url: page.url.clone(),
            record_type: "general".to_string(),
            title: page.title.clone(),
            depth: page.depth,
            price: None,
            availability: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::records::{
        CategoryRecord, ColorVariant, FaqEntry, FaqRecord, GeneralRecord, ProductRecord,
        SizeOption,
    };
    use chrono::Utc;

    fn product() -> ProductRecord {
        ProductRecord {
            url: "https://example.com/produkt/trail-29/".to_string(),
            scraped_at: Utc::now(),
            depth: 2,
            name: "Trail 29".to_string(),
            price: "3 999 zł".to_string(),
            availability: "in stock".to_string(),
            description: "Lekki rower górski.".to_string(),
            colors: vec![ColorVariant {
                name: "black / gold".to_string(),
                sizes: vec![
                    SizeOption {
                        size: "48 cm".to_string(),
                        available: true,
                    },
                    SizeOption {
                        size: "53 cm".to_string(),
                        available: false,
                    },
                ],
            }],
            category_type: "mtb".to_string(),
            ..ProductRecord::default()
        }
    }

    #[test]
    fn test_product_text_carries_variants() {
        let text = compose_text(&PageRecord::Product(product()));
        assert!(text.contains("Product: Trail 29"));
        assert!(text.contains("Price: 3 999 zł"));
        assert!(text.contains("black / gold [48 cm - available, 53 cm - unavailable]"));
    }

    #[test]
    fn test_category_text_lists_products() {
        let category = CategoryRecord {
            url: "https://example.com/rowery/mtb/".to_string(),
            scraped_at: Utc::now(),
            depth: 1,
            name: "Rowery MTB".to_string(),
            description: "Górskie".to_string(),
            category_type: "mtb".to_string(),
            products: vec![product()],
            aggregated: true,
        };
        let text = compose_text(&PageRecord::Category(category));
        assert!(text.contains("Category: Rowery MTB"));
        assert!(text.contains("Trail 29 - 3 999 zł"));
    }

    #[test]
    fn test_faq_text_renders_pairs() {
        let faq = FaqRecord {
            url: "https://example.com/faq/".to_string(),
            scraped_at: Utc::now(),
            depth: 1,
            title: "FAQ".to_string(),
            questions: vec![FaqEntry {
                question: "Jak długo trwa dostawa?".to_string(),
                answer: "Dwa dni.".to_string(),
            }],
        };
        let text = compose_text(&PageRecord::Faq(faq));
        assert_eq!(text, "Q: Jak długo trwa dostawa?\nA: Dwa dni.");
    }

    #[test]
    fn test_process_dedups_identical_content() {
        let page = |url: &str| {
            PageRecord::General(GeneralRecord {
                url: url.to_string(),
                scraped_at: Utc::now(),
                depth: 0,
                title: "Regulamin".to_string(),
                content: "Identyczna treść strony.".to_string(),
                headings: Vec::new(),
                page_kind: "terms".to_string(),
            })
        };
        let records = vec![page("https://example.com/a/"), page("https://example.com/b/")];

        let chunks = process_records(&records, &ChunkOptions::default()).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source_id, "https://example.com/a/");
    }

    #[test]
    fn test_chunk_ids_and_totals_are_stable() {
        let long_content = "Zdanie opisujące sklep. ".repeat(200);
        let record = PageRecord::General(GeneralRecord {
            url: "https://example.com/o-nas/".to_string(),
            scraped_at: Utc::now(),
            depth: 1,
            title: "O nas".to_string(),
            content: long_content,
            headings: Vec::new(),
            page_kind: "about".to_string(),
        });

        let chunks = process_records(&[record], &ChunkOptions::new(400, 40)).unwrap();
        assert!(chunks.len() > 1);
        let total = chunks.len();
        for (index, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, index);
            assert_eq!(chunk.total_chunks, total);
            assert_eq!(
                chunk.id,
                format!("https://example.com/o-nas/#{}", index)
            );
            assert_eq!(chunk.metadata.record_type, "general");
        }
    }

    #[test]
    fn test_product_metadata_carries_price() {
        let chunks =
            process_records(&[PageRecord::Product(product())], &ChunkOptions::default()).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.price.as_deref(), Some("3 999 zł"));
        assert_eq!(chunks[0].metadata.availability.as_deref(), Some("in stock"));
    }
}
