//! General informational-page extraction

use chrono::Utc;
use scraper::{Html, Selector};

use crate::crawler::records::{GeneralRecord, Heading};
use crate::extract::cascade::{self, SelectorCascade};

/// Extract a general page: title, main content, headings
///
/// `page_kind` comes from classification (contact, about, terms, ...); the
/// extractor itself is the same for all of them.
pub fn extract_general(html: &str, url: &str, depth: u32, page_kind: &str) -> GeneralRecord {
    let document = Html::parse_document(html);

    let title = SelectorCascade::new(&["h1", ".page-title", "title"])
        .first_text(&document)
        .unwrap_or_default();

    let content = SelectorCascade::new(&[
        ".content, .main-content, .page-content",
        ".entry-content, .post-content",
        "main, article",
    ])
    .first_text(&document)
    .or_else(|| paragraphs_fallback(&document))
    .unwrap_or_default();

    GeneralRecord {
        url: url.to_string(),
        scraped_at: Utc::now(),
        depth,
        title,
        content,
        headings: extract_headings(&document),
        page_kind: page_kind.to_string(),
    }
}

/// When no main container matches, join the page's paragraphs
fn paragraphs_fallback(document: &Html) -> Option<String> {
    let paragraph_sel = Selector::parse("p").ok()?;
    let joined = document
        .select(&paragraph_sel)
        .map(cascade::element_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    cascade::non_empty(joined)
}

fn extract_headings(document: &Html) -> Vec<Heading> {
    let Ok(heading_sel) = Selector::parse("h1, h2, h3, h4, h5, h6") else {
        return Vec::new();
    };

    document
        .select(&heading_sel)
        .filter_map(|el| {
            let text = cascade::non_empty(cascade::element_text(el))?;
            let level = el.value().name().strip_prefix('h')?.parse().ok()?;
            Some(Heading { level, text })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_container_and_headings() {
        let html = r#"<html><body>
            <h1>O nas</h1>
            <div class="entry-content">
                <h2>Historia</h2>
                <p>Produkujemy rowery od 1995 roku.</p>
            </div>
        </body></html>"#;

        let record = extract_general(html, "https://www.tabou.pl/o-nas/", 1, "about");
        assert_eq!(record.title, "O nas");
        assert!(record.content.contains("od 1995 roku"));
        assert_eq!(record.page_kind, "about");
        assert_eq!(
            record.headings,
            vec![
                Heading {
                    level: 1,
                    text: "O nas".to_string()
                },
                Heading {
                    level: 2,
                    text: "Historia".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_paragraph_fallback_without_container() {
        let html = r#"<html><body>
            <p>Pierwszy akapit.</p>
            <p>Drugi akapit.</p>
        </body></html>"#;

        let record = extract_general(html, "https://www.tabou.pl/info/", 0, "general");
        assert_eq!(record.content, "Pierwszy akapit. Drugi akapit.");
    }
}
