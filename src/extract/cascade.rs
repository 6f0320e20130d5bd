//! Selector-cascade machinery
//!
//! Extraction fields are driven by ordered lists of CSS selectors: the most
//! specific structural selector is tried first, falling through increasingly
//! generic alternatives. The first selector yielding a non-empty value wins.
//! Regex fallbacks against raw text sit behind these in the individual
//! extractors, combined with `Option::or_else` chains.

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// An ordered list of selectors tried until one produces a value
pub struct SelectorCascade {
    selectors: Vec<Selector>,
}

impl SelectorCascade {
    /// Build a cascade, skipping (and logging) any unparsable selector
    pub fn new(selectors: &[&str]) -> Self {
        let selectors = selectors
            .iter()
            .filter_map(|raw| match Selector::parse(raw) {
                Ok(selector) => Some(selector),
                Err(e) => {
                    warn!("skipping unparsable selector '{}': {}", raw, e);
                    None
                }
            })
            .collect();
        Self { selectors }
    }

    /// First non-empty text content matched by the cascade
    pub fn first_text(&self, document: &Html) -> Option<String> {
        self.selectors.iter().find_map(|selector| {
            document
                .select(selector)
                .next()
                .map(element_text)
                .and_then(non_empty)
        })
    }

    /// First non-empty value of an attribute matched by the cascade
    pub fn first_attr(&self, document: &Html, attr: &str) -> Option<String> {
        self.selectors.iter().find_map(|selector| {
            document
                .select(selector)
                .next()
                .and_then(|el| el.value().attr(attr))
                .map(|value| value.trim().to_string())
                .and_then(non_empty)
        })
    }

    /// All elements matched by any selector in cascade order
    pub fn select_all<'a>(&'a self, document: &'a Html) -> impl Iterator<Item = ElementRef<'a>> {
        self.selectors
            .iter()
            .flat_map(|selector| document.select(selector))
    }

    /// Elements of the first selector that matches anything at all
    pub fn first_matching<'a>(&'a self, document: &'a Html) -> Vec<ElementRef<'a>> {
        for selector in &self.selectors {
            let matched: Vec<_> = document.select(selector).collect();
            if !matched.is_empty() {
                return matched;
            }
        }
        Vec::new()
    }
}

/// Whitespace-collapsed text content of an element
pub fn element_text(element: ElementRef) -> String {
    let raw: String = element.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Treat whitespace-only strings as absent
pub fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Text of the nearest block-level ancestor, for listing-snippet lookups
pub fn container_text(element: &ElementRef) -> Option<String> {
    let mut node = element.parent();
    while let Some(n) = node {
        if let Some(el) = ElementRef::wrap(n) {
            let name = el.value().name();
            if matches!(name, "div" | "li" | "article" | "section") {
                return Some(element_text(el));
            }
        }
        node = n.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_specific_selector_wins() {
        let html = Html::parse_document(
            r#"<h1 class="product_title">Specific name</h1><h1>Generic name</h1>"#,
        );
        let cascade = SelectorCascade::new(&["h1.product_title", "h1"]);
        assert_eq!(cascade.first_text(&html).as_deref(), Some("Specific name"));
    }

    #[test]
    fn test_falls_through_empty_matches() {
        let html = Html::parse_document(r#"<h1 class="product_title">   </h1><h1>Fallback</h1>"#);
        let cascade = SelectorCascade::new(&["h1.product_title", "h1"]);
        assert_eq!(cascade.first_text(&html).as_deref(), Some("Fallback"));
    }

    #[test]
    fn test_invalid_selectors_are_skipped() {
        let html = Html::parse_document("<p>text</p>");
        let cascade = SelectorCascade::new(&["p:::broken", "p"]);
        assert_eq!(cascade.first_text(&html).as_deref(), Some("text"));
    }

    #[test]
    fn test_container_text_reaches_listing_tile() {
        let html = Html::parse_document(
            r#"<div class="product"><a href="/produkt/x/">Trail</a><span>3999 zł</span></div>"#,
        );
        let selector = Selector::parse("a").unwrap();
        let link = html.select(&selector).next().unwrap();
        let text = container_text(&link).unwrap();
        assert!(text.contains("3999 zł"));
    }

    #[test]
    fn test_non_empty_rejects_whitespace() {
        assert_eq!(non_empty("  ".to_string()), None);
        assert_eq!(non_empty(" x ".to_string()).as_deref(), Some("x"));
    }
}
