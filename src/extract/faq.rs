//! FAQ-page extraction
//!
//! Structured FAQPage metadata wins when present; otherwise accordion-style
//! markup is tried, then plain definition lists.

use chrono::Utc;
use scraper::{ElementRef, Html, Selector};

use crate::crawler::records::{FaqEntry, FaqRecord};
use crate::extract::cascade::{self, SelectorCascade};
use crate::extract::json_ld;

/// Extract a FAQ record from a page
pub fn extract_faq(html: &str, url: &str, depth: u32) -> FaqRecord {
    let document = Html::parse_document(html);

    let title = SelectorCascade::new(&["h1", ".page-title", "title"])
        .first_text(&document)
        .unwrap_or_default();

    let mut questions: Vec<FaqEntry> = json_ld::faq(&document)
        .into_iter()
        .map(|(question, answer)| FaqEntry { question, answer })
        .collect();

    if questions.is_empty() {
        questions = accordion_entries(&document);
    }
    if questions.is_empty() {
        questions = definition_list_entries(&document);
    }

    FaqRecord {
        url: url.to_string(),
        scraped_at: Utc::now(),
        depth,
        title,
        questions,
    }
}

fn accordion_entries(document: &Html) -> Vec<FaqEntry> {
    let Ok(item_sel) = Selector::parse(".faq-item, .accordion-item, .qa-item") else {
        return Vec::new();
    };
    let question_sel = Selector::parse(".question, .faq-question, h3, h4");
    let answer_sel = Selector::parse(".answer, .faq-answer, .content, p");
    let (Ok(question_sel), Ok(answer_sel)) = (question_sel, answer_sel) else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for item in document.select(&item_sel) {
        let question = item
            .select(&question_sel)
            .next()
            .map(cascade::element_text)
            .and_then(cascade::non_empty);
        let answer = item
            .select(&answer_sel)
            .next()
            .map(cascade::element_text)
            .and_then(cascade::non_empty);
        if let (Some(question), Some(answer)) = (question, answer) {
            entries.push(FaqEntry { question, answer });
        }
    }
    entries
}

fn definition_list_entries(document: &Html) -> Vec<FaqEntry> {
    let Ok(dt_sel) = Selector::parse("dt") else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for dt in document.select(&dt_sel) {
        let question = cascade::non_empty(cascade::element_text(dt));
        let answer = dt
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|sibling| sibling.value().name() == "dd")
            .map(cascade::element_text)
            .and_then(cascade::non_empty);
        if let (Some(question), Some(answer)) = (question, answer) {
            entries.push(FaqEntry { question, answer });
        }
    }
    entries
}
