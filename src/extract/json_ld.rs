//! Structured-data extraction from schema.org JSON-LD blocks
//!
//! Embedded `application/ld+json` metadata outranks DOM selectors in the
//! extraction priority order, so these helpers are consulted first for
//! product offers and FAQ content. Malformed blocks are silently ignored;
//! the page itself is untrusted input.

use scraper::{Html, Selector};
use serde_json::Value;

/// Product facts found in structured metadata
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LdProduct {
    pub name: Option<String>,
    pub price: Option<String>,
    pub availability: Option<String>,
    pub sku: Option<String>,
}

/// Collect every JSON-LD item on the page, flattening arrays and @graph
pub fn items(document: &Html) -> Vec<Value> {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };

    let mut items = Vec::new();
    for script in document.select(&selector) {
        let raw: String = script.text().collect();
        let Ok(value) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };
        flatten_into(value, &mut items);
    }
    items
}

fn flatten_into(value: Value, items: &mut Vec<Value>) {
    match value {
        Value::Array(entries) => {
            for entry in entries {
                flatten_into(entry, items);
            }
        }
        Value::Object(_) => {
            if let Some(graph) = value.get("@graph").and_then(Value::as_array) {
                for entry in graph.clone() {
                    flatten_into(entry, items);
                }
            }
            items.push(value);
        }
        _ => {}
    }
}

/// Extract product facts from the first schema.org Product item
pub fn product(document: &Html) -> Option<LdProduct> {
    let item = items(document)
        .into_iter()
        .find(|item| item_type(item) == Some("Product"))?;

    let mut product = LdProduct {
        name: string_field(&item, "name"),
        sku: string_field(&item, "sku"),
        ..LdProduct::default()
    };

    if let Some(offers) = item.get("offers") {
        let offer = match offers {
            Value::Array(list) => list.first(),
            other => Some(other),
        };
        if let Some(offer) = offer {
            product.price = offer_price(offer);
            product.availability = offer_availability(offer);
        }
    }

    Some(product)
}

/// Extract question/answer pairs from a schema.org FAQPage item
pub fn faq(document: &Html) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for item in items(document) {
        if item_type(&item) != Some("FAQPage") {
            continue;
        }
        let Some(entities) = item.get("mainEntity").and_then(Value::as_array) else {
            continue;
        };
        for entity in entities {
            let question = string_field(entity, "name");
            let answer = entity
                .get("acceptedAnswer")
                .and_then(|answer| string_field(answer, "text"));
            if let (Some(question), Some(answer)) = (question, answer) {
                pairs.push((question, answer));
            }
        }
    }
    pairs
}

fn item_type(item: &Value) -> Option<&str> {
    match item.get("@type") {
        Some(Value::String(kind)) => Some(kind.as_str()),
        Some(Value::Array(kinds)) => kinds.first().and_then(Value::as_str),
        _ => None,
    }
}

fn string_field(item: &Value, field: &str) -> Option<String> {
    item.get(field)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn offer_price(offer: &Value) -> Option<String> {
    let price = match offer.get("price") {
        Some(Value::String(price)) => Some(price.clone()),
        Some(Value::Number(price)) => Some(price.to_string()),
        _ => None,
    }?;
    match offer.get("priceCurrency").and_then(Value::as_str) {
        Some(currency) => Some(format!("{} {}", price, currency)),
        None => Some(price),
    }
}

fn offer_availability(offer: &Value) -> Option<String> {
    let availability = offer.get("availability").and_then(Value::as_str)?;
    if availability.contains("InStock") {
        Some("in stock".to_string())
    } else if availability.contains("OutOfStock") {
        Some("out of stock".to_string())
    } else {
        None
    }
}
