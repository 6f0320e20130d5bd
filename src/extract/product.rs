//! Product-page extraction
//!
//! Field extraction follows the source priority order: structured JSON-LD
//! metadata outranks DOM selector cascades, which outrank free-text regex
//! against the page body. Fields are independent; one missing field never
//! aborts the others, so a partially extracted product is still stored.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::crawler::CrawlerConfig;
use crate::crawler::records::{ColorVariant, ProductRecord, SizeOption};
use crate::crawler::url_filter;
use crate::extract::cascade::{self, SelectorCascade};
use crate::extract::category::category_type_from_url;
use crate::extract::json_ld;

/// "Cena 3 999 zł"-style price line
static PRICE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)cena\s*:?\s*\d[\d\s.,]*zł").expect("valid price regex"));

/// Bare amount with currency, at least three digits
static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{3,}[\d\s.,]*zł").expect("valid amount regex"));

/// Availability phrases, most specific first; negated forms before positive
/// ones so "Niedostępny" never matches as "dostępny"
static AVAILABILITY_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)dostępny\s*\(\d+/\d+\s+wariantów\)",
        r"(?i)dostępne\s+rozmiary[:\s]*[^\n\r.]+",
        r"(?i)wszystkie\s+warianty\s+niedostępne",
        r"(?i)brak\s+w\s+magazynie",
        r"(?i)tymczasowo\s+niedostępny",
        r"(?i)niedostępny",
        r"(?i)wyprzedany",
        r"(?i)na\s+zamówienie",
        r"(?i)dostępny\s+online",
        r"(?i)w\s+magazynie",
        r"(?i)na\s+stanie",
        r"(?i)dostępny",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Extract a full product record from a product page
pub fn extract_product(
    html: &str,
    url: &str,
    depth: u32,
    config: &CrawlerConfig,
) -> ProductRecord {
    let document = Html::parse_document(html);
    let body_text: String = document.root_element().text().collect::<String>();
    let structured = json_ld::product(&document).unwrap_or_default();

    let name = structured
        .name
        .or_else(|| name_cascade().first_text(&document))
        .unwrap_or_default();

    let price = structured
        .price
        .or_else(|| {
            price_cascade()
                .first_text(&document)
                .filter(|text| text.chars().any(|c| c.is_ascii_digit()))
        })
        .or_else(|| price_from_text(&body_text))
        .unwrap_or_default();

    let availability = structured
        .availability
        .or_else(|| {
            availability_cascade()
                .first_text(&document)
                .filter(|text| text.len() > 3)
        })
        .or_else(|| availability_from_text(&body_text))
        .unwrap_or_else(|| "unknown".to_string());

    let description = description_cascade()
        .first_text(&document)
        .unwrap_or_default();

    let sku = structured
        .sku
        .or_else(|| sku_cascade().first_text(&document))
        .unwrap_or_default();

    ProductRecord {
        url: url.to_string(),
        scraped_at: Utc::now(),
        depth,
        name,
        price,
        availability,
        description,
        specifications: extract_specifications(&document),
        colors: extract_colors(&document),
        images: extract_images(&document, url),
        sku,
        category_type: category_type_from_url(url, config),
    }
}

fn name_cascade() -> SelectorCascade {
    SelectorCascade::new(&[
        "h1.product_title",
        ".product-title, .product-name",
        ".entry-title, .page-title",
        "h1",
    ])
}

fn price_cascade() -> SelectorCascade {
    SelectorCascade::new(&[
        ".price .woocommerce-Price-amount bdi",
        ".price .woocommerce-Price-amount",
        ".price .amount, .product-price .amount",
        ".product-price, .entry-summary .price",
        ".summary .price span, .price-wrapper span",
    ])
}

fn availability_cascade() -> SelectorCascade {
    SelectorCascade::new(&[
        ".stock",
        ".woocommerce-variation-availability",
        ".product-availability, .availability",
        ".stock-status, .stock-info",
        ".woocommerce-stock-status",
    ])
}

fn description_cascade() -> SelectorCascade {
    SelectorCascade::new(&[
        ".woocommerce-product-details__short-description",
        ".product-short-description, .short-description",
        ".woocommerce-Tabs-panel--description",
        ".product-description, .description",
        "#tab-description",
        ".product-content, .entry-content",
    ])
}

fn sku_cascade() -> SelectorCascade {
    SelectorCascade::new(&[
        ".sku_wrapper .sku, .product_meta .sku",
        ".product-code, .product-sku, .item-code",
        "[data-sku]",
    ])
}

fn price_from_text(text: &str) -> Option<String> {
    PRICE_LINE_RE
        .find(text)
        .or_else(|| AMOUNT_RE.find(text))
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
}

fn availability_from_text(text: &str) -> Option<String> {
    AVAILABILITY_RES.iter().find_map(|pattern| {
        pattern
            .find(text)
            .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
    })
}

/// Specifications keyed by labeled section, then attribute
///
/// The primary source is the themed description tab with its titled
/// sections; the attribute table is the generic WooCommerce fallback.
fn extract_specifications(document: &Html) -> BTreeMap<String, BTreeMap<String, String>> {
    let mut specifications = BTreeMap::new();

    let section_sel = Selector::parse(".product-description-section");
    let title_sel = Selector::parse(".product-description-title");
    let row_sel = Selector::parse(".product-description-row");
    let key_sel = Selector::parse("b");

    if let (Ok(section_sel), Ok(title_sel), Ok(row_sel), Ok(key_sel)) =
        (&section_sel, &title_sel, &row_sel, &key_sel)
    {
        for section in document.select(section_sel) {
            let Some(title) = section
                .select(title_sel)
                .next()
                .map(cascade::element_text)
                .and_then(cascade::non_empty)
            else {
                continue;
            };
            let mut rows = BTreeMap::new();
            for row in section.select(row_sel) {
                let Some(key) = row
                    .select(key_sel)
                    .next()
                    .map(cascade::element_text)
                    .and_then(cascade::non_empty)
                else {
                    continue;
                };
                let row_text = cascade::element_text(row);
                let value = row_text
                    .strip_prefix(key.as_str())
                    .unwrap_or(row_text.as_str())
                    .trim()
                    .to_string();
                if !value.is_empty() && value != key {
                    rows.insert(key, value);
                }
            }
            if !rows.is_empty() {
                specifications.insert(title.to_uppercase(), rows);
            }
        }
    }

    if !specifications.is_empty() {
        return specifications;
    }

    let table_cascade = SelectorCascade::new(&[
        ".woocommerce-product-attributes tr",
        ".product-attributes tr, .specifications tr",
        ".additional-information tr, .product-details tr",
    ]);
    let cell_sel = Selector::parse("th, td");
    if let Ok(cell_sel) = cell_sel {
        let mut rows = BTreeMap::new();
        for row in table_cascade.first_matching(document) {
            let cells: Vec<String> = row.select(&cell_sel).map(cascade::element_text).collect();
            if cells.len() >= 2 {
                let key = cells[0].trim().to_string();
                let value = cells[cells.len() - 1].trim().to_string();
                if !key.is_empty() && !value.is_empty() && key != value {
                    rows.insert(key, value);
                }
            }
        }
        if !rows.is_empty() {
            specifications.insert("SPECIFICATION".to_string(), rows);
        }
    }

    specifications
}

/// Color variants, with per-size availability when the combined size/color
/// widget exposes it, degrading to a flat color list otherwise
fn extract_colors(document: &Html) -> Vec<ColorVariant> {
    let mut variants: Vec<ColorVariant> = Vec::new();

    if let Ok(frame_sel) = Selector::parse("#custom-combined-select li.select-frame") {
        for entry in document.select(&frame_sel) {
            let Some(color_key) = entry.value().attr("data-color") else {
                continue;
            };
            let size = cascade::element_text(entry);
            if size.is_empty() {
                continue;
            }
            let available = !entry.value().classes().any(|class| class == "out-of-stock");
            let name = color_key.replace('-', " / ");

            match variants.iter_mut().find(|variant| variant.name == name) {
                Some(variant) => variant.sizes.push(SizeOption { size, available }),
                None => variants.push(ColorVariant {
                    name,
                    sizes: vec![SizeOption { size, available }],
                }),
            }
        }
    }

    if !variants.is_empty() {
        return variants;
    }

    // flat color swatches: image alt text, falling back to the variant value
    if let Ok(swatch_sel) =
        Selector::parse(r#".color-attribute-select li.select-color, .variable-item-color"#)
    {
        let img_sel = Selector::parse("img");
        for swatch in document.select(&swatch_sel) {
            let name = img_sel
                .as_ref()
                .ok()
                .and_then(|sel| swatch.select(sel).next())
                .and_then(|img| img.value().attr("alt"))
                .map(|alt| alt.trim().to_string())
                .filter(|alt| !alt.is_empty())
                .or_else(|| {
                    swatch
                        .value()
                        .attr("data-variant-value")
                        .map(|value| value.replace('-', " / "))
                });
            if let Some(name) = name {
                if !variants.iter().any(|variant| variant.name == name) {
                    variants.push(ColorVariant {
                        name,
                        sizes: Vec::new(),
                    });
                }
            }
        }
    }

    if !variants.is_empty() {
        return variants;
    }

    if let Ok(alt_sel) = Selector::parse(".variations .value ul li img[alt]") {
        for img in document.select(&alt_sel) {
            if let Some(alt) = img.value().attr("alt") {
                let name = alt.trim().to_string();
                if !name.is_empty() && !variants.iter().any(|variant| variant.name == name) {
                    variants.push(ColorVariant {
                        name,
                        sizes: Vec::new(),
                    });
                }
            }
        }
    }

    variants
}

fn extract_images(document: &Html, page_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };

    let gallery = SelectorCascade::new(&[
        ".woocommerce-product-gallery img",
        ".product-images img, .product-gallery img",
        ".gallery img",
        ".wp-post-image, .product-photo img",
    ]);

    let mut images = Vec::new();
    for img in gallery.select_all(document) {
        let src = img
            .value()
            .attr("src")
            .or_else(|| img.value().attr("data-src"))
            .or_else(|| img.value().attr("data-lazy-src"));
        let Some(src) = src else {
            continue;
        };
        if src.contains("placeholder") || src.contains("loading") {
            continue;
        }
        if let Some(normalized) = url_filter::normalize(src, &base) {
            if !images.contains(&normalized) {
                images.push(normalized);
            }
        }
    }
    images
}
