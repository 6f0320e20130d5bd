//! Type-specific page extractors
//!
//! This module turns fetched HTML into the record types of
//! [`crate::crawler::records`]. Every extractor is built from ordered
//! selector cascades with a fixed priority across sources: structured
//! JSON-LD metadata beats DOM selectors, which beat free-text regex. The
//! first non-empty result wins per field, and fields are independent: a
//! page that defeats one cascade still yields a partial record.

pub mod cascade;
pub mod json_ld;

mod category;
mod faq;
mod general;
mod product;

pub use category::{
    CategoryExtraction, category_type_from_url, extract_category, max_pagination_page,
    product_links,
};
pub use faq::extract_faq;
pub use general::extract_general;
pub use product::extract_product;
