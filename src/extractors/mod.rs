//! Structured data lookups over fetched HTML. No network access happens here.

pub mod json_ld;
pub mod meta_image;

use crate::model::ExtractedRecipe;
use scraper::Html;

/// What a single parse of the page yields before any fallback is considered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageData {
    pub recipe: Option<ExtractedRecipe>,
    pub meta_image: Option<String>,
}

/// Parse the page once and run every structured lookup over it.
pub fn scan_page(html: &str, url: &str) -> PageData {
    let document = Html::parse_document(html);
    PageData {
        recipe: json_ld::extract(&document, url),
        meta_image: meta_image::find(&document),
    }
}
