use scraper::{Html, Selector};
use std::sync::LazyLock;

static OG_IMAGE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:image"]"#).expect("Invalid og:image selector")
});

static TWITTER_IMAGE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name="twitter:image"]"#).expect("Invalid twitter:image selector")
});

/// Page-level preview image: og:image first, then twitter:image.
pub fn find(document: &Html) -> Option<String> {
    [&*OG_IMAGE_SELECTOR, &*TWITTER_IMAGE_SELECTOR]
        .into_iter()
        .find_map(|selector| {
            document
                .select(selector)
                .filter_map(|el| el.value().attr("content"))
                .map(str::trim)
                .find(|content| !content.is_empty())
                .map(str::to_string)
        })
}
