use crate::classifier::{self, UrlClass};
use crate::model::{ContentItem, VideoLink};
use html_escape::decode_html_entities;
use log::debug;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Matches http(s) links in plain text and raw HTML alike.
static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"'`]+"#).expect("Invalid URL regex")
});

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']'];

/// Strip entity escapes and trailing sentence punctuation from a matched link.
pub fn clean_url(raw: &str) -> String {
    decode_html_entities(raw)
        .trim_end_matches(TRAILING_PUNCTUATION)
        .to_string()
}

/// Every link in `text`, cleaned and deduplicated, in first-seen order.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    URL_REGEX
        .find_iter(text)
        .map(|m| clean_url(m.as_str()))
        .filter(|url| !url.is_empty() && seen.insert(url.clone()))
        .collect()
}

/// Scan `text` for links and turn the keepers into url or video items.
pub fn link_items(text: &str) -> Vec<ContentItem> {
    extract_urls(text)
        .into_iter()
        .filter_map(|url| match classifier::classify(&url) {
            UrlClass::Video(platform) => {
                debug!("Video link ({}): {}", platform, url);
                Some(ContentItem::Video(VideoLink { url, platform }))
            }
            UrlClass::RecipeCandidate => {
                debug!("Recipe candidate: {}", url);
                Some(ContentItem::Url(url))
            }
            UrlClass::Rejected => {
                debug!("Ignoring link: {}", url);
                None
            }
        })
        .collect()
}
