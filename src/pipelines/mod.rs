//! One pipeline per kind of content. Each returns [`Extraction`](crate::model::Extraction)
//! values and leaves submission to the caller.

pub mod document;
pub mod image;
pub mod response;
pub mod url;
pub mod video;

use std::borrow::Cow;

/// Characters of page HTML sent to the generative service unless configured otherwise.
pub const DEFAULT_HTML_CHAR_LIMIT: usize = 50_000;

/// Appended once to page HTML that was cut to fit the generative request.
pub const TRUNCATION_MARKER: &str = "\n<!-- [page truncated] -->";

/// Cut `html` to at most `limit` characters, marking the cut.
pub fn truncate_html(html: &str, limit: usize) -> Cow<'_, str> {
    match html.char_indices().nth(limit) {
        Some((cut, _)) => Cow::Owned(format!("{}{TRUNCATION_MARKER}", &html[..cut])),
        None => Cow::Borrowed(html),
    }
}
