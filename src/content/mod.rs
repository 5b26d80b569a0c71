//! Splits inbound messages into typed content items.

pub mod email;
pub mod links;

pub use email::extract;
pub use links::{clean_url, extract_urls, link_items};
