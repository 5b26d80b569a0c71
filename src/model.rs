use serde::{Deserialize, Serialize};
use std::fmt;

/// Name the extraction service uses when an image or document holds no readable recipe.
pub const UNREADABLE: &str = "UNREADABLE";

/// Name the extraction service uses when a page or video holds no recipe.
pub const NO_RECIPE: &str = "NO_RECIPE";

/// Name given to a record that arrives without one.
pub const DEFAULT_NAME: &str = "Untitled Recipe";

/// A binary attachment (image or document) together with its metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub filename: String,
}

impl Attachment {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>, filename: impl Into<String>) -> Self {
        Attachment {
            data,
            mime_type: mime_type.into(),
            filename: filename.into(),
        }
    }
}

/// Short-video platforms that a download service exists for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    TikTok,
    Instagram,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::TikTok => "tiktok",
            Platform::Instagram => "instagram",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoLink {
    pub url: String,
    pub platform: Platform,
}

/// A classified unit of inbound content. The payload kind follows from the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentItem {
    Image(Attachment),
    Document(Attachment),
    Url(String),
    Video(VideoLink),
}

impl ContentItem {
    pub fn mime_type(&self) -> Option<&str> {
        match self {
            ContentItem::Image(a) | ContentItem::Document(a) => Some(&a.mime_type),
            _ => None,
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            ContentItem::Image(a) | ContentItem::Document(a) => Some(&a.filename),
            _ => None,
        }
    }

    pub fn platform(&self) -> Option<Platform> {
        match self {
            ContentItem::Video(v) => Some(v.platform),
            _ => None,
        }
    }
}

/// Content items split out of one inbound message, bucketed by kind in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentBatch {
    pub images: Vec<Attachment>,
    pub documents: Vec<Attachment>,
    pub urls: Vec<String>,
    pub videos: Vec<VideoLink>,
}

impl ContentBatch {
    pub fn push(&mut self, item: ContentItem) {
        match item {
            ContentItem::Image(a) => self.images.push(a),
            ContentItem::Document(a) => self.documents.push(a),
            ContentItem::Url(u) => self.urls.push(u),
            ContentItem::Video(v) => self.videos.push(v),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
            && self.documents.is_empty()
            && self.urls.is_empty()
            && self.videos.is_empty()
    }

    pub fn len(&self) -> usize {
        self.images.len() + self.documents.len() + self.urls.len() + self.videos.len()
    }
}

/// The canonical recipe record handed to the recipe manager.
///
/// Every textual field is always present (possibly empty). `ingredients` holds one
/// ingredient per line and `directions` one numbered step per line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecipe {
    pub name: String,
    pub ingredients: String,
    pub directions: String,
    pub prep_time: String,
    pub cook_time: String,
    pub servings: String,
    pub source: String,
    pub source_url: String,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ExtractedRecipe {
    /// A record is complete when it carries both ingredients and directions.
    pub fn is_complete(&self) -> bool {
        !self.ingredients.trim().is_empty() && !self.directions.trim().is_empty()
    }

    pub fn is_sentinel(&self) -> bool {
        self.name == UNREADABLE || self.name == NO_RECIPE
    }
}

/// Result of one extraction strategy: a recipe, or an explicit decline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Recipe(ExtractedRecipe),
    Declined(String),
}

impl Extraction {
    /// Turn a normalized record into an outcome, mapping the sentinel names to a decline.
    pub fn from_record(recipe: ExtractedRecipe) -> Self {
        if !recipe.is_sentinel() {
            return Extraction::Recipe(recipe);
        }

        let reason = if recipe.notes.trim().is_empty() {
            match recipe.name.as_str() {
                UNREADABLE => "No readable recipe found".to_string(),
                _ => "No recipe found".to_string(),
            }
        } else {
            recipe.notes.trim().to_string()
        };
        Extraction::Declined(reason)
    }

    pub fn is_declined(&self) -> bool {
        matches!(self, Extraction::Declined(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_buckets_by_kind() {
        let mut batch = ContentBatch::default();
        batch.push(ContentItem::Url("https://example.com/a".to_string()));
        batch.push(ContentItem::Image(Attachment::new(vec![1], "image/png", "a.png")));
        batch.push(ContentItem::Video(VideoLink {
            url: "https://www.tiktok.com/@chef/video/1".to_string(),
            platform: Platform::TikTok,
        }));

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.images.len(), 1);
        assert_eq!(batch.urls, vec!["https://example.com/a"]);
        assert_eq!(batch.videos[0].platform, Platform::TikTok);
        assert!(batch.documents.is_empty());
    }

    #[test]
    fn test_item_metadata() {
        let item = ContentItem::Document(Attachment::new(vec![], "application/pdf", "card.pdf"));
        assert_eq!(item.mime_type(), Some("application/pdf"));
        assert_eq!(item.filename(), Some("card.pdf"));
        assert_eq!(item.platform(), None);
    }

    #[test]
    fn test_completeness() {
        let mut recipe = ExtractedRecipe {
            name: "Soup".to_string(),
            ingredients: "water".to_string(),
            ..Default::default()
        };
        assert!(!recipe.is_complete());
        recipe.directions = "1. Boil".to_string();
        assert!(recipe.is_complete());
    }

    #[test]
    fn test_sentinel_becomes_decline_with_notes() {
        let recipe = ExtractedRecipe {
            name: NO_RECIPE.to_string(),
            notes: "Page is a product listing".to_string(),
            ..Default::default()
        };
        assert_eq!(
            Extraction::from_record(recipe),
            Extraction::Declined("Page is a product listing".to_string())
        );
    }

    #[test]
    fn test_sentinel_without_notes_gets_default_reason() {
        let recipe = ExtractedRecipe {
            name: UNREADABLE.to_string(),
            ..Default::default()
        };
        assert_eq!(
            Extraction::from_record(recipe),
            Extraction::Declined("No readable recipe found".to_string())
        );
    }

    #[test]
    fn test_image_url_omitted_when_absent() {
        let recipe = ExtractedRecipe {
            name: "Toast".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&recipe).unwrap();
        assert!(json.get("image_url").is_none());
        assert_eq!(json["notes"], "");
    }
}
