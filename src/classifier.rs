//! Decides what a link found in a message points at.
//!
//! Video platforms are checked first and always win, so a TikTok link whose
//! slug mentions "recipe" is still a video. Everything else goes through the
//! recipe-candidate filter: block list, known recipe sites, recipe keywords,
//! and finally a "has a path" test that keeps anything that isn't a bare homepage.

use crate::model::Platform;
use url::Url;

/// Outcome of classifying a single URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlClass {
    Video(Platform),
    RecipeCandidate,
    Rejected,
}

const TIKTOK_DOMAINS: &[&str] = &["tiktok.com"];

// Instagram is also block-listed; only these path shapes count as videos.
const INSTAGRAM_DOMAIN: &str = "instagram.com";
const INSTAGRAM_VIDEO_PATHS: &[&str] = &["/reel/", "/reels/", "/p/", "/tv/"];

const BLOCKED: &[&str] = &[
    "facebook.com",
    "fb.com",
    "instagram.com",
    "twitter.com",
    "://x.com",
    "://www.x.com",
    "linkedin.com",
    "youtube.com",
    "youtu.be",
    "pinterest.",
    "threads.net",
    "snapchat.com",
    "reddit.com",
    "login",
    "signin",
    "sign-in",
    "signup",
    "sign-up",
    "unsubscribe",
    "preferences",
    "account",
    "privacy",
    "terms",
    "legal",
    "cdn.",
    "/static/",
    "/assets/",
    "mailto:",
];

// Matched against the end of the path only
const ASSET_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg", ".css", ".js",
];

const RECIPE_SITES: &[&str] = &[
    "allrecipes.com",
    "seriouseats.com",
    "bonappetit.com",
    "epicurious.com",
    "foodnetwork.com",
    "cooking.nytimes.com",
    "bbcgoodfood.com",
    "food52.com",
    "delish.com",
    "tasty.co",
    "budgetbytes.com",
    "smittenkitchen.com",
    "simplyrecipes.com",
    "kingarthurbaking.com",
    "thekitchn.com",
    "minimalistbaker.com",
    "halfbakedharvest.com",
    "bettycrocker.com",
    "tasteofhome.com",
    "jamieoliver.com",
];

const RECIPE_KEYWORDS: &[&str] = &[
    "recipe", "recipes", "cook", "bake", "baking", "kitchen", "food", "dish", "meal", "dinner",
];

/// Classify a URL. Pure and stateless.
pub fn classify(url: &str) -> UrlClass {
    if let Some(platform) = detect_platform(url) {
        return UrlClass::Video(platform);
    }
    if is_recipe_candidate(url) {
        UrlClass::RecipeCandidate
    } else {
        UrlClass::Rejected
    }
}

/// Detect a known short-video platform by domain and, for Instagram, path shape.
pub fn detect_platform(url: &str) -> Option<Platform> {
    let lower = url.to_lowercase();

    if TIKTOK_DOMAINS.iter().any(|d| lower.contains(d)) {
        return Some(Platform::TikTok);
    }

    if lower.contains(INSTAGRAM_DOMAIN) && INSTAGRAM_VIDEO_PATHS.iter().any(|p| lower.contains(p)) {
        return Some(Platform::Instagram);
    }

    None
}

/// Recipe-candidate filter, applied to anything that isn't a video link.
pub fn is_recipe_candidate(url: &str) -> bool {
    let lower = url.to_lowercase();

    if BLOCKED.iter().any(|b| lower.contains(b)) || is_asset(url) {
        return false;
    }
    if RECIPE_SITES.iter().any(|s| lower.contains(s)) {
        return true;
    }
    if RECIPE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return true;
    }

    // Permissive on purpose: any non-homepage link is kept.
    has_path_segment(url)
}

fn is_asset(url: &str) -> bool {
    Url::parse(url)
        .map(|parsed| {
            let path = parsed.path().to_lowercase();
            ASSET_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
        })
        .unwrap_or(false)
}

fn has_path_segment(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .map(|mut segments| segments.any(|s| !s.is_empty()))
        })
        .unwrap_or(false)
}
