use super::{response, truncate_html};
use crate::error::IngestError;
use crate::extractors::{scan_page, PageData};
use crate::model::{ExtractedRecipe, Extraction};
use crate::normalizer::normalize;
use crate::providers::prompt::url_prompt;
use crate::providers::{GenerationRequest, LlmProvider};
use crate::services::RequestFetcher;
use log::{debug, info};

/// Process a URL to extract recipe content
///
/// This pipeline:
/// 1. Fetches the page HTML
/// 2. Looks for a complete JSON-LD recipe and returns it when found
/// 3. Otherwise hands the (truncated) HTML to the generative service
/// 4. Fills in the source URL and the page's preview image where missing
///
/// An incomplete structured recipe only triggers the generative step. If that
/// step fails, the error is returned.
pub async fn process(
    url: &str,
    fetcher: &RequestFetcher,
    provider: &dyn LlmProvider,
    html_char_limit: usize,
) -> Result<Extraction, IngestError> {
    let html = fetcher.fetch(url).await?;
    extract_from_html(url, &html, provider, html_char_limit).await
}

/// The part of [`process`] that runs after the page has been fetched.
pub async fn extract_from_html(
    url: &str,
    html: &str,
    provider: &dyn LlmProvider,
    html_char_limit: usize,
) -> Result<Extraction, IngestError> {
    let PageData { recipe, meta_image } = scan_page(html, url);

    match recipe {
        Some(recipe) if recipe.is_complete() => {
            info!("Found structured recipe data for {}", url);
            return Ok(Extraction::Recipe(backfill(recipe, url, meta_image)));
        }
        Some(_) => debug!("Structured recipe on {} is incomplete, asking the model", url),
        None => debug!("No structured recipe on {}, asking the model", url),
    }

    match generate(url, html, provider, html_char_limit).await? {
        Extraction::Recipe(recipe) => Ok(Extraction::Recipe(backfill(recipe, url, meta_image))),
        declined => Ok(declined),
    }
}

async fn generate(
    url: &str,
    html: &str,
    provider: &dyn LlmProvider,
    html_char_limit: usize,
) -> Result<Extraction, IngestError> {
    let page = truncate_html(html, html_char_limit);
    let request = GenerationRequest::text(url_prompt(url), page.into_owned());
    let answer = provider.generate(&request).await?;
    let record = response::parse_record(&answer)?;
    Ok(Extraction::from_record(normalize(&record)))
}

fn backfill(mut recipe: ExtractedRecipe, url: &str, meta_image: Option<String>) -> ExtractedRecipe {
    if recipe.source_url.trim().is_empty() {
        recipe.source_url = url.to_string();
    }
    if recipe.image_url.is_none() {
        recipe.image_url = meta_image;
    }
    recipe
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::TRUNCATION_MARKER;
    use crate::testing::ScriptedProvider;
    use mockito::Server;

    const COMPLETE_PAGE: &str = r#"<html><head>
        <meta property="og:image" content="https://img.example.com/og.jpg">
        <script type="application/ld+json">
        {"@context": "https://schema.org", "@type": "Recipe", "name": "Flapjacks",
         "recipeIngredient": ["200g oats", "100g butter"],
         "recipeInstructions": [{"@type": "HowToStep", "text": "Melt the butter."},
                                {"@type": "HowToStep", "text": "Stir in oats and bake."}]}
        </script></head><body></body></html>"#;

    const PARTIAL_PAGE: &str = r#"<html><head>
        <meta name="twitter:image" content="https://img.example.com/tw.jpg">
        <script type="application/ld+json">
        {"@type": "Recipe", "name": "Mystery Cake", "recipeIngredient": ["flour"]}
        </script></head><body><p>Mix and bake.</p></body></html>"#;

    #[tokio::test]
    async fn test_complete_structured_recipe_skips_model() {
        let provider = ScriptedProvider::new(vec![]);
        let outcome = extract_from_html("https://cook.example.com/flapjacks", COMPLETE_PAGE, &provider, 50_000)
            .await
            .unwrap();

        let Extraction::Recipe(recipe) = outcome else {
            panic!("expected a recipe");
        };
        assert_eq!(recipe.name, "Flapjacks");
        assert_eq!(recipe.directions, "1. Melt the butter.\n2. Stir in oats and bake.");
        assert_eq!(recipe.source_url, "https://cook.example.com/flapjacks");
        assert_eq!(recipe.image_url.as_deref(), Some("https://img.example.com/og.jpg"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_incomplete_structured_recipe_falls_back_to_model() {
        let provider = ScriptedProvider::new(vec![Ok(
            r#"{"name": "Mystery Cake", "ingredients": ["flour", "sugar"], "directions": "1. Mix\n2. Bake"}"#.into(),
        )]);
        let outcome = extract_from_html("https://cook.example.com/cake", PARTIAL_PAGE, &provider, 50_000)
            .await
            .unwrap();

        let Extraction::Recipe(recipe) = outcome else {
            panic!("expected a recipe");
        };
        assert_eq!(recipe.ingredients, "flour\nsugar");
        assert_eq!(recipe.source_url, "https://cook.example.com/cake");
        assert_eq!(recipe.image_url.as_deref(), Some("https://img.example.com/tw.jpg"));

        let sent = provider.requests();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].text.as_deref().unwrap_or_default().contains("Mix and bake"));
        assert!(sent[0].instructions.contains("https://cook.example.com/cake"));
    }

    #[tokio::test]
    async fn test_model_failure_ignores_partial_structured_recipe() {
        let provider = ScriptedProvider::new(vec![Err("503 service unavailable".into())]);
        let err = extract_from_html("https://cook.example.com/cake", PARTIAL_PAGE, &provider, 50_000)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Provider(ref m) if m.contains("503")));

        let provider = ScriptedProvider::new(vec![Ok("I am sorry, I cannot help".into())]);
        let err = extract_from_html("https://cook.example.com/cake", PARTIAL_PAGE, &provider, 50_000)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_model_failure_without_structured_data_is_error() {
        let provider = ScriptedProvider::new(vec![Err("quota exhausted".into())]);
        let err = extract_from_html("https://blog.example.com/post", "<p>hello</p>", &provider, 50_000)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("quota exhausted"));
    }

    #[tokio::test]
    async fn test_no_recipe_is_declined_with_notes() {
        let provider = ScriptedProvider::new(vec![Ok(
            r#"{"name": "NO_RECIPE", "notes": "This page is a restaurant review."}"#.into(),
        )]);
        let outcome = extract_from_html("https://blog.example.com/review", "<p>review</p>", &provider, 50_000)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Extraction::Declined("This page is a restaurant review.".to_string())
        );
    }

    #[tokio::test]
    async fn test_long_page_is_truncated_once() {
        let provider = ScriptedProvider::new(vec![Ok(r#"{"name": "NO_RECIPE"}"#.into())]);
        let html = format!("<html><body>{}</body></html>", "x".repeat(500));
        extract_from_html("https://blog.example.com/long", &html, &provider, 100)
            .await
            .unwrap();

        let sent = provider.requests();
        let text = sent[0].text.clone().unwrap_or_default();
        assert!(text.ends_with(TRUNCATION_MARKER));
        assert_eq!(text.matches(TRUNCATION_MARKER).count(), 1);
    }

    #[tokio::test]
    async fn test_process_fetches_page() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/flapjacks")
            .with_status(200)
            .with_body(COMPLETE_PAGE)
            .create();

        let fetcher = RequestFetcher::new(None).unwrap();
        let provider = ScriptedProvider::new(vec![]);
        let url = format!("{}/flapjacks", server.url());
        let outcome = process(&url, &fetcher, &provider, 50_000).await.unwrap();
        assert!(matches!(outcome, Extraction::Recipe(ref r) if r.name == "Flapjacks"));
    }
}
