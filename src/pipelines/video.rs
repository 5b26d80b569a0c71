use super::response;
use crate::error::IngestError;
use crate::model::{Extraction, VideoLink};
use crate::normalizer::normalize;
use crate::providers::prompt::{video_message, video_prompt};
use crate::providers::{GenerationRequest, LlmProvider};
use crate::services::{RequestFetcher, Transcriber, VideoDownloader, VideoInfo};
use log::debug;

/// Services the video pipeline needs beyond the generative provider
pub struct VideoServices<'a> {
    pub downloader: &'a dyn VideoDownloader,
    pub transcriber: &'a dyn Transcriber,
    pub fetcher: &'a RequestFetcher,
}

/// Process a short-video link: resolve, download, transcribe, then extract.
///
/// The record always points back at the original link. The creator and the
/// cover image are filled in from the platform metadata when the model left
/// them empty.
pub async fn process(
    link: &VideoLink,
    services: &VideoServices<'_>,
    provider: &dyn LlmProvider,
) -> Result<Extraction, IngestError> {
    let info = services.downloader.fetch_info(link).await?;
    debug!("Downloading {} media from {}", link.platform, info.media_url);
    let media = services.fetcher.fetch_bytes(&info.media_url).await?;
    let transcript = services.transcriber.transcribe(media).await?;
    debug!("Transcript for {} is {} chars", link.url, transcript.len());

    let caption = caption_text(&info);
    let request = GenerationRequest::text(
        video_prompt(),
        video_message(&transcript, caption.as_deref()),
    );
    let answer = provider.generate(&request).await?;
    let record = response::parse_record(&answer)?;

    Ok(match Extraction::from_record(normalize(&record)) {
        Extraction::Recipe(mut recipe) => {
            recipe.source_url = link.url.clone();
            if recipe.source.trim().is_empty() {
                if let Some(author) = info.author {
                    recipe.source = author;
                }
            }
            if recipe.image_url.is_none() {
                recipe.image_url = info.thumbnail;
            }
            Extraction::Recipe(recipe)
        }
        declined => declined,
    })
}

fn caption_text(info: &VideoInfo) -> Option<String> {
    match (&info.title, &info.caption) {
        (Some(title), Some(caption)) if title != caption => Some(format!("{title}\n{caption}")),
        (_, Some(caption)) => Some(caption.clone()),
        (Some(title), None) => Some(title.clone()),
        (None, None) => None,
    }
}
