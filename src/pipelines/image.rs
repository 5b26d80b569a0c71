use super::response;
use crate::error::IngestError;
use crate::model::{Attachment, Extraction};
use crate::normalizer::normalize;
use crate::providers::prompt::image_prompt;
use crate::providers::{GenerationRequest, LlmProvider};
use log::debug;

/// Extract a single recipe from one or more images.
///
/// All images go out in one request, so photos of consecutive pages come back
/// as one merged record.
pub async fn process(
    images: &[Attachment],
    provider: &dyn LlmProvider,
) -> Result<Extraction, IngestError> {
    if images.is_empty() {
        return Ok(Extraction::Declined("No images supplied".to_string()));
    }
    debug!(
        "Sending {} image(s) to {}",
        images.len(),
        provider.provider_name()
    );

    let request = GenerationRequest::attachments(image_prompt(images.len()), images);
    let answer = provider.generate(&request).await?;
    let record = response::parse_record(&answer)?;
    Ok(Extraction::from_record(normalize(&record)))
}
