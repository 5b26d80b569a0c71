use super::response;
use crate::error::IngestError;
use crate::model::{Attachment, Extraction};
use crate::normalizer::normalize;
use crate::providers::prompt::document_prompt;
use crate::providers::{GenerationRequest, LlmProvider};
use log::debug;
use std::slice;

/// Extract every recipe in a document. A cookbook chapter may hold several.
pub async fn process(
    document: &Attachment,
    provider: &dyn LlmProvider,
) -> Result<Vec<Extraction>, IngestError> {
    debug!(
        "Sending document {} ({}) to {}",
        document.filename,
        document.mime_type,
        provider.provider_name()
    );

    let request = GenerationRequest::attachments(document_prompt(), slice::from_ref(document));
    let answer = provider.generate(&request).await?;
    let records = response::parse_records(&answer)?;
    debug!("Document {} yielded {} record(s)", document.filename, records.len());

    Ok(records
        .iter()
        .map(|record| Extraction::from_record(normalize(record)))
        .collect())
}
