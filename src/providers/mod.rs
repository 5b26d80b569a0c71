mod anthropic;
mod factory;
mod google;
mod open_ai;
pub mod prompt;

pub use anthropic::AnthropicProvider;
pub use factory::ProviderFactory;
pub use google::GoogleProvider;
pub use open_ai::OpenAIProvider;

use crate::error::IngestError;
use crate::model::Attachment;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;

/// One call to the generative extraction service: fixed instructions plus
/// either text, inline binary attachments, or both.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub instructions: String,
    pub text: Option<String>,
    pub attachments: &'a [Attachment],
}

impl<'a> GenerationRequest<'a> {
    pub fn text(instructions: String, text: String) -> Self {
        GenerationRequest {
            instructions,
            text: Some(text),
            attachments: &[],
        }
    }

    pub fn attachments(instructions: String, attachments: &'a [Attachment]) -> Self {
        GenerationRequest {
            instructions,
            text: None,
            attachments,
        }
    }
}

/// Unified trait for all generative extraction providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "google", "openai")
    fn provider_name(&self) -> &str;

    /// Send one request and return the model's raw text answer
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, IngestError>;
}

pub(crate) fn base64_data(attachment: &Attachment) -> String {
    STANDARD.encode(&attachment.data)
}

pub(crate) fn data_url(attachment: &Attachment) -> String {
    format!(
        "data:{};base64,{}",
        attachment.mime_type,
        base64_data(attachment)
    )
}

/// Turn an HTTP response into JSON, treating non-2xx as a provider failure.
pub(crate) async fn response_json(
    provider: &str,
    response: reqwest::Response,
) -> Result<Value, IngestError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(IngestError::Provider(format!(
            "{provider} returned {status}: {body}"
        )));
    }
    response
        .json()
        .await
        .map_err(|e| IngestError::Provider(format!("{provider} sent unreadable JSON: {e}")))
}

pub(crate) fn request_failed(provider: &str, e: reqwest::Error) -> IngestError {
    IngestError::Provider(format!("{provider} request failed: {e}"))
}
