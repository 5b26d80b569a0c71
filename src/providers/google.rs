use crate::config::ProviderConfig;
use crate::error::IngestError;
use crate::providers::{base64_data, request_failed, response_json, GenerationRequest, LlmProvider};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GoogleProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GoogleProvider {
    /// Create a new Google Gemini provider from configuration
    pub fn new(config: &ProviderConfig) -> Result<Self, IngestError> {
        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .ok_or_else(|| {
                IngestError::Provider("GOOGLE_API_KEY not found in config or environment".into())
            })?;

        Ok(GoogleProvider {
            client: Client::new(),
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        GoogleProvider {
            client: Client::new(),
            api_key,
            base_url,
            model,
            temperature: 0.2,
            max_tokens: 4096,
        }
    }

    fn parts(request: &GenerationRequest<'_>) -> Vec<Value> {
        let mut parts = vec![json!({ "text": request.instructions })];
        if let Some(text) = &request.text {
            parts.push(json!({ "text": text }));
        }
        for attachment in request.attachments {
            parts.push(json!({
                "inline_data": {
                    "mime_type": attachment.mime_type,
                    "data": base64_data(attachment)
                }
            }));
        }
        parts
    }
}

#[async_trait]
impl LlmProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, IngestError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "contents": [{ "parts": Self::parts(request) }],
                "generationConfig": {
                    "temperature": self.temperature,
                    "maxOutputTokens": self.max_tokens
                }
            }))
            .send()
            .await
            .map_err(|e| request_failed(self.provider_name(), e))?;

        let response_body = response_json(self.provider_name(), response).await?;
        debug!("{:?}", response_body);

        let text: String = response_body["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(IngestError::Provider(
                "Failed to extract content from Google Gemini response".into(),
            ));
        }
        Ok(text)
    }
}
