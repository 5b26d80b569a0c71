use crate::config::ProviderConfig;
use crate::error::IngestError;
use crate::model::Attachment;
use crate::providers::{base64_data, request_failed, response_json, GenerationRequest, LlmProvider};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider from configuration
    pub fn new(config: &ProviderConfig) -> Result<Self, IngestError> {
        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| {
                IngestError::Provider("ANTHROPIC_API_KEY not found in config or environment".into())
            })?;

        Ok(AnthropicProvider {
            client: Client::new(),
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| "https://api.anthropic.com".to_string()),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        AnthropicProvider {
            client: Client::new(),
            api_key,
            base_url,
            model,
            temperature: 0.2,
            max_tokens: 4096,
        }
    }
}

fn attachment_block(attachment: &Attachment) -> Value {
    if attachment.mime_type.starts_with("image/") {
        json!({
            "type": "image",
            "source": {
                "type": "base64",
                "media_type": attachment.mime_type,
                "data": base64_data(attachment)
            }
        })
    } else if attachment.mime_type == "application/pdf" {
        json!({
            "type": "document",
            "source": {
                "type": "base64",
                "media_type": "application/pdf",
                "data": base64_data(attachment)
            }
        })
    } else {
        json!({
            "type": "document",
            "source": {
                "type": "text",
                "media_type": "text/plain",
                "data": String::from_utf8_lossy(&attachment.data)
            }
        })
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, IngestError> {
        let mut content: Vec<Value> = request.attachments.iter().map(attachment_block).collect();
        if let Some(text) = &request.text {
            content.push(json!({ "type": "text", "text": text }));
        }

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "temperature": self.temperature,
                "system": request.instructions,
                "messages": [
                    {
                        "role": "user",
                        "content": content
                    }
                ]
            }))
            .send()
            .await
            .map_err(|e| request_failed(self.provider_name(), e))?;

        let response_body = response_json(self.provider_name(), response).await?;
        debug!("{:?}", response_body);

        response_body["content"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                IngestError::Provider("Failed to extract content from Anthropic response".into())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_generate_with_document() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_body(Matcher::PartialJson(json!({
                "system": "read the document",
                "messages": [{"role": "user", "content": [
                    {"type": "document", "source": {"type": "base64", "media_type": "application/pdf", "data": "JVBERi0="}}
                ]}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"content": [{"type": "text", "text": "[]"}]}"#)
            .create();

        let provider = AnthropicProvider::with_base_url(
            "test-key".to_string(),
            server.url(),
            "claude-test".to_string(),
        );
        let docs = [Attachment::new(b"%PDF-".to_vec(), "application/pdf", "a.pdf")];
        let request = GenerationRequest::attachments("read the document".to_string(), &docs);

        assert_eq!(provider.generate(&request).await.unwrap(), "[]");
        mock.assert();
    }

    #[test]
    fn test_plain_text_document_sent_as_text_source() {
        let block = attachment_block(&Attachment::new(b"2 eggs".to_vec(), "text/plain", "a.txt"));
        assert_eq!(block["source"]["type"], "text");
        assert_eq!(block["source"]["data"], "2 eggs");
    }

    #[test]
    fn test_provider_name() {
        let config = ProviderConfig {
            enabled: true,
            model: "claude-sonnet-4.5".to_string(),
            temperature: 0.2,
            max_tokens: 4000,
            api_key: Some("test-key".to_string()),
            base_url: None,
        };

        let provider = AnthropicProvider::new(&config).unwrap();
        assert_eq!(provider.provider_name(), "anthropic");
    }
}
