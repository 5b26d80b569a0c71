use crate::config::TranscriptionConfig;
use crate::error::IngestError;
use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Turn raw audio or video bytes into plain transcript text
    async fn transcribe(&self, media: Vec<u8>) -> Result<String, IngestError>;
}

/// Speech-to-text over an OpenAI-compatible `/v1/audio/transcriptions` endpoint
pub struct WhisperTranscriber {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl WhisperTranscriber {
    pub fn new(config: &TranscriptionConfig) -> Result<Self, IngestError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                IngestError::Transcription(
                    "transcription API key not found in config or OPENAI_API_KEY".into(),
                )
            })?;

        Ok(WhisperTranscriber {
            client: Client::new(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
            api_key,
            model: config.model.clone(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        WhisperTranscriber {
            client: Client::new(),
            base_url,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, media: Vec<u8>) -> Result<String, IngestError> {
        debug!("Transcribing {} bytes of media", media.len());

        let form = Form::new()
            .part("file", Part::bytes(media).file_name("video.mp4"))
            .text("model", self.model.clone())
            .text("response_format", "text");

        let response = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| IngestError::Transcription(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IngestError::Transcription(e.to_string()))?;
        if !status.is_success() {
            return Err(IngestError::Transcription(format!(
                "speech-to-text returned {status}: {body}"
            )));
        }

        let transcript = body.trim().to_string();
        if transcript.is_empty() {
            return Err(IngestError::Transcription("empty transcript".into()));
        }
        Ok(transcript)
    }
}
