//! In-memory stand-ins for the external services, shared by unit tests.

use crate::error::IngestError;
use crate::model::{ExtractedRecipe, VideoLink};
use crate::providers::{GenerationRequest, LlmProvider};
use crate::services::{RecipeSink, Transcriber, VideoDownloader, VideoInfo};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// What a provider was asked, minus the attachment bytes
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub instructions: String,
    pub text: Option<String>,
    pub attachments: Vec<String>,
}

/// Answers generation requests from a script, in order
pub struct ScriptedProvider {
    answers: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedProvider {
    pub fn new(answers: Vec<Result<String, String>>) -> Self {
        ScriptedProvider {
            answers: Mutex::new(answers.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, IngestError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            instructions: request.instructions.clone(),
            text: request.text.clone(),
            attachments: request
                .attachments
                .iter()
                .map(|a| a.filename.clone())
                .collect(),
        });
        match self.answers.lock().unwrap().pop_front() {
            Some(Ok(answer)) => Ok(answer),
            Some(Err(message)) => Err(IngestError::Provider(message)),
            None => Err(IngestError::Provider("no scripted answer left".into())),
        }
    }
}

/// Accepts every recipe and remembers it
#[derive(Default)]
pub struct MemorySink {
    pub submitted: Mutex<Vec<ExtractedRecipe>>,
}

impl MemorySink {
    pub fn names(&self) -> Vec<String> {
        self.submitted
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }
}

#[async_trait]
impl RecipeSink for MemorySink {
    async fn submit(&self, recipe: &ExtractedRecipe) -> Result<String, IngestError> {
        self.submitted.lock().unwrap().push(recipe.clone());
        Ok(recipe.name.to_lowercase().replace(' ', "-"))
    }
}

/// Lets a test keep a handle on a sink after handing it over
#[async_trait]
impl<T: RecipeSink> RecipeSink for Arc<T> {
    async fn submit(&self, recipe: &ExtractedRecipe) -> Result<String, IngestError> {
        self.as_ref().submit(recipe).await
    }
}

pub struct StaticDownloader(pub VideoInfo);

#[async_trait]
impl VideoDownloader for StaticDownloader {
    async fn fetch_info(&self, _link: &VideoLink) -> Result<VideoInfo, IngestError> {
        Ok(self.0.clone())
    }
}

pub struct StaticTranscriber(pub &'static str);

#[async_trait]
impl Transcriber for StaticTranscriber {
    async fn transcribe(&self, _media: Vec<u8>) -> Result<String, IngestError> {
        Ok(self.0.to_string())
    }
}
