//! Runs every content item of a message through its pipeline and submits the results.
//!
//! Each unit of work (the merged images, each document, each url, each video)
//! settles on its own. A failing unit is recorded and never stops its siblings.

use crate::classifier::detect_platform;
use crate::config::IntakeConfig;
use crate::content;
use crate::error::IngestError;
use crate::model::{Attachment, ContentBatch, Extraction, VideoLink};
use crate::pipelines::{self, video::VideoServices, DEFAULT_HTML_CHAR_LIMIT};
use crate::providers::{LlmProvider, ProviderFactory};
use crate::services::{
    PlatformDownloader, RecipeManagerClient, RecipeSink, RequestFetcher, Transcriber,
    VideoDownloader, WhisperTranscriber,
};
use futures::future::join_all;
use log::{debug, info, warn};
use std::fmt;
use std::time::Duration;

/// What happened to one content item (or one recipe inside a document)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The recipe reached the recipe manager under `name`
    Submitted { item: String, name: String },
    /// Extraction declined, a stage failed, or the recipe manager refused the record
    Failed { item: String, reason: String },
}

impl ItemOutcome {
    pub fn item(&self) -> &str {
        match self {
            ItemOutcome::Submitted { item, .. } | ItemOutcome::Failed { item, .. } => item,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Submitted { .. })
    }
}

/// Outcomes of one inbound message or request, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl IngestReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// `(item, reason)` for every failed outcome
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| match o {
            ItemOutcome::Failed { item, reason } => Some((item.as_str(), reason.as_str())),
            ItemOutcome::Submitted { .. } => None,
        })
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} succeeded, {} failed", self.succeeded(), self.failed())?;
        for (item, reason) in self.failures() {
            write!(f, "\n- {item}: {reason}")?;
        }
        Ok(())
    }
}

enum WorkUnit<'a> {
    Images(&'a [Attachment]),
    Document(&'a Attachment),
    Url(&'a str),
    Video(&'a VideoLink),
}

impl WorkUnit<'_> {
    fn label(&self) -> String {
        match self {
            WorkUnit::Images([image]) => format!("image {}", image.filename),
            WorkUnit::Images(images) => format!(
                "{} images ({})",
                images.len(),
                images
                    .iter()
                    .map(|i| i.filename.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            WorkUnit::Document(document) => format!("document {}", document.filename),
            WorkUnit::Url(url) => format!("url {url}"),
            WorkUnit::Video(link) => format!("{} video {}", link.platform, link.url),
        }
    }
}

/// Owns the collaborators every pipeline needs
pub struct Ingestor {
    provider: Box<dyn LlmProvider>,
    fetcher: RequestFetcher,
    sink: Box<dyn RecipeSink>,
    downloader: Option<Box<dyn VideoDownloader>>,
    transcriber: Option<Box<dyn Transcriber>>,
    html_char_limit: usize,
}

impl Ingestor {
    pub fn new(
        provider: Box<dyn LlmProvider>,
        fetcher: RequestFetcher,
        sink: Box<dyn RecipeSink>,
    ) -> Self {
        Ingestor {
            provider,
            fetcher,
            sink,
            downloader: None,
            transcriber: None,
            html_char_limit: DEFAULT_HTML_CHAR_LIMIT,
        }
    }

    /// Build the full stack from configuration.
    ///
    /// The provider and the recipe manager are required. The video services are
    /// optional; without them every video item fails with a configuration reason.
    pub fn from_config(config: &IntakeConfig) -> Result<Self, IngestError> {
        let provider = ProviderFactory::get_default_provider(config)?;
        let fetcher = RequestFetcher::new(Some(Duration::from_secs(config.timeout)))?;
        let sink = RecipeManagerClient::new(&config.sink)?;

        let mut ingestor = Ingestor::new(provider, fetcher, Box::new(sink))
            .with_html_char_limit(config.html_char_limit);

        match (
            PlatformDownloader::new(&config.video),
            WhisperTranscriber::new(&config.transcription),
        ) {
            (Ok(downloader), Ok(transcriber)) => {
                ingestor = ingestor.with_video(Box::new(downloader), Box::new(transcriber));
            }
            (Err(e), _) | (_, Err(e)) => {
                debug!("Video services disabled: {}", e);
            }
        }
        Ok(ingestor)
    }

    pub fn with_video(
        mut self,
        downloader: Box<dyn VideoDownloader>,
        transcriber: Box<dyn Transcriber>,
    ) -> Self {
        self.downloader = Some(downloader);
        self.transcriber = Some(transcriber);
        self
    }

    pub fn with_html_char_limit(mut self, limit: usize) -> Self {
        self.html_char_limit = limit;
        self
    }

    /// Parse a raw email and process everything in it.
    ///
    /// Only a malformed message is an error; every per-item problem ends up
    /// in the report.
    pub async fn process_message(&self, raw: &[u8]) -> Result<IngestReport, IngestError> {
        let batch = content::extract(raw)?;
        info!(
            "Message holds {} image(s), {} document(s), {} url(s), {} video(s)",
            batch.images.len(),
            batch.documents.len(),
            batch.urls.len(),
            batch.videos.len()
        );
        Ok(self.process_batch(&batch).await)
    }

    pub async fn process_batch(&self, batch: &ContentBatch) -> IngestReport {
        let mut units = Vec::with_capacity(batch.len());
        if !batch.images.is_empty() {
            units.push(WorkUnit::Images(&batch.images));
        }
        units.extend(batch.documents.iter().map(WorkUnit::Document));
        units.extend(batch.urls.iter().map(|url| WorkUnit::Url(url)));
        units.extend(batch.videos.iter().map(WorkUnit::Video));

        self.run(units).await
    }

    /// Process a single link; video-platform links go through the video pipeline.
    pub async fn process_url(&self, url: &str) -> IngestReport {
        match detect_platform(url) {
            Some(platform) => {
                let link = VideoLink {
                    url: url.to_string(),
                    platform,
                };
                self.run(vec![WorkUnit::Video(&link)]).await
            }
            None => self.run(vec![WorkUnit::Url(url)]).await,
        }
    }

    /// Process images that together show one recipe
    pub async fn process_images(&self, images: &[Attachment]) -> IngestReport {
        if images.is_empty() {
            return IngestReport::default();
        }
        self.run(vec![WorkUnit::Images(images)]).await
    }

    pub async fn process_document(&self, document: &Attachment) -> IngestReport {
        self.run(vec![WorkUnit::Document(document)]).await
    }

    async fn run(&self, units: Vec<WorkUnit<'_>>) -> IngestReport {
        let settled = join_all(units.into_iter().map(|unit| self.run_unit(unit))).await;
        let report = IngestReport {
            outcomes: settled.into_iter().flatten().collect(),
        };
        info!("{} succeeded, {} failed", report.succeeded(), report.failed());
        report
    }

    async fn run_unit(&self, unit: WorkUnit<'_>) -> Vec<ItemOutcome> {
        let label = unit.label();
        debug!("Processing {}", label);

        let provider = self.provider.as_ref();
        let result = match unit {
            WorkUnit::Images(images) => pipelines::image::process(images, provider)
                .await
                .map(|e| vec![e]),
            WorkUnit::Document(document) => pipelines::document::process(document, provider).await,
            WorkUnit::Url(url) => {
                pipelines::url::process(url, &self.fetcher, provider, self.html_char_limit)
                    .await
                    .map(|e| vec![e])
            }
            WorkUnit::Video(link) => match self.video_services() {
                Ok(services) => pipelines::video::process(link, &services, provider)
                    .await
                    .map(|e| vec![e]),
                Err(e) => Err(e),
            },
        };
        self.settle(&label, result).await
    }

    fn video_services(&self) -> Result<VideoServices<'_>, IngestError> {
        let downloader = self
            .downloader
            .as_deref()
            .ok_or_else(|| IngestError::Download("video download service is not configured".into()))?;
        let transcriber = self.transcriber.as_deref().ok_or_else(|| {
            IngestError::Transcription("speech-to-text service is not configured".into())
        })?;
        Ok(VideoServices {
            downloader,
            transcriber,
            fetcher: &self.fetcher,
        })
    }

    async fn settle(
        &self,
        label: &str,
        result: Result<Vec<Extraction>, IngestError>,
    ) -> Vec<ItemOutcome> {
        let extractions = match result {
            Ok(extractions) => extractions,
            Err(e) => {
                warn!("{} failed: {}", label, e);
                return vec![ItemOutcome::Failed {
                    item: label.to_string(),
                    reason: e.to_string(),
                }];
            }
        };

        let count = extractions.len();
        let mut outcomes = Vec::with_capacity(count);
        for (i, extraction) in extractions.into_iter().enumerate() {
            let item = if count > 1 {
                format!("{label} (recipe {}/{count})", i + 1)
            } else {
                label.to_string()
            };
            outcomes.push(self.submit(item, extraction).await);
        }
        outcomes
    }

    async fn submit(&self, item: String, extraction: Extraction) -> ItemOutcome {
        match extraction {
            Extraction::Declined(reason) => {
                warn!("{} declined: {}", item, reason);
                ItemOutcome::Failed { item, reason }
            }
            Extraction::Recipe(recipe) => match self.sink.submit(&recipe).await {
                Ok(name) => {
                    info!("Imported \"{}\" from {} as {}", recipe.name, item, name);
                    ItemOutcome::Submitted { item, name }
                }
                Err(e) => {
                    warn!("Submitting {} failed: {}", item, e);
                    ItemOutcome::Failed {
                        item,
                        reason: e.to_string(),
                    }
                }
            },
        }
    }
}
