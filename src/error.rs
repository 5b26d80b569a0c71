use thiserror::Error;

/// Errors that can occur while turning inbound content into recipes
#[derive(Error, Debug)]
pub enum IngestError {
    /// The inbound message could not be parsed as MIME; aborts the whole message
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// Failed to fetch a page or media file
    #[error("Failed to fetch URL: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The generative extraction service failed or returned an unusable envelope
    #[error("Extraction service error: {0}")]
    Provider(String),

    /// The generative extraction service answered without any usable JSON
    #[error("Invalid extraction response: {0}")]
    InvalidResponse(String),

    /// The video-platform download service failed
    #[error("Video download failed: {0}")]
    Download(String),

    /// The speech-to-text service failed
    #[error("Transcription failed: {0}")]
    Transcription(String),

    /// The recipe manager rejected or failed to store a record
    #[error("Recipe manager error: {0}")]
    Sink(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
