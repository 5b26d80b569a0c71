//! Clients for the services the pipeline talks to. Thin I/O only.

pub mod fetcher;
pub mod sink;
pub mod transcription;
pub mod video;

pub use fetcher::RequestFetcher;
pub use sink::{RecipeManagerClient, RecipeSink};
pub use transcription::{Transcriber, WhisperTranscriber};
pub use video::{PlatformDownloader, VideoDownloader, VideoInfo};
