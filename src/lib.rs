//! Turns emailed attachments, recipe links and short-video links into canonical
//! recipe records and hands them to a recipe manager.

pub mod classifier;
pub mod config;
pub mod content;
pub mod error;
pub mod extractors;
pub mod ingest;
pub mod model;
pub mod normalizer;
pub mod pipelines;
pub mod providers;
pub mod services;

#[cfg(test)]
mod testing;

pub use config::{load_config, IntakeConfig};
pub use error::IngestError;
pub use ingest::{IngestReport, Ingestor, ItemOutcome};
pub use model::{Attachment, ContentBatch, ContentItem, ExtractedRecipe, Extraction, Platform};

