//! Instruction templates for the generative extraction service.
//!
//! The templates live in `prompts/*.txt` and are embedded at compile time, so
//! they can be edited without dealing with Rust string syntax. Each one ends
//! with the shared record format.

const RECORD_FORMAT: &str = include_str!("prompts/record_format.txt");
const URL_PROMPT: &str = include_str!("prompts/url.txt");
const IMAGE_PROMPT: &str = include_str!("prompts/image.txt");
const DOCUMENT_PROMPT: &str = include_str!("prompts/document.txt");
const VIDEO_PROMPT: &str = include_str!("prompts/video.txt");

const MERGE_IMAGES: &str = "The images are consecutive pages or photos of ONE recipe. \
     Combine them and return a single JSON object, never one object per image.";

fn with_format(template: &str) -> String {
    format!("{}\n{}", template.trim_end(), RECORD_FORMAT)
}

pub fn url_prompt(url: &str) -> String {
    format!("{}\nThe page was fetched from {url}.", with_format(URL_PROMPT))
}

/// Image prompt; asks for a merged record when more than one image is sent.
pub fn image_prompt(image_count: usize) -> String {
    let prompt = with_format(IMAGE_PROMPT);
    if image_count > 1 {
        format!("{prompt}\nYou are given {image_count} images. {MERGE_IMAGES}")
    } else {
        prompt
    }
}

pub fn document_prompt() -> String {
    with_format(DOCUMENT_PROMPT)
}

pub fn video_prompt() -> String {
    with_format(VIDEO_PROMPT)
}

/// User message for a video: the transcript, then the creator's caption if any.
pub fn video_message(transcript: &str, caption: Option<&str>) -> String {
    match caption.map(str::trim).filter(|c| !c.is_empty()) {
        Some(caption) => format!(
            "Transcript:\n{}\n\nCaption:\n{}",
            transcript.trim(),
            caption
        ),
        None => format!("Transcript:\n{}", transcript.trim()),
    }
}
