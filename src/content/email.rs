use super::links::link_items;
use crate::error::IngestError;
use crate::model::{Attachment, ContentBatch, ContentItem};
use log::debug;
use mailparse::{parse_mail, DispositionType, ParsedMail};

const IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/heic",
    "image/heif",
];

const DOCUMENT_TYPES: &[&str] = &["application/pdf", "text/plain", "text/markdown"];

/// At least one of these must head a message for it to count as email
const MESSAGE_HEADERS: &[&str] = &[
    "from",
    "to",
    "cc",
    "subject",
    "date",
    "message-id",
    "mime-version",
    "content-type",
    "received",
    "return-path",
    "reply-to",
    "sender",
    "delivered-to",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttachmentKind {
    Image,
    Document,
}

/// Attachments and body text collected while walking the MIME tree
#[derive(Default)]
struct Collected {
    attachments: Vec<(AttachmentKind, Attachment)>,
    bodies: Vec<String>,
}

/// Split a raw email into classified content items.
///
/// Allow-listed attachments become image or document items, everything else is
/// dropped. Text and HTML bodies are concatenated and scanned for links.
/// A message that can't be parsed as MIME fails as a whole.
pub fn extract(raw: &[u8]) -> Result<ContentBatch, IngestError> {
    let mail = parse_mail(raw).map_err(malformed)?;
    check_message(&mail)?;

    let mut collected = Collected::default();
    walk(&mail, &mut collected)?;

    let mut batch = ContentBatch::default();
    for (kind, attachment) in collected.attachments {
        batch.push(match kind {
            AttachmentKind::Image => ContentItem::Image(attachment),
            AttachmentKind::Document => ContentItem::Document(attachment),
        });
    }

    let body = collected.bodies.join("\n");
    for item in link_items(&body) {
        batch.push(item);
    }

    debug!(
        "Message split into {} images, {} documents, {} urls, {} videos",
        batch.images.len(),
        batch.documents.len(),
        batch.urls.len(),
        batch.videos.len()
    );
    Ok(batch)
}

/// Reject input that only parsed because the MIME parser is lenient
fn check_message(mail: &ParsedMail) -> Result<(), IngestError> {
    let known = mail
        .headers
        .iter()
        .any(|h| MESSAGE_HEADERS.contains(&h.get_key_ref().to_lowercase().as_str()));
    if !known {
        return Err(IngestError::MalformedMessage(
            "no recognised message headers".to_string(),
        ));
    }
    check_multipart(mail)
}

fn check_multipart(part: &ParsedMail) -> Result<(), IngestError> {
    let mime_type = part.ctype.mimetype.to_lowercase();
    if !mime_type.starts_with("multipart/") {
        return Ok(());
    }

    let Some(boundary) = part.ctype.params.get("boundary") else {
        return Err(IngestError::MalformedMessage(format!(
            "{mime_type} part without a boundary"
        )));
    };
    if part.subparts.is_empty() {
        return Err(IngestError::MalformedMessage(format!(
            "{mime_type} part with no body parts"
        )));
    }
    let terminator = format!("--{boundary}--");
    if !contains(part.raw_bytes, terminator.as_bytes()) {
        return Err(IngestError::MalformedMessage(format!(
            "{mime_type} body is missing its closing {terminator}"
        )));
    }

    for sub in &part.subparts {
        check_multipart(sub)?;
    }
    Ok(())
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn walk(part: &ParsedMail, collected: &mut Collected) -> Result<(), IngestError> {
    if !part.subparts.is_empty() {
        for sub in &part.subparts {
            walk(sub, collected)?;
        }
        return Ok(());
    }

    let mime_type = part.ctype.mimetype.to_lowercase();
    let disposition = part.get_content_disposition();
    let is_attachment = disposition.disposition == DispositionType::Attachment;

    // Forwarded messages carry a whole email as a single part
    if mime_type == "message/rfc822" {
        let inner = part.get_body_raw().map_err(malformed)?;
        let nested = parse_mail(&inner).map_err(malformed)?;
        check_message(&nested)?;
        return walk(&nested, collected);
    }

    if !is_attachment && (mime_type == "text/plain" || mime_type == "text/html") {
        collected.bodies.push(part.get_body().map_err(malformed)?);
        return Ok(());
    }

    let kind = if IMAGE_TYPES.contains(&mime_type.as_str()) {
        AttachmentKind::Image
    } else if DOCUMENT_TYPES.contains(&mime_type.as_str()) {
        AttachmentKind::Document
    } else {
        debug!("Dropping attachment with unsupported type {}", mime_type);
        return Ok(());
    };

    let index = collected.attachments.len() + 1;
    let filename = disposition
        .params
        .get("filename")
        .or_else(|| part.ctype.params.get("name"))
        .filter(|name| !name.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| default_filename(kind, index, &mime_type));

    let data = part.get_body_raw().map_err(malformed)?;
    debug!("Attachment {} ({}, {} bytes)", filename, mime_type, data.len());

    collected
        .attachments
        .push((kind, Attachment::new(data, mime_type, filename)));
    Ok(())
}

fn malformed(e: mailparse::MailParseError) -> IngestError {
    IngestError::MalformedMessage(e.to_string())
}

fn default_filename(kind: AttachmentKind, index: usize, mime_type: &str) -> String {
    let stem = match kind {
        AttachmentKind::Image => "image",
        AttachmentKind::Document => "document",
    };
    let extension = match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "application/pdf" => "pdf",
        "text/plain" => "txt",
        "text/markdown" => "md",
        other => other.rsplit('/').next().unwrap_or("bin"),
    };
    format!("{stem}-{index}.{extension}")
}
