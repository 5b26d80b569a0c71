use log::error;
use recipe_intake::{Attachment, IngestReport, Ingestor, IntakeConfig};
use std::env;
use std::path::Path;
use std::process::ExitCode;
use tokio::io::AsyncReadExt;

const USAGE: &str = "Usage:
  recipe-intake email <file|->
  recipe-intake url <url>
  recipe-intake image <file>...
  recipe-intake document <file>";

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args).await {
        Ok(report) => {
            println!("{report}");
            if report.failed() > 0 {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

async fn run(args: &[String]) -> Result<IngestReport, Box<dyn std::error::Error>> {
    let (command, rest) = args.split_first().ok_or(USAGE)?;
    let config = IntakeConfig::load()?;
    let ingestor = Ingestor::from_config(&config)?;

    let report = match (command.as_str(), rest) {
        ("email", [source]) => {
            let raw = read_source(source).await?;
            ingestor.process_message(&raw).await?
        }
        ("url", [url]) => ingestor.process_url(url).await,
        ("image", files) if !files.is_empty() => {
            let mut images = Vec::with_capacity(files.len());
            for file in files {
                images.push(read_attachment(file).await?);
            }
            ingestor.process_images(&images).await
        }
        ("document", [file]) => {
            let document = read_attachment(file).await?;
            ingestor.process_document(&document).await
        }
        _ => return Err(USAGE.into()),
    };
    Ok(report)
}

/// Read a file, or standard input when the path is `-`
async fn read_source(source: &str) -> std::io::Result<Vec<u8>> {
    if source == "-" {
        let mut raw = Vec::new();
        tokio::io::stdin().read_to_end(&mut raw).await?;
        Ok(raw)
    } else {
        tokio::fs::read(source).await
    }
}

async fn read_attachment(file: &str) -> std::io::Result<Attachment> {
    let data = tokio::fs::read(file).await?;
    let filename = Path::new(file)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string());
    Ok(Attachment::new(data, mime_type_for(&filename), filename))
}

fn mime_type_for(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "pdf" => "application/pdf",
        "md" | "markdown" => "text/markdown",
        _ => "text/plain",
    }
}
