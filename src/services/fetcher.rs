use crate::error::IngestError;
use log::debug;
use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Plain HTTP GET for recipe pages and media files
pub struct RequestFetcher {
    client: Client,
}

impl RequestFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, IngestError> {
        let timeout = timeout.unwrap_or(Duration::from_secs(30));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch a page as text. Non-2xx responses are errors.
    pub async fn fetch(&self, url: &str) -> Result<String, IngestError> {
        debug!("Fetching page {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// Fetch raw bytes, e.g. a video file for transcription.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, IngestError> {
        debug!("Downloading media {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_fetch_page() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/recipe")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html>ok</html>")
            .create();

        let fetcher = RequestFetcher::new(None).unwrap();
        let html = fetcher.fetch(&format!("{}/recipe", server.url())).await.unwrap();
        assert_eq!(html, "<html>ok</html>");
        mock.assert();
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let mut server = Server::new_async().await;
        let _m = server.mock("GET", "/missing").with_status(404).create();

        let fetcher = RequestFetcher::new(Some(Duration::from_secs(5))).unwrap();
        let err = fetcher
            .fetch(&format!("{}/missing", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_fetch_bytes() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/clip.mp4")
            .with_status(200)
            .with_body(vec![0u8, 1, 2, 3])
            .create();

        let fetcher = RequestFetcher::new(None).unwrap();
        let bytes = fetcher
            .fetch_bytes(&format!("{}/clip.mp4", server.url()))
            .await
            .unwrap();
        assert_eq!(bytes, vec![0, 1, 2, 3]);
    }
}
