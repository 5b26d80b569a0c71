use crate::config::VideoServiceConfig;
use crate::error::IngestError;
use crate::model::{Platform, VideoLink};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

/// What the download service tells us about a video, normalized across platforms
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoInfo {
    pub media_url: String,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub author: Option<String>,
    pub thumbnail: Option<String>,
}

#[async_trait]
pub trait VideoDownloader: Send + Sync {
    /// Resolve a platform link to a direct media URL plus whatever metadata is available
    async fn fetch_info(&self, link: &VideoLink) -> Result<VideoInfo, IngestError>;
}

#[derive(Debug, Deserialize)]
struct TikTokResponse {
    data: TikTokData,
}

#[derive(Debug, Deserialize)]
struct TikTokData {
    play: String,
    title: Option<String>,
    cover: Option<String>,
    author: Option<TikTokAuthor>,
}

#[derive(Debug, Deserialize)]
struct TikTokAuthor {
    unique_id: Option<String>,
    nickname: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InstagramResponse {
    #[serde(default)]
    media: Vec<InstagramMedia>,
    caption: Option<String>,
    title: Option<String>,
    owner: Option<InstagramOwner>,
}

#[derive(Debug, Deserialize)]
struct InstagramMedia {
    url: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InstagramOwner {
    username: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<TikTokResponse> for VideoInfo {
    fn from(response: TikTokResponse) -> Self {
        let data = response.data;
        let author = data
            .author
            .and_then(|a| non_empty(a.nickname).or_else(|| non_empty(a.unique_id)));
        VideoInfo {
            media_url: data.play,
            title: None,
            // TikTok's "title" is the creator's description
            caption: non_empty(data.title),
            author,
            thumbnail: non_empty(data.cover),
        }
    }
}

impl TryFrom<InstagramResponse> for VideoInfo {
    type Error = IngestError;

    fn try_from(response: InstagramResponse) -> Result<Self, Self::Error> {
        let media = response
            .media
            .iter()
            .find(|m| m.kind.as_deref() == Some("video"))
            .or_else(|| response.media.first())
            .ok_or_else(|| IngestError::Download("instagram response has no media".into()))?;

        Ok(VideoInfo {
            media_url: media.url.clone(),
            title: non_empty(response.title),
            caption: non_empty(response.caption),
            author: response.owner.and_then(|o| non_empty(o.username)),
            thumbnail: non_empty(media.thumbnail.clone()),
        })
    }
}

/// HTTP client for the platform download service
pub struct PlatformDownloader {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl PlatformDownloader {
    pub fn new(config: &VideoServiceConfig) -> Result<Self, IngestError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| IngestError::Download("video.base_url is not configured".into()))?;
        Ok(Self::with_base_url(base_url, config.api_key.clone()))
    }

    #[doc(hidden)]
    pub fn with_base_url(base_url: String, api_key: Option<String>) -> Self {
        PlatformDownloader {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl VideoDownloader for PlatformDownloader {
    async fn fetch_info(&self, link: &VideoLink) -> Result<VideoInfo, IngestError> {
        let endpoint = format!("{}/{}", self.base_url, link.platform);
        debug!("Resolving {} via {}", link.url, endpoint);

        let mut request = self.client.get(&endpoint).query(&[("url", &link.url)]);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IngestError::Download(e.to_string()))?;
        if !response.status().is_success() {
            return Err(IngestError::Download(format!(
                "{} download service returned {}",
                link.platform,
                response.status()
            )));
        }

        let info = match link.platform {
            Platform::TikTok => response
                .json::<TikTokResponse>()
                .await
                .map(VideoInfo::from)
                .map_err(|e| IngestError::Download(e.to_string()))?,
            Platform::Instagram => response
                .json::<InstagramResponse>()
                .await
                .map_err(|e| IngestError::Download(e.to_string()))
                .and_then(VideoInfo::try_from)?,
        };

        if info.media_url.trim().is_empty() {
            return Err(IngestError::Download(format!(
                "{} download service returned no media URL",
                link.platform
            )));
        }
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_tiktok_shape_normalized() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/tiktok")
            .match_query(Matcher::UrlEncoded(
                "url".into(),
                "https://www.tiktok.com/@chef/video/1".into(),
            ))
            .match_header("x-api-key", "k")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data": {"play": "https://cdn/v.mp4", "title": "Best ramen 200g noodles",
                   "cover": "https://cdn/c.jpg", "author": {"unique_id": "chef", "nickname": "Chef K"}}}"#,
            )
            .create();

        let downloader = PlatformDownloader::with_base_url(server.url(), Some("k".into()));
        let info = downloader
            .fetch_info(&VideoLink {
                url: "https://www.tiktok.com/@chef/video/1".into(),
                platform: Platform::TikTok,
            })
            .await
            .unwrap();

        assert_eq!(info.media_url, "https://cdn/v.mp4");
        assert_eq!(info.caption.as_deref(), Some("Best ramen 200g noodles"));
        assert_eq!(info.author.as_deref(), Some("Chef K"));
        assert_eq!(info.thumbnail.as_deref(), Some("https://cdn/c.jpg"));
        mock.assert();
    }

    #[tokio::test]
    async fn test_instagram_shape_normalized() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/instagram")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"media": [{"type": "image", "url": "https://cdn/i.jpg"},
                              {"type": "video", "url": "https://cdn/r.mp4", "thumbnail": "https://cdn/t.jpg"}],
                    "caption": "Lemon pasta", "owner": {"username": "pastalover"}}"#,
            )
            .create();

        let downloader = PlatformDownloader::with_base_url(server.url(), None);
        let info = downloader
            .fetch_info(&VideoLink {
                url: "https://www.instagram.com/reel/abc/".into(),
                platform: Platform::Instagram,
            })
            .await
            .unwrap();

        assert_eq!(info.media_url, "https://cdn/r.mp4");
        assert_eq!(info.caption.as_deref(), Some("Lemon pasta"));
        assert_eq!(info.author.as_deref(), Some("pastalover"));
        assert_eq!(info.thumbnail.as_deref(), Some("https://cdn/t.jpg"));
    }

    #[tokio::test]
    async fn test_instagram_without_media_fails() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/instagram")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"media": [], "caption": "x"}"#)
            .create();

        let downloader = PlatformDownloader::with_base_url(server.url(), None);
        let err = downloader
            .fetch_info(&VideoLink {
                url: "https://www.instagram.com/reel/abc/".into(),
                platform: Platform::Instagram,
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no media"));
    }

    #[test]
    fn test_new_requires_base_url() {
        assert!(PlatformDownloader::new(&VideoServiceConfig::default()).is_err());
    }
}
