use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::youtube::{VideoQuery, VideoQueryError, VideoQueryResult, VideoSummary};

const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// YouTube Data API v3 client backed by `search.list`.
pub struct YouTubeClient {
    client: Client,
    api_key: String,
    api_base: String,
}

impl YouTubeClient {
    pub fn new(api_key: String) -> VideoQueryResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| VideoQueryError::ClientFailed(err.to_string()))?;
        Ok(Self {
            client,
            api_key,
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }
}

#[async_trait]
impl VideoQuery for YouTubeClient {
    async fn latest_video(&self, channel_id: &str) -> VideoQueryResult<Option<VideoSummary>> {
        let url = format!("{}/search", self.api_base);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("part", "snippet"),
                ("channelId", channel_id),
                ("maxResults", "1"),
                ("order", "date"),
                ("type", "video"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|err| VideoQueryError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(VideoQueryError::Status {
                status: status.as_u16(),
            });
        }
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|err| VideoQueryError::Malformed(err.to_string()))?;
        Ok(body.into_summary())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(rename = "channelTitle")]
    channel_title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl SearchResponse {
    fn into_summary(self) -> Option<VideoSummary> {
        let item = self.items.into_iter().next()?;
        // Non-video results carry no videoId; treat them as "nothing new".
        let id = item.id.video_id?;
        let thumbnail_url = item
            .snippet
            .thumbnails
            .high
            .or(item.snippet.thumbnails.medium)
            .or(item.snippet.thumbnails.default)
            .map(|thumb| thumb.url)
            .unwrap_or_default();
        Some(VideoSummary {
            id,
            title: item.snippet.title,
            channel_title: item.snippet.channel_title,
            thumbnail_url,
        })
    }
}
