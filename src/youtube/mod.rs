pub mod client;

use async_trait::async_trait;

/// The most recent upload observed on a watched channel. Transient, rebuilt
/// on every scan; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    pub channel_title: String,
    pub thumbnail_url: String,
}

impl VideoSummary {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VideoQueryError {
    #[error("Client construction failed: {0}")]
    ClientFailed(String),
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("API returned HTTP {status}")]
    Status { status: u16 },
    #[error("Malformed response: {0}")]
    Malformed(String),
}

pub type VideoQueryResult<T> = Result<T, VideoQueryError>;

/// Capability for asking the video platform about a channel's latest upload.
#[async_trait]
pub trait VideoQuery: Send + Sync {
    /// Most recent video by publish date, or `None` when the channel has no
    /// uploads.
    async fn latest_video(&self, channel_id: &str) -> VideoQueryResult<Option<VideoSummary>>;
}
