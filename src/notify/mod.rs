pub mod discord;

use std::sync::Arc;

use async_trait::async_trait;

use crate::youtube::VideoSummary;

/// Accent color for notification messages (YouTube red).
pub const ACCENT_COLOR: u32 = 0xFF0000;
/// Static footer label on every notification.
pub const FOOTER_TEXT: &str = "YouTube notifier";

/// A notification ready for delivery, transport-agnostic. The Discord adapter
/// renders this as an embed; a test fake just records it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMessage {
    pub title: String,
    pub url: String,
    pub author: String,
    pub thumbnail_url: String,
    pub color: u32,
    pub footer: String,
}

impl VideoMessage {
    pub fn from_summary(video: &VideoSummary) -> Self {
        Self {
            title: video.title.clone(),
            url: video.watch_url(),
            author: format!("{} uploaded a new video", video.channel_title),
            thumbnail_url: video.thumbnail_url.clone(),
            color: ACCENT_COLOR,
            footer: FOOTER_TEXT.to_string(),
        }
    }
}

/// Capability for delivering notifications to a destination channel.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Transport identifier, e.g. "discord".
    fn channel_id(&self) -> &str;
    /// Whether the destination still exists and is reachable.
    async fn resolve(&self, destination_id: &str) -> Result<bool, anyhow::Error>;
    async fn send(
        &self,
        destination_id: &str,
        message: &VideoMessage,
    ) -> Result<(), anyhow::Error>;
}

/// Formats detected new-video events and dispatches them. All failures are
/// handled here; the scan loop never sees a delivery error.
#[derive(Clone)]
pub struct Notifier {
    channel: Arc<dyn NotificationChannel>,
}

impl Notifier {
    pub fn new(channel: Arc<dyn NotificationChannel>) -> Self {
        Self { channel }
    }

    /// Returns `true` when the message was handed to the transport.
    pub async fn notify(&self, destination_id: &str, video: &VideoSummary) -> bool {
        match self.channel.resolve(destination_id).await {
            Ok(true) => {}
            Ok(false) => {
                // Destination deleted or inaccessible; drop quietly.
                tracing::debug!(
                    event = "notification_skipped",
                    transport = %self.channel.channel_id(),
                    destination_id = %destination_id,
                    "destination unresolvable"
                );
                return false;
            }
            Err(err) => {
                tracing::warn!(
                    event = "notification_resolve_failed",
                    transport = %self.channel.channel_id(),
                    destination_id = %destination_id,
                    error = %err,
                    "destination lookup failed"
                );
                return false;
            }
        }
        let message = VideoMessage::from_summary(video);
        match self.channel.send(destination_id, &message).await {
            Ok(()) => {
                tracing::info!(
                    event = "notification_sent",
                    transport = %self.channel.channel_id(),
                    destination_id = %destination_id,
                    video_id = %video.id,
                    "notification delivered"
                );
                true
            }
            Err(err) => {
                tracing::warn!(
                    event = "notification_failed",
                    transport = %self.channel.channel_id(),
                    destination_id = %destination_id,
                    video_id = %video.id,
                    error = %err,
                    "notification delivery failed"
                );
                false
            }
        }
    }
}
