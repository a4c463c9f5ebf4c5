use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;

use crate::notify::{NotificationChannel, VideoMessage};

const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Delivers notifications as Discord embeds through the REST API.
pub struct DiscordChannel {
    client: Client,
    token: String,
    api_base: String,
}

impl DiscordChannel {
    pub fn new(bot_token: String) -> Result<Self, anyhow::Error> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            token: bot_token,
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }
}

#[async_trait]
impl NotificationChannel for DiscordChannel {
    fn channel_id(&self) -> &str {
        "discord"
    }

    async fn resolve(&self, destination_id: &str) -> Result<bool, anyhow::Error> {
        let url = format!("{}/channels/{}", self.api_base, destination_id);
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.authorization())
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => Ok(false),
            status => Err(anyhow::anyhow!("channel lookup returned HTTP {status}")),
        }
    }

    async fn send(
        &self,
        destination_id: &str,
        message: &VideoMessage,
    ) -> Result<(), anyhow::Error> {
        let url = format!("{}/channels/{}/messages", self.api_base, destination_id);
        let payload = json!({
            "embeds": [embed_payload(message)],
        });
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.authorization())
            .json(&payload)
            .send()
            .await?;
        response.error_for_status()?;
        Ok(())
    }
}

fn embed_payload(message: &VideoMessage) -> serde_json::Value {
    json!({
        "title": message.title,
        "url": message.url,
        "color": message.color,
        "author": { "name": message.author },
        "image": { "url": message.thumbnail_url },
        "footer": { "text": message.footer },
    })
}
