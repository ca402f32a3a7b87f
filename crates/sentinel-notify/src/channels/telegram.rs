use async_trait::async_trait;
use serde_json::json;

use crate::channels::ChannelAdapter;
use crate::error::NotifyError;
use crate::rendering::RenderedMessage;

/// `POST https://api.telegram.org/bot<token>/sendMessage`, the same
/// `reqwest::Client` used by the RPC layer.
pub struct TelegramChannel {
    http: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramChannel {
    pub fn new(http: reqwest::Client, bot_token: String, chat_id: String) -> Self {
        TelegramChannel { http, bot_token, chat_id }
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    async fn send(&self, rendered: &RenderedMessage) -> Result<(), NotifyError> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let response = self
            .http
            .post(&url)
            .json(&json!({ "chat_id": self.chat_id, "text": rendered.text }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::WebhookStatus(response.status().as_u16()));
        }
        Ok(())
    }
}
