use async_trait::async_trait;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use crate::channels::ChannelAdapter;
use crate::error::NotifyError;
use crate::rendering::RenderedMessage;

type HmacSha256 = Hmac<Sha256>;

/// Lark/Feishu custom bot webhook. When `secret` is set, signs the request
/// with the platform's `timestamp + "\n" + secret` HMAC-SHA256 scheme and
/// sends `timestamp`/`sign` alongside the message body.
pub struct LarkChannel {
    http: reqwest::Client,
    webhook_url: String,
    secret: Option<String>,
}

impl LarkChannel {
    pub fn new(http: reqwest::Client, webhook_url: String, secret: Option<String>) -> Self {
        LarkChannel { http, webhook_url, secret }
    }

    fn sign(&self, timestamp: i64) -> Result<Option<String>, NotifyError> {
        let Some(secret) = &self.secret else { return Ok(None) };
        let key = format!("{timestamp}\n{secret}");
        let mut mac = HmacSha256::new_from_slice(key.as_bytes())
            .map_err(|e| NotifyError::Render(e.to_string()))?;
        mac.update(b"");
        let digest = mac.finalize().into_bytes();
        Ok(Some(base64::engine::general_purpose::STANDARD.encode(digest)))
    }
}

#[async_trait]
impl ChannelAdapter for LarkChannel {
    async fn send(&self, rendered: &RenderedMessage) -> Result<(), NotifyError> {
        let timestamp = chrono::Utc::now().timestamp();
        let mut body = json!({
            "msg_type": "text",
            "content": { "text": rendered.text },
        });
        if let Some(sign) = self.sign(timestamp)? {
            body["timestamp"] = json!(timestamp.to_string());
            body["sign"] = json!(sign);
        }

        let response = self.http.post(&self.webhook_url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::WebhookStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_when_no_secret() {
        let channel = LarkChannel::new(reqwest::Client::new(), "https://example.invalid".to_string(), None);
        assert!(channel.sign(1_700_000_000).unwrap().is_none());
    }

    #[test]
    fn signs_when_secret_present() {
        let channel = LarkChannel::new(
            reqwest::Client::new(),
            "https://example.invalid".to_string(),
            Some("shh".to_string()),
        );
        let sig = channel.sign(1_700_000_000).unwrap();
        assert!(sig.is_some());
    }
}
