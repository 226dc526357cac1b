use crate::enrich::truncate_chars;
use crate::types::{RelayError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Hard channel limit for a plain text message.
pub const TEXT_LIMIT: usize = 4096;
/// Hard channel limit for a photo caption.
pub const CAPTION_LIMIT: usize = 1024;

/// Clamp a caption to the channel limit for the chosen delivery mode. Applied
/// at send time; caption assembly itself never clamps.
pub fn clamp_caption(caption: &str, with_photo: bool) -> String {
    let limit = if with_photo { CAPTION_LIMIT } else { TEXT_LIMIT };
    truncate_chars(caption, limit)
}

/// Delivery capability for a chat destination.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()>;
    async fn send_photo(&self, chat_id: &str, photo_url: &str, caption: &str) -> Result<()>;
}

/// Notifier speaking the Telegram bot HTTP API.
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl TelegramNotifier {
    /// A missing token is a configuration error: the batch cannot start
    /// without a delivery credential.
    pub fn new(token: String) -> Result<Self> {
        Self::with_api_base(token, "https://api.telegram.org".to_string())
    }

    pub fn with_api_base(token: String, api_base: String) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(RelayError::Config(
                "delivery bot token is not set".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(RelayError::Http)?;

        Ok(Self {
            client,
            api_base,
            token,
        })
    }

    async fn call(&self, method: &str, body: serde_json::Value) -> Result<()> {
        let url = format!("{}/bot{}/{}", self.api_base, self.token, method);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RelayError::Delivery(format!("HTTP {}: {}", status, detail)));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RelayError::Delivery(e.to_string()))?;

        if payload.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            return Err(RelayError::Delivery(format!(
                "API rejected {}: {}",
                method, payload
            )));
        }

        debug!("Delivered via {}", method);
        Ok(())
    }
}

#[async_trait]
impl Notify for TelegramNotifier {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        self.call(
            "sendMessage",
            json!({
                "chat_id": chat_id,
                "text": text,
            }),
        )
        .await
    }

    async fn send_photo(&self, chat_id: &str, photo_url: &str, caption: &str) -> Result<()> {
        self.call(
            "sendPhoto",
            json!({
                "chat_id": chat_id,
                "photo": photo_url,
                "caption": caption,
            }),
        )
        .await
    }
}
