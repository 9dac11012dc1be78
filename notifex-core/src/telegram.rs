//! Telegram Bot API delivery client.

use std::time::Duration;

use serde_json::json;
use tracing::{error, info, warn};

use crate::error::{NotifyError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin client over the Bot API `sendMessage`/`sendPhoto` endpoints
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramClient {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }

    /// Send a Markdown text message, title and body separated by a blank line
    pub async fn send_message(&self, title: &str, body: &str) -> Result<()> {
        if !self.is_configured() {
            error!("telegram credentials missing: BOT_TOKEN or CHAT_ID not set");
            return Err(NotifyError::TelegramNotConfigured);
        }

        let payload = json!({
            "chat_id": self.chat_id,
            "text": format!("{title}\n\n{body}"),
            "parse_mode": "Markdown",
            "disable_web_page_preview": false,
        });

        self.call("sendMessage", &payload).await?;
        info!(title = %truncate(title, 50), "message delivered to telegram");
        Ok(())
    }

    /// Send the message as a photo caption; falls back to a plain text
    /// message when the photo upload is rejected (bad URL, oversized
    /// caption, ...).
    pub async fn send_photo(&self, title: &str, body: &str, photo_url: &str) -> Result<()> {
        if !self.is_configured() {
            error!("telegram credentials missing: BOT_TOKEN or CHAT_ID not set");
            return Err(NotifyError::TelegramNotConfigured);
        }

        let payload = json!({
            "chat_id": self.chat_id,
            "photo": photo_url,
            "caption": format!("{title}\n\n{body}"),
            "parse_mode": "Markdown",
        });

        match self.call("sendPhoto", &payload).await {
            Ok(()) => {
                info!(title = %truncate(title, 50), "photo message delivered to telegram");
                Ok(())
            }
            Err(error) => {
                warn!(%error, "sendPhoto failed, falling back to text message");
                self.send_message(title, body).await
            }
        }
    }

    async fn call(&self, method: &str, payload: &serde_json::Value) -> Result<()> {
        let url = format!(
            "https://api.telegram.org/bot{}/{method}",
            self.bot_token
        );

        let response = self
            .http
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(%status, method, %detail, "telegram API call failed");
            return Err(NotifyError::Telegram(format!("{method}: {status}: {detail}")));
        }

        Ok(())
    }
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
