//! Minimal Telegram Bot API client: long-poll for messages, send replies.

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::TARGET_WEB_REQUEST;

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Result<Self> {
        Self::with_api_base(TELEGRAM_API, token)
    }

    pub fn with_api_base(api_base: &str, token: &str) -> Result<Self> {
        // Long polls hold the connection open, so the timeout sits above the poll window.
        let client = Client::builder().timeout(Duration::from_secs(90)).build()?;
        Ok(Self {
            client,
            base: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
        })
    }

    /// Waits up to `timeout_secs` for updates newer than `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let response = self
            .client
            .get(format!("{}/getUpdates", self.base))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", timeout_secs.to_string()),
            ])
            .send()
            .await?;
        let body: ApiResponse<Vec<Update>> = response.json().await?;
        if !body.ok {
            return Err(anyhow!(
                "getUpdates failed: {}",
                body.description.unwrap_or_default()
            ));
        }
        let updates = body.result.unwrap_or_default();
        if !updates.is_empty() {
            debug!(target: TARGET_WEB_REQUEST, "Received {} Telegram updates", updates.len());
        }
        Ok(updates)
    }

    pub async fn send_message(&self, chat_id: i64, text: &str, markdown: bool) -> Result<()> {
        let mut payload = json!({
            "chat_id": chat_id,
            "text": text,
        });
        if markdown {
            payload["parse_mode"] = json!("Markdown");
        }

        debug!(target: TARGET_WEB_REQUEST, "Sending Telegram message with payload: {}", payload);
        let response = self
            .client
            .post(format!("{}/sendMessage", self.base))
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            info!(target: TARGET_WEB_REQUEST, "Telegram message sent to chat {}", chat_id);
            Ok(())
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(target: TARGET_WEB_REQUEST, "Error sending Telegram message: {}", error_text);
            Err(anyhow!("sendMessage failed with status {}", status))
        }
    }
}
