//! Telegram Bot API client
//!
//! Thin long-polling client over the Bot HTTP API: `getUpdates` for incoming
//! operator commands, `sendMessage` for notifications. Notification failures
//! are logged and swallowed so a flaky chat link never takes down a watch
//! session.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::error;

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Long-poll window for getUpdates, in seconds
pub const LONG_POLL_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Telegram API error: {0}")]
    Api(String),
}

/// An incoming update from getUpdates
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<T>,
}

/// Client for one bot token
pub struct TelegramClient {
    client: Client,
    base: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        // The HTTP timeout has to sit above the long-poll window
        let client = Client::builder()
            .timeout(Duration::from_secs(LONG_POLL_SECS + 15))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base: format!("{}/bot{}", TELEGRAM_API, token),
        }
    }

    /// Long-poll for updates past `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        let url = format!("{}/getUpdates", self.base);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("timeout", LONG_POLL_SECS.to_string()),
                ("offset", offset.to_string()),
            ])
            .send()
            .await?;

        let body: ApiResponse<Vec<Update>> = response.json().await?;
        if !body.ok {
            return Err(TelegramError::Api(
                body.description.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        Ok(body.result.unwrap_or_default())
    }

    /// Send an HTML-formatted message.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let url = format!("{}/sendMessage", self.base);
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
            }))
            .send()
            .await?;

        let body: ApiResponse<serde_json::Value> = response.json().await?;
        if !body.ok {
            return Err(TelegramError::Api(
                body.description.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        Ok(())
    }

    /// Fire-and-forget notification; failures are logged, never propagated.
    pub async fn notify(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.send_message(chat_id, text).await {
            error!("Failed to send chat message: {}", e);
        }
    }
}

/// Escape text for Telegram's HTML parse mode.
pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_parse() {
        let body = r#"{
            "ok": true,
            "result": [{
                "update_id": 871100231,
                "message": {
                    "message_id": 5,
                    "chat": {"id": 123456789, "type": "private"},
                    "text": "/watch"
                }
            }]
        }"#;

        let parsed: ApiResponse<Vec<Update>> = serde_json::from_str(body).unwrap();
        assert!(parsed.ok);
        let updates = parsed.result.unwrap();
        assert_eq!(updates[0].update_id, 871100231);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, 123456789);
        assert_eq!(message.text.as_deref(), Some("/watch"));
    }

    #[test]
    fn test_error_response_parse() {
        let body = r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#;
        let parsed: ApiResponse<Vec<Update>> = serde_json::from_str(body).unwrap();
        assert!(!parsed.ok);
        assert_eq!(parsed.description.as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("a < b & c > d"), "a &lt; b &amp; c &gt; d");
    }
}
