//! Telegram Bot API client

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::config::TelegramConfig;
use crate::core::errors::{RelayError, Result};
use crate::relay::dispatcher::FeedPublisher;
use crate::telegram::types::{ApiResponse, Update, User};

/// Thin HTTPS client over the Bot API methods the relay uses
#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    /// `{api_base}/bot{token}`, never logged
    endpoint: String,
    timeout_ms: u64,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        if config.bot_token.is_empty() {
            return Err(RelayError::config("Telegram bot token is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}",
                config.api_base.trim_end_matches('/'),
                config.bot_token
            ),
            timeout_ms: config.request_timeout_ms,
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<T> {
        let mut request = self
            .client
            .post(format!("{}/{}", self.endpoint, method))
            .json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let timeout_ms = timeout
            .map(|t| t.as_millis() as u64)
            .unwrap_or(self.timeout_ms);
        let response = request
            .send()
            .await
            .map_err(|e| RelayError::from_transport(e.without_url(), timeout_ms))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RelayError::from_transport(e.without_url(), timeout_ms))?;

        match serde_json::from_str::<ApiResponse<T>>(&text) {
            Ok(envelope) => envelope.into_result(),
            Err(_) => Err(RelayError::ApiError {
                status: status.as_u16(),
                message: text,
            }),
        }
    }

    /// Identity of the bot, used to check the token
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &serde_json::json!({}), None).await
    }

    /// Long-poll for updates
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        let mut body = serde_json::json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message", "channel_post"],
        });
        if let Some(offset) = offset {
            body["offset"] = serde_json::json!(offset);
        }

        // The HTTP request must outlive the long-poll window
        let timeout = Duration::from_secs(timeout_secs) + Duration::from_millis(self.timeout_ms);
        self.call("getUpdates", &body, Some(timeout)).await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str, reply_to: Option<i64>) -> Result<()> {
        let body = send_message_body(chat_id, text, reply_to);
        let _: serde_json::Value = self.call("sendMessage", &body, None).await?;
        debug!(chat_id, "Sent message");
        Ok(())
    }

    pub async fn copy_message(
        &self,
        chat_id: i64,
        from_chat_id: i64,
        message_id: i64,
        caption: Option<&str>,
    ) -> Result<()> {
        let body = copy_message_body(chat_id, from_chat_id, message_id, caption);
        let _: serde_json::Value = self.call("copyMessage", &body, None).await?;
        debug!(chat_id, from_chat_id, message_id, "Copied message");
        Ok(())
    }

    /// Point Telegram at our webhook endpoint
    pub async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<()> {
        let mut body = serde_json::json!({
            "url": url,
            "allowed_updates": ["message", "channel_post"],
        });
        if let Some(secret) = secret_token {
            body["secret_token"] = serde_json::json!(secret);
        }

        let _: bool = self.call("setWebhook", &body, None).await?;
        info!("Webhook registered at {}", url);
        Ok(())
    }

    /// Remove any webhook so that long polling works
    pub async fn delete_webhook(&self) -> Result<()> {
        let _: bool = self.call("deleteWebhook", &serde_json::json!({}), None).await?;
        debug!("Webhook removed");
        Ok(())
    }
}

pub fn send_message_body(chat_id: i64, text: &str, reply_to: Option<i64>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "chat_id": chat_id,
        "text": text,
    });
    if let Some(message_id) = reply_to {
        body["reply_to_message_id"] = serde_json::json!(message_id);
    }
    body
}

/// `caption` is left out entirely when absent so Telegram keeps the original, if any
pub fn copy_message_body(
    chat_id: i64,
    from_chat_id: i64,
    message_id: i64,
    caption: Option<&str>,
) -> serde_json::Value {
    let mut body = serde_json::json!({
        "chat_id": chat_id,
        "from_chat_id": from_chat_id,
        "message_id": message_id,
    });
    if let Some(caption) = caption {
        body["caption"] = serde_json::json!(caption);
    }
    body
}

#[async_trait]
impl FeedPublisher for TelegramClient {
    async fn send_text(&self, feed_id: i64, text: &str) -> Result<()> {
        self.send_message(feed_id, text, None).await
    }

    async fn copy_attachment(
        &self,
        source_feed_id: i64,
        message_id: i64,
        dest_feed_id: i64,
        caption: Option<&str>,
    ) -> Result<()> {
        self.copy_message(dest_feed_id, source_feed_id, message_id, caption)
            .await
    }

    async fn reply_text(&self, chat_id: i64, reply_to_message_id: i64, text: &str) -> Result<()> {
        self.send_message(chat_id, text, Some(reply_to_message_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;

    #[test]
    fn test_client_requires_token() {
        let config = TelegramConfig::default();
        assert!(TelegramClient::new(&config).is_err());

        let config = TelegramConfig {
            bot_token: "123:abc".to_string(),
            api_base: "https://api.telegram.org/".to_string(),
            ..Default::default()
        };
        let client = TelegramClient::new(&config).unwrap();
        assert_eq!(client.endpoint, "https://api.telegram.org/bot123:abc");
    }

    #[test]
    fn test_copy_message_body() {
        assert_json_eq!(
            copy_message_body(-1002, -1001, 42, Some("Important news")),
            serde_json::json!({
                "chat_id": -1002,
                "from_chat_id": -1001,
                "message_id": 42,
                "caption": "Important news"
            })
        );

        assert_json_eq!(
            copy_message_body(-1002, -1001, 42, None),
            serde_json::json!({
                "chat_id": -1002,
                "from_chat_id": -1001,
                "message_id": 42
            })
        );
    }

    #[test]
    fn test_send_message_body() {
        assert_json_eq!(
            send_message_body(-1002, "Hello world", None),
            serde_json::json!({ "chat_id": -1002, "text": "Hello world" })
        );

        assert_json_eq!(
            send_message_body(55, "Hi", Some(9)),
            serde_json::json!({ "chat_id": 55, "text": "Hi", "reply_to_message_id": 9 })
        );
    }
}
