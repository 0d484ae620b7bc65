//! Chat-completions client used as the translation capability

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::core::config::{ChatConfig, TranslationConfig};
use crate::core::errors::{RelayError, Result};

/// A single-shot text completion backend
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send one user message, with an optional system instruction, and return the answer
    async fn complete(&self, system: Option<&str>, user: &str) -> Result<String>;
}

/// OpenAI-compatible chat completions client
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: Option<f64>,
    timeout_ms: u64,
}

impl OpenAiClient {
    /// Create a new client
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        model: impl Into<String>,
        timeout_ms: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: None,
            timeout_ms,
        })
    }

    /// Client configured for translations
    pub fn for_translation(config: &TranslationConfig) -> Result<Self> {
        Ok(Self::new(
            &config.api_key,
            &config.api_base,
            &config.model,
            config.timeout_ms,
        )?
        .with_temperature(config.temperature))
    }

    /// Client configured for direct chat, sharing the translation credentials
    pub fn for_chat(translation: &TranslationConfig, chat: &ChatConfig) -> Result<Self> {
        Self::new(
            &translation.api_key,
            &translation.api_base,
            &chat.model,
            translation.timeout_ms,
        )
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// JSON body for one completion request
    pub fn request_body(&self, system: Option<&str>, user: &str) -> serde_json::Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": user }));

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });

        if let Some(temperature) = self.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        body
    }

    /// Send actual HTTP request
    async fn send_request(&self, body: &serde_json::Value) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| RelayError::from_transport(e, self.timeout_ms))?;

        let status = response.status();

        if status.is_success() {
            let json: serde_json::Value = response
                .json()
                .await
                .map_err(|e| RelayError::InvalidResponseError {
                    message: e.to_string(),
                })?;

            parse_completion(&json)
        } else {
            let status_code = status.as_u16();

            if status_code == 429 {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok());
                return Err(RelayError::RateLimitError { retry_after });
            }

            let error_text = response.text().await.unwrap_or_default();
            Err(RelayError::ApiError {
                status: status_code,
                message: error_text,
            })
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, system: Option<&str>, user: &str) -> Result<String> {
        let body = self.request_body(system, user);
        debug!(model = %self.model, chars = user.chars().count(), "Sending completion request");
        self.send_request(&body).await
    }
}

/// Extract the answer from a chat-completions response
pub fn parse_completion(json: &serde_json::Value) -> Result<String> {
    let content = json["choices"]
        .get(0)
        .and_then(|c| c["message"]["content"].as_str())
        .ok_or_else(|| RelayError::InvalidResponseError {
            message: "No message content in response".to_string(),
        })?;

    if let Some(tokens) = json["usage"]["total_tokens"].as_u64() {
        debug!(tokens, "Completion finished");
    }

    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;

    fn client() -> OpenAiClient {
        OpenAiClient::new("sk-test", "https://api.example.com/v1/", "gpt-4o-mini", 1000).unwrap()
    }

    #[test]
    fn test_request_body_with_instruction() {
        let client = client().with_temperature(0.0);
        let body = client.request_body(Some("Translate into English."), "سلام دنیا");

        assert_json_eq!(
            body,
            serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [
                    { "role": "system", "content": "Translate into English." },
                    { "role": "user", "content": "سلام دنیا" }
                ],
                "temperature": 0.0
            })
        );
    }

    #[test]
    fn test_request_body_without_instruction() {
        let body = client().request_body(None, "hello");

        assert_json_eq!(
            body,
            serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [{ "role": "user", "content": "hello" }]
            })
        );
    }

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        assert_eq!(client().api_base, "https://api.example.com/v1");
    }

    #[test]
    fn test_parse_completion() {
        let json = serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": "Hello world" } }],
            "usage": { "total_tokens": 21 }
        });
        assert_eq!(parse_completion(&json).unwrap(), "Hello world");

        let json = serde_json::json!({ "choices": [] });
        assert!(matches!(
            parse_completion(&json),
            Err(RelayError::InvalidResponseError { .. })
        ));
    }
}
