//! Direct chat with the bot in private messages

use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::client::LanguageModel;
use crate::core::config::ChatConfig;
use crate::core::errors::Result;
use crate::relay::dispatcher::FeedPublisher;

/// Answers private messages: `/start` gets the greeting, other text goes to the model
#[derive(Clone)]
pub struct ChatResponder {
    model: Arc<dyn LanguageModel>,
    publisher: Arc<dyn FeedPublisher>,
    greeting: String,
    error_reply: String,
}

impl ChatResponder {
    pub fn new(
        config: &ChatConfig,
        model: Arc<dyn LanguageModel>,
        publisher: Arc<dyn FeedPublisher>,
    ) -> Self {
        Self {
            model,
            publisher,
            greeting: config.greeting.clone(),
            error_reply: config.error_reply.clone(),
        }
    }

    /// Handle one private text message
    ///
    /// `command` is the bot command at the start of the text, if any. Commands
    /// other than `/start` are ignored.
    pub async fn respond(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        command: Option<&str>,
    ) -> Result<()> {
        match command {
            Some("start") => {
                return self
                    .publisher
                    .reply_text(chat_id, message_id, &self.greeting)
                    .await;
            }
            Some(other) => {
                debug!(chat_id, "Ignoring command /{}", other);
                return Ok(());
            }
            None => {}
        }

        if text.trim().is_empty() {
            return Ok(());
        }

        let answer = match self.model.complete(None, text).await {
            Ok(answer) if !answer.trim().is_empty() => answer,
            Ok(_) => {
                warn!(chat_id, "Model returned an empty answer");
                self.error_reply.clone()
            }
            Err(e) => {
                warn!(chat_id, "Chat completion failed: {}", e);
                self.error_reply.clone()
            }
        };

        self.publisher.reply_text(chat_id, message_id, &answer).await
    }
}
