//! Per-destination delivery

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::errors::Result;
use crate::core::models::{
    Content, Destination, DispatchResult, DispatchStatus, Post, TranslationOutcome,
};

/// Outbound side of a feed
#[async_trait]
pub trait FeedPublisher: Send + Sync {
    /// Send a new text message to a feed
    async fn send_text(&self, feed_id: i64, text: &str) -> Result<()>;

    /// Copy an existing message to another feed, replacing its caption when given
    async fn copy_attachment(
        &self,
        source_feed_id: i64,
        message_id: i64,
        dest_feed_id: i64,
        caption: Option<&str>,
    ) -> Result<()>;

    /// Reply to a message in a chat
    async fn reply_text(&self, chat_id: i64, reply_to_message_id: i64, text: &str) -> Result<()>;
}

/// Delivers one post to every destination, each independently of the others
#[derive(Clone)]
pub struct FanoutDispatcher {
    publisher: Arc<dyn FeedPublisher>,
}

impl FanoutDispatcher {
    pub fn new(publisher: Arc<dyn FeedPublisher>) -> Self {
        Self { publisher }
    }

    /// Deliver to all destinations concurrently
    pub async fn dispatch(
        &self,
        post: &Post,
        content: &Content,
        outcomes: &[(Destination, TranslationOutcome)],
    ) -> Vec<DispatchResult> {
        join_all(
            outcomes
                .iter()
                .map(|(destination, outcome)| self.dispatch_one(post, content, destination, outcome)),
        )
        .await
    }

    /// Deliver to one destination; errors are recorded, never returned
    pub async fn dispatch_one(
        &self,
        post: &Post,
        content: &Content,
        destination: &Destination,
        outcome: &TranslationOutcome,
    ) -> DispatchResult {
        let status = if !destination.is_enabled() {
            DispatchStatus::Skipped("destination has no channel id".to_string())
        } else {
            match content {
                Content::Media { .. } => {
                    let caption = pick(outcome.effective_text(), post.caption.as_deref());
                    match self
                        .publisher
                        .copy_attachment(post.feed_id, post.message_id, destination.feed_id, caption)
                        .await
                    {
                        Ok(()) => DispatchStatus::Delivered,
                        Err(e) => DispatchStatus::Failed(e.to_string()),
                    }
                }
                Content::Text(original) => match pick(outcome.effective_text(), Some(original.as_str())) {
                    Some(text) => match self.publisher.send_text(destination.feed_id, text).await {
                        Ok(()) => DispatchStatus::Delivered,
                        Err(e) => DispatchStatus::Failed(e.to_string()),
                    },
                    None => DispatchStatus::Skipped("nothing to send".to_string()),
                },
                Content::Empty => DispatchStatus::Skipped("empty post".to_string()),
            }
        };

        let result = DispatchResult {
            feed_id: destination.feed_id,
            language: destination.language.clone(),
            status,
            translated: destination.is_enabled()
                && outcome.success
                && !outcome.original.trim().is_empty(),
        };
        log_result(post, &result);
        result
    }
}

/// First non-blank candidate
fn pick<'a>(translated: &'a str, original: Option<&'a str>) -> Option<&'a str> {
    Some(translated)
        .filter(|t| !t.trim().is_empty())
        .or_else(|| original.filter(|o| !o.trim().is_empty()))
}

fn log_result(post: &Post, result: &DispatchResult) {
    match &result.status {
        DispatchStatus::Delivered => info!(
            message_id = post.message_id,
            feed_id = result.feed_id,
            language = %result.language,
            translated = result.translated,
            "Relayed post"
        ),
        DispatchStatus::Skipped(reason) => debug!(
            message_id = post.message_id,
            feed_id = result.feed_id,
            language = %result.language,
            "Skipped destination: {}",
            reason
        ),
        DispatchStatus::Failed(error) => warn!(
            message_id = post.message_id,
            feed_id = result.feed_id,
            language = %result.language,
            "Delivery failed: {}",
            error
        ),
    }
}
