//! Routes raw updates to the relay or the chat responder

use tracing::{debug, warn};

use crate::chat::ChatResponder;
use crate::core::models::RelayReport;
use crate::relay::pipeline::RelayPipeline;
use crate::telegram::types::{Message, Update};

/// What happened to an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Relay(RelayReport),
    Chat,
    Ignored,
}

#[derive(Clone)]
pub struct UpdateRouter {
    pipeline: RelayPipeline,
    chat: Option<ChatResponder>,
    source_feed_id: i64,
}

impl UpdateRouter {
    pub fn new(pipeline: RelayPipeline, chat: Option<ChatResponder>, source_feed_id: i64) -> Self {
        Self {
            pipeline,
            chat,
            source_feed_id,
        }
    }

    pub async fn handle(&self, update: &Update) -> Routed {
        if let Some(post) = &update.channel_post {
            return Routed::Relay(self.pipeline.process(&post.to_post()).await);
        }

        if let Some(message) = &update.message {
            // A group can be the source feed too
            if message.chat_id() == self.source_feed_id {
                return Routed::Relay(self.pipeline.process(&message.to_post()).await);
            }

            if message.is_private() {
                if let Some(chat) = &self.chat {
                    return self.answer(chat, message).await;
                }
            }
        }

        debug!(update_id = update.update_id, "Ignoring update");
        Routed::Ignored
    }

    async fn answer(&self, chat: &ChatResponder, message: &Message) -> Routed {
        let Some(text) = message.text.as_deref() else {
            return Routed::Ignored;
        };

        if let Err(e) = chat
            .respond(message.chat_id(), message.message_id, text, message.command())
            .await
        {
            warn!(chat_id = message.chat_id(), "Failed to reply: {}", e);
        }
        Routed::Chat
    }
}
